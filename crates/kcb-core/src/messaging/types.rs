use crate::domain::{ChatId, UserId};

/// One size variant of an inbound photo, as offered by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoRef {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

impl PhotoRef {
    /// Pick the largest-resolution variant. Ties keep the later entry, which is
    /// how Telegram orders its sizes.
    pub fn largest(sizes: &[PhotoRef]) -> Option<&PhotoRef> {
        sizes
            .iter()
            .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
    }
}

/// Transport-agnostic inbound message.
#[derive(Clone, Debug)]
pub struct Inbound {
    pub chat_id: ChatId,
    pub sender: Option<UserId>,
    pub payload: InboundPayload,
}

#[derive(Clone, Debug)]
pub enum InboundPayload {
    Text(String),
    Photo(Vec<PhotoRef>),
}

use std::path::Path;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::PhotoRef,
    Result,
};

/// The messaging transport as seen by the gallery core.
///
/// Adapters own retries, timeouts and cancellation; the core only sends text
/// replies and pulls photo bytes.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// Download the referenced photo into `dest`, returning the number of bytes written.
    async fn fetch_photo(&self, photo: &PhotoRef, dest: &Path) -> Result<u64>;
}

use serde::{Deserialize, Serialize};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Sequential photo number; maps 1:1 to a `photo<n>.jpg` file in the public dir.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhotoId(pub u64);

const PHOTO_PREFIX: &str = "photo";
const PHOTO_SUFFIX: &str = ".jpg";

impl PhotoId {
    pub fn file_name(self) -> String {
        format!("{PHOTO_PREFIX}{}{PHOTO_SUFFIX}", self.0)
    }

    /// Parse `photo<n>.jpg`. Anything else is not a gallery-numbered file.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let digits = name.strip_prefix(PHOTO_PREFIX)?.strip_suffix(PHOTO_SUFFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse::<u64>().ok().map(PhotoId)
    }
}

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

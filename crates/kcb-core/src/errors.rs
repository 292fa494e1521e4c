use crate::domain::PhotoId;

/// Core error type for the gallery bot.
///
/// Adapter crates map their transport errors into `External`. The user-facing
/// variants carry everything needed to render a reply in the same conversation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("access denied")]
    Unauthorized,

    #[error("usage error: {0}")]
    Usage(&'static str),

    #[error("invalid photo id: {0:?}")]
    InvalidId(String),

    #[error("photo {0} not found")]
    NotFound(PhotoId),

    #[error("no photo ids left")]
    IdsExhausted,

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Reply text shown to the sender when a command fails.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthorized => "Access denied.".to_string(),
            Error::Usage(usage) => (*usage).to_string(),
            Error::InvalidId(_) => "Invalid photo ID. Use a number.".to_string(),
            Error::NotFound(id) => format!("Photo #{} not found in gallery.", id.0),
            Error::IdsExhausted => "The gallery has run out of photo IDs.".to_string(),
            other => format!("Something went wrong: {other}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

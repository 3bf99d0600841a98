use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;

/// Failure to read a message from the chat platform.
///
/// Always recovered locally: a reply-chain walk is truncated, response flags
/// fall back to their defaults.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The message was deleted or never existed.
    #[error("message {message_id} not found in channel {channel_id}")]
    NotFound { channel_id: u64, message_id: u64 },

    /// Permission denied, HTTP failure or anything else the platform reported.
    #[error("platform error: {0}")]
    Platform(String),

    #[error("fetch timed out after {ms}ms")]
    Timeout { ms: u64 },
}

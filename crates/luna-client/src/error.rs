use thiserror::Error;

/// Failures talking to the LUNA workflow API.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Failed to create session: {status}")]
    SessionCreation { status: String },

    #[error("Failed to send message: {status}")]
    MessageSend { status: String },

    #[error("Failed to get session state: {status}")]
    SessionState { status: String },

    #[error("No active session for channel {channel_id}")]
    NoActiveSession { channel_id: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

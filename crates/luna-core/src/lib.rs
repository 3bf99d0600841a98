pub mod config;
pub mod context;
pub mod error;
pub mod source;

pub use config::RelayConfig;
pub use context::{MessageContext, ThreadEntry};
pub use error::{FetchError, RelayError};
pub use source::{ChatMessage, MessageSource, ReplyReference};

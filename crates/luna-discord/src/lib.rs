pub mod adapter;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod history;
pub mod send;
pub mod snapshot;

pub use adapter::DiscordAdapter;
pub use error::DiscordError;
pub use history::DiscordHistory;

//! Context assembly: turns an inbound chat message into the structured
//! context handed to a LUNA session.

pub mod assembler;
pub mod chain;

pub use assembler::{ContextAssembler, ContextBuilder};
pub use chain::resolve_reply_chain;

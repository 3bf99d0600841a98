//! HTTP client for the LUNA workflow API.
//!
//! Every inbound chat message gets a fresh session: create it seeded with the
//! message context, post a `session_id:<id>` system marker so workflow steps
//! can resolve the id, then post the user's text and return the reply.

pub mod client;
pub mod error;
pub mod types;

pub use client::{OriginMessage, WorkflowClient};
pub use error::WorkflowError;
pub use types::{
    ResponseFlags, ResponseMessage, Role, Session, SessionData, SessionSeed, WorkflowResponse,
    WorkflowStatus,
};

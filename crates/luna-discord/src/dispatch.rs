//! What to post back into the channel once the workflow has answered.

use std::fmt::Display;

use luna_client::{WorkflowError, WorkflowResponse};

/// Content of the last assistant message, if the workflow is in a state
/// worth relaying and that message says something.
pub fn select_reply(response: &WorkflowResponse) -> Option<&str> {
    if !response.status.is_replyable() {
        return None;
    }
    response
        .last_assistant_message()
        .and_then(|m| m.content.as_deref())
        .filter(|content| !content.is_empty())
}

/// Diagnostic shown in chat when a debug-prefixed message fails.
pub fn diagnostic(api_url: &str, error: &dyn Display) -> String {
    format!(
        "\u{26a0}\u{fe0f} **LUNA API Connection Error**\n\
         Could not connect to LUNA API server.\n\
         Please make sure it's running at {api_url}\n\n\
         Error: {error}"
    )
}

/// Decide the single reply (if any) for one relayed message.
///
/// Errors only produce a reply when `text` starts with `debug_prefix`.
pub fn plan_reply(
    text: &str,
    result: &Result<WorkflowResponse, WorkflowError>,
    debug_prefix: &str,
    api_url: &str,
) -> Option<String> {
    match result {
        Ok(response) => select_reply(response).map(str::to_string),
        Err(e) if !debug_prefix.is_empty() && text.starts_with(debug_prefix) => {
            Some(diagnostic(api_url, e))
        }
        Err(_) => None,
    }
}

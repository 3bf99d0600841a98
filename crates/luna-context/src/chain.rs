use luna_core::context::ThreadEntry;
use luna_core::source::{ChatMessage, MessageSource};
use tracing::{debug, warn};

/// Walk reply references backwards from `message` and return its ancestors,
/// oldest first. `message` itself is not included.
///
/// Each hop fetches the referenced message from the current message's
/// channel. A failed fetch (deleted message, missing permission, timeout)
/// ends the walk and whatever was collected so far is returned. At most
/// `max_depth` hops are taken; `0` disables the cap.
pub async fn resolve_reply_chain(
    source: &dyn MessageSource,
    message: &ChatMessage,
    max_depth: usize,
) -> Vec<ThreadEntry> {
    let mut thread = Vec::new();
    let mut current = message.clone();

    while let Some(parent_id) = current.replied_message_id() {
        if max_depth != 0 && thread.len() >= max_depth {
            warn!(
                message_id = message.id,
                max_depth, "reply chain exceeds max depth, truncating"
            );
            break;
        }

        match source.fetch(current.channel_id, parent_id).await {
            Ok(parent) => {
                thread.push(ThreadEntry::from(&parent));
                current = parent;
            }
            Err(e) => {
                warn!(
                    channel_id = current.channel_id,
                    message_id = parent_id,
                    error = %e,
                    "failed to fetch reply chain message"
                );
                break;
            }
        }
    }

    // Collected newest-first while walking back.
    thread.reverse();
    debug!(message_id = message.id, depth = thread.len(), "reply chain resolved");
    thread
}

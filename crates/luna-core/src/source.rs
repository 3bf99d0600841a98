//! The chat-platform capability the relay depends on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::context::AuthorSummary;
use crate::error::FetchError;

/// A message as read back from the chat store.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: u64,
    pub channel_id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
    pub reference: Option<ReplyReference>,
}

impl ChatMessage {
    /// Id of the message this one replies to, if any.
    pub fn replied_message_id(&self) -> Option<u64> {
        self.reference.as_ref().and_then(|r| r.message_id)
    }

    pub fn is_reply_to(&self, message_id: u64) -> bool {
        self.replied_message_id() == Some(message_id)
    }
}

/// Pointer from a reply to the message it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyReference {
    pub message_id: Option<u64>,
    pub channel_id: Option<u64>,
    pub guild_id: Option<u64>,
}

/// Read access to channel history.
///
/// Implemented over serenity's REST client in `luna-discord`; tests use
/// [`memory::MemorySource`].
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch a single message by id.
    async fn fetch(&self, channel_id: u64, message_id: u64) -> Result<ChatMessage, FetchError>;

    /// Fetch up to `limit` of the most recent messages in a channel, newest first.
    async fn recent(&self, channel_id: u64, limit: u8) -> Result<Vec<ChatMessage>, FetchError>;
}

#[cfg(any(test, feature = "testing"))]
pub mod memory {
    //! In-memory message store for tests.

    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    pub struct MemorySource {
        messages: HashMap<u64, ChatMessage>,
        failing: HashSet<u64>,
        history_fails: bool,
        fetches: AtomicUsize,
    }

    impl MemorySource {
        pub fn new(messages: impl IntoIterator<Item = ChatMessage>) -> Self {
            Self {
                messages: messages.into_iter().map(|m| (m.id, m)).collect(),
                ..Self::default()
            }
        }

        /// Make fetching `message_id` fail as if it had been deleted.
        pub fn failing(mut self, message_id: u64) -> Self {
            self.failing.insert(message_id);
            self
        }

        /// Make every `recent` call fail.
        pub fn history_fails(mut self) -> Self {
            self.history_fails = true;
            self
        }

        /// Number of single-message fetches served so far.
        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MessageSource for MemorySource {
        async fn fetch(&self, channel_id: u64, message_id: u64) -> Result<ChatMessage, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&message_id) {
                return Err(FetchError::NotFound {
                    channel_id,
                    message_id,
                });
            }
            self.messages
                .get(&message_id)
                .filter(|m| m.channel_id == channel_id)
                .cloned()
                .ok_or(FetchError::NotFound {
                    channel_id,
                    message_id,
                })
        }

        async fn recent(&self, channel_id: u64, limit: u8) -> Result<Vec<ChatMessage>, FetchError> {
            if self.history_fails {
                return Err(FetchError::Platform("Missing Access".into()));
            }
            let mut in_channel: Vec<ChatMessage> = self
                .messages
                .values()
                .filter(|m| m.channel_id == channel_id)
                .cloned()
                .collect();
            // Snowflakes grow over time, so id order is chronological order.
            in_channel.sort_by(|a, b| b.id.cmp(&a.id));
            in_channel.truncate(limit as usize);
            Ok(in_channel)
        }
    }

    /// Build a plain message; `reply_to` sets a same-channel reply reference.
    pub fn message(id: u64, channel_id: u64, content: &str, reply_to: Option<u64>) -> ChatMessage {
        ChatMessage {
            id,
            channel_id,
            content: content.to_string(),
            created_at: DateTime::from_timestamp(1_700_000_000 + id as i64, 0).unwrap_or_default(),
            author: AuthorSummary {
                id: format!("user-{id}"),
                username: format!("user{id}"),
                discriminator: None,
                global_name: None,
                bot: false,
            },
            reference: reply_to.map(|target| ReplyReference {
                message_id: Some(target),
                channel_id: Some(channel_id),
                guild_id: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{message, MemorySource};
    use super::*;

    #[tokio::test]
    async fn recent_is_newest_first_and_limited() {
        let source = MemorySource::new((1..=30).map(|id| message(id, 7, "x", None)));
        let recent = source.recent(7, 20).await.unwrap();
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0].id, 30);
        assert_eq!(recent[19].id, 11);
    }

    #[tokio::test]
    async fn fetch_respects_channel_and_failures() {
        let source = MemorySource::new([message(1, 7, "a", None), message(2, 7, "b", Some(1))]).failing(2);
        assert!(source.fetch(8, 1).await.is_err());
        assert!(matches!(source.fetch(7, 2).await, Err(FetchError::NotFound { .. })));
        assert_eq!(source.fetch(7, 1).await.unwrap().content, "a");
        assert_eq!(source.fetch_count(), 3);
    }

    #[test]
    fn reply_helpers() {
        let reply = message(2, 7, "b", Some(1));
        assert_eq!(reply.replied_message_id(), Some(1));
        assert!(reply.is_reply_to(1));
        assert!(!message(1, 7, "a", None).is_reply_to(1));
    }
}

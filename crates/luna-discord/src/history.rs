//! Channel history read through serenity's REST client.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::builder::GetMessages;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, MessageId};
use serenity::model::user::User;
use serenity::model::Timestamp;

use luna_core::context::AuthorSummary;
use luna_core::error::FetchError;
use luna_core::source::{ChatMessage, MessageSource, ReplyReference};

/// [`MessageSource`] backed by Discord's REST API.
///
/// Each request is bounded by `timeout`; a timed-out fetch is reported like
/// any other failure.
pub struct DiscordHistory {
    http: Arc<Http>,
    timeout: Duration,
}

impl DiscordHistory {
    pub fn new(http: Arc<Http>, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = serenity::Result<T>>,
    ) -> Result<T, FetchError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| FetchError::Platform(e.to_string())),
            Err(_) => Err(FetchError::Timeout {
                ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl MessageSource for DiscordHistory {
    async fn fetch(&self, channel_id: u64, message_id: u64) -> Result<ChatMessage, FetchError> {
        let msg = self
            .bounded(ChannelId::new(channel_id).message(&self.http, MessageId::new(message_id)))
            .await?;
        Ok(chat_message(&msg))
    }

    async fn recent(&self, channel_id: u64, limit: u8) -> Result<Vec<ChatMessage>, FetchError> {
        let msgs = self
            .bounded(ChannelId::new(channel_id).messages(&self.http, GetMessages::new().limit(limit)))
            .await?;
        Ok(msgs.iter().map(chat_message).collect())
    }
}

/// Flatten a serenity message into the platform-neutral view.
pub fn chat_message(msg: &Message) -> ChatMessage {
    ChatMessage {
        id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        content: msg.content.clone(),
        created_at: to_utc(&msg.timestamp),
        author: author_summary(&msg.author),
        reference: msg.message_reference.as_ref().map(|r| ReplyReference {
            message_id: r.message_id.map(|id| id.get()),
            channel_id: Some(r.channel_id.get()),
            guild_id: r.guild_id.map(|id| id.get()),
        }),
    }
}

pub fn author_summary(user: &User) -> AuthorSummary {
    AuthorSummary {
        id: user.id.to_string(),
        username: user.name.clone(),
        discriminator: user.discriminator.map(|d| format!("{:04}", d.get())),
        global_name: user.global_name.clone(),
        bot: user.bot,
    }
}

/// Millisecond-precise conversion; Discord timestamps carry fractional seconds.
pub fn to_utc(ts: &Timestamp) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&ts.to_string())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::from_timestamp(ts.unix_timestamp(), 0).unwrap_or_default())
}

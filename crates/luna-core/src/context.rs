//! Serializable snapshot of an inbound chat message.
//!
//! Field names follow the camelCase shape the LUNA workflows resolve through
//! `@{SESSION_ID}.data.initial_data.*`, so renaming anything here is a wire
//! change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::{ChatMessage, ReplyReference};

/// Everything the workflow gets to know about one inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageContext {
    pub message: MessageInfo,
    pub author: AuthorInfo,
    pub member: Option<MemberInfo>,
    pub channel: ChannelInfo,
    pub guild: Option<GuildInfo>,
    /// Reply ancestry, oldest first.
    pub thread: Vec<ThreadEntry>,
}

impl MessageContext {
    pub fn channel_id(&self) -> &str {
        &self.channel.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub reference: Option<ReferenceInfo>,
    pub attachments: Vec<AttachmentInfo>,
    /// Action rows as Discord serializes them; forwarded untouched.
    #[serde(default)]
    pub components: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceInfo {
    pub message_id: Option<String>,
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
}

impl From<&ReplyReference> for ReferenceInfo {
    fn from(r: &ReplyReference) -> Self {
        Self {
            message_id: r.message_id.map(|id| id.to_string()),
            channel_id: r.channel_id.map(|id| id.to_string()),
            guild_id: r.guild_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInfo {
    pub id: String,
    pub name: String,
    pub url: String,
    pub content_type: Option<String>,
}

/// Reduced author view, shared by the inbound message and thread entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
    /// Legacy `#1234` tag; absent for accounts on the new username system.
    pub discriminator: Option<String>,
    pub global_name: Option<String>,
    pub bot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorInfo {
    #[serde(flatten)]
    pub summary: AuthorSummary,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub id: String,
    pub nickname: Option<String>,
    pub roles: Vec<RoleInfo>,
    pub joined_at: Option<DateTime<Utc>>,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub id: String,
    pub name: String,
    pub color: u32,
    pub position: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub id: String,
    pub name: Option<String>,
    /// Numeric Discord channel type (0 = text, 1 = DM, 11 = public thread, ...).
    #[serde(rename = "type")]
    pub kind: Option<u8>,
    pub topic: Option<String>,
    pub nsfw: Option<bool>,
    pub parent_id: Option<String>,
}

impl ChannelInfo {
    /// Channel info when nothing beyond the id could be resolved.
    pub fn bare(id: u64) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            kind: None,
            topic: None,
            nsfw: None,
            parent_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "iconURL")]
    pub icon_url: Option<String>,
    pub member_count: u64,
}

/// One ancestor in a reply chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadEntry {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
}

impl From<&ChatMessage> for ThreadEntry {
    fn from(m: &ChatMessage) -> Self {
        Self {
            id: m.id.to_string(),
            content: m.content.clone(),
            created_at: m.created_at,
            author: m.author.clone(),
        }
    }
}

/// A live message event, flattened out of the chat library's types.
///
/// Carries the data only the gateway event has (member, guild, attachments);
/// ancestors fetched over REST are plain [`ChatMessage`]s.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message: ChatMessage,
    pub avatar: Option<String>,
    pub attachments: Vec<AttachmentInfo>,
    pub components: Vec<serde_json::Value>,
    pub member: Option<MemberInfo>,
    pub channel: ChannelInfo,
    pub guild: Option<GuildInfo>,
}

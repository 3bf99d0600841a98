//! Snapshot of a gateway message event into an [`InboundMessage`].
//!
//! Guild and role data come from the cache only. The channel is resolved
//! through `to_channel`, which hits the cache first and REST second.

use std::time::Duration;

use serenity::cache::Cache;
use serenity::model::channel::{Channel, Message};
use serenity::model::id::GuildId;
use serenity::prelude::Context;
use tracing::debug;

use luna_core::context::{
    AttachmentInfo, ChannelInfo, GuildInfo, InboundMessage, MemberInfo, RoleInfo,
};

use crate::history::{chat_message, to_utc};

pub async fn inbound_message(ctx: &Context, msg: &Message, timeout: Duration) -> InboundMessage {
    let channel = resolve_channel(ctx, msg, timeout).await;
    let (guild, roles) = match msg.guild_id {
        Some(gid) => guild_snapshot(&ctx.cache, gid, msg),
        None => (None, Vec::new()),
    };

    InboundMessage {
        message: chat_message(msg),
        avatar: msg.author.avatar.as_ref().map(|hash| hash.to_string()),
        attachments: msg
            .attachments
            .iter()
            .map(|a| AttachmentInfo {
                id: a.id.to_string(),
                name: a.filename.clone(),
                url: a.url.clone(),
                content_type: a.content_type.clone(),
            })
            .collect(),
        components: msg
            .components
            .iter()
            .filter_map(|row| serde_json::to_value(row).ok())
            .collect(),
        member: member_info(msg, roles),
        channel,
        guild,
    }
}

async fn resolve_channel(ctx: &Context, msg: &Message, timeout: Duration) -> ChannelInfo {
    let fetched = tokio::time::timeout(timeout, msg.channel_id.to_channel(ctx)).await;
    match fetched {
        Ok(Ok(Channel::Guild(gc))) => ChannelInfo {
            id: gc.id.to_string(),
            name: Some(gc.name.clone()),
            kind: Some(u8::from(gc.kind)),
            topic: gc.topic.clone(),
            nsfw: Some(gc.nsfw),
            parent_id: gc.parent_id.map(|id| id.to_string()),
        },
        Ok(Ok(Channel::Private(pc))) => ChannelInfo {
            name: Some(pc.name()),
            kind: Some(u8::from(pc.kind)),
            ..ChannelInfo::bare(pc.id.get())
        },
        Ok(Ok(_)) => ChannelInfo::bare(msg.channel_id.get()),
        Ok(Err(e)) => {
            debug!(channel_id = %msg.channel_id, error = %e, "channel lookup failed");
            ChannelInfo::bare(msg.channel_id.get())
        }
        Err(_) => {
            debug!(channel_id = %msg.channel_id, "channel lookup timed out");
            ChannelInfo::bare(msg.channel_id.get())
        }
    }
}

/// Read guild details and the author's roles out of the cache.
///
/// Synchronous so the cache guard never lives across an await.
fn guild_snapshot(cache: &Cache, gid: GuildId, msg: &Message) -> (Option<GuildInfo>, Vec<RoleInfo>) {
    let Some(guild) = cache.guild(gid) else {
        debug!(guild_id = %gid, "guild not cached");
        return (None, Vec::new());
    };

    let roles = msg
        .member
        .as_ref()
        .map(|m| {
            m.roles
                .iter()
                .filter_map(|rid| guild.roles.get(rid))
                .map(|r| RoleInfo {
                    id: r.id.to_string(),
                    name: r.name.clone(),
                    color: r.colour.0,
                    position: r.position,
                })
                .collect()
        })
        .unwrap_or_default();

    let info = GuildInfo {
        id: gid.to_string(),
        name: guild.name.clone(),
        icon_url: guild.icon_url(),
        member_count: guild.member_count,
    };
    (Some(info), roles)
}

fn member_info(msg: &Message, roles: Vec<RoleInfo>) -> Option<MemberInfo> {
    let member = msg.member.as_ref()?;
    let display_name = member
        .nick
        .clone()
        .or_else(|| msg.author.global_name.clone())
        .unwrap_or_else(|| msg.author.name.clone());

    Some(MemberInfo {
        id: msg.author.id.to_string(),
        nickname: member.nick.clone(),
        roles,
        joined_at: member.joined_at.as_ref().map(to_utc),
        display_name,
    })
}

use luna_core::context::{
    AttachmentInfo, AuthorInfo, ChannelInfo, GuildInfo, InboundMessage, MemberInfo,
    MessageContext, MessageInfo, ReferenceInfo, ThreadEntry,
};
use luna_core::source::{ChatMessage, MessageSource};

use crate::chain::resolve_reply_chain;

/// Builds the [`MessageContext`] for each inbound message.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_reply_depth: usize,
}

impl ContextAssembler {
    pub fn new(max_reply_depth: usize) -> Self {
        Self { max_reply_depth }
    }

    /// Resolve the reply chain of `inbound` and snapshot everything else
    /// the event carries. Never fails; unavailable data is left as `None`.
    pub async fn build_context(
        &self,
        source: &dyn MessageSource,
        inbound: &InboundMessage,
    ) -> MessageContext {
        let thread = resolve_reply_chain(source, &inbound.message, self.max_reply_depth).await;
        ContextBuilder::from_inbound(inbound).thread(thread).build()
    }
}

/// Accumulates the typed parts of a [`MessageContext`].
pub struct ContextBuilder {
    message: MessageInfo,
    author: AuthorInfo,
    member: Option<MemberInfo>,
    channel: ChannelInfo,
    guild: Option<GuildInfo>,
    thread: Vec<ThreadEntry>,
}

impl ContextBuilder {
    /// Start from the bare message; channel info defaults to just its id.
    pub fn new(message: &ChatMessage) -> Self {
        Self {
            message: MessageInfo {
                id: message.id.to_string(),
                content: message.content.clone(),
                created_at: message.created_at,
                reference: message.reference.as_ref().map(ReferenceInfo::from),
                attachments: Vec::new(),
                components: Vec::new(),
            },
            author: AuthorInfo {
                summary: message.author.clone(),
                avatar: None,
            },
            member: None,
            channel: ChannelInfo::bare(message.channel_id),
            guild: None,
            thread: Vec::new(),
        }
    }

    pub fn from_inbound(inbound: &InboundMessage) -> Self {
        Self::new(&inbound.message)
            .avatar(inbound.avatar.clone())
            .attachments(inbound.attachments.clone())
            .components(inbound.components.clone())
            .member(inbound.member.clone())
            .channel(inbound.channel.clone())
            .guild(inbound.guild.clone())
    }

    pub fn avatar(mut self, avatar: Option<String>) -> Self {
        self.author.avatar = avatar;
        self
    }

    pub fn attachments(mut self, attachments: Vec<AttachmentInfo>) -> Self {
        self.message.attachments = attachments;
        self
    }

    pub fn components(mut self, components: Vec<serde_json::Value>) -> Self {
        self.message.components = components;
        self
    }

    pub fn member(mut self, member: Option<MemberInfo>) -> Self {
        self.member = member;
        self
    }

    pub fn channel(mut self, channel: ChannelInfo) -> Self {
        self.channel = channel;
        self
    }

    pub fn guild(mut self, guild: Option<GuildInfo>) -> Self {
        self.guild = guild;
        self
    }

    pub fn thread(mut self, thread: Vec<ThreadEntry>) -> Self {
        self.thread = thread;
        self
    }

    pub fn build(self) -> MessageContext {
        MessageContext {
            message: self.message,
            author: self.author,
            member: self.member,
            channel: self.channel,
            guild: self.guild,
            thread: self.thread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luna_core::context::RoleInfo;
    use luna_core::source::memory::{message, MemorySource};

    fn inbound(message: ChatMessage) -> InboundMessage {
        InboundMessage {
            channel: ChannelInfo {
                name: Some("general".into()),
                kind: Some(0),
                nsfw: Some(false),
                ..ChannelInfo::bare(message.channel_id)
            },
            message,
            avatar: Some("abc123".into()),
            attachments: vec![AttachmentInfo {
                id: "900".into(),
                name: "log.txt".into(),
                url: "https://cdn.example/log.txt".into(),
                content_type: Some("text/plain".into()),
            }],
            components: vec![serde_json::json!({
                "type": 1,
                "components": [{"type": 2, "custom_id": "ack", "label": "Ack", "style": 1}]
            })],
            member: Some(MemberInfo {
                id: "user-3".into(),
                nickname: Some("Nick".into()),
                roles: vec![RoleInfo {
                    id: "55".into(),
                    name: "mod".into(),
                    color: 0xff0000,
                    position: 2,
                }],
                joined_at: None,
                display_name: "Nick".into(),
            }),
            guild: Some(GuildInfo {
                id: "1".into(),
                name: "Home".into(),
                icon_url: None,
                member_count: 3,
            }),
        }
    }

    #[tokio::test]
    async fn builds_full_context_with_thread() {
        let source = MemorySource::new([message(1, 7, "first", None), message(2, 7, "second", Some(1))]);
        let msg = inbound(message(3, 7, "third", Some(2)));

        let ctx = ContextAssembler::new(50).build_context(&source, &msg).await;

        assert_eq!(ctx.message.id, "3");
        assert_eq!(ctx.message.content, "third");
        assert_eq!(
            ctx.message.reference.as_ref().and_then(|r| r.message_id.as_deref()),
            Some("2")
        );
        assert_eq!(ctx.message.attachments.len(), 1);
        assert_eq!(ctx.message.components[0]["components"][0]["custom_id"], "ack");
        assert_eq!(ctx.author.avatar.as_deref(), Some("abc123"));
        assert_eq!(ctx.member.as_ref().map(|m| m.roles.len()), Some(1));
        assert_eq!(ctx.channel_id(), "7");
        assert_eq!(ctx.channel.name.as_deref(), Some("general"));
        assert_eq!(ctx.guild.as_ref().map(|g| g.name.as_str()), Some("Home"));
        let thread: Vec<_> = ctx.thread.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(thread, ["first", "second"]);
    }

    #[tokio::test]
    async fn direct_message_has_no_member_or_guild() {
        let mut msg = inbound(message(3, 7, "hi", None));
        msg.member = None;
        msg.guild = None;

        let ctx = ContextAssembler::new(50)
            .build_context(&MemorySource::default(), &msg)
            .await;
        assert!(ctx.member.is_none());
        assert!(ctx.guild.is_none());
        assert!(ctx.message.reference.is_none());
        assert!(ctx.thread.is_empty());

        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains(r#""member":null"#));
        assert!(json.contains(r#""guild":null"#));
    }

    #[test]
    fn bare_builder_defaults_channel_to_id() {
        let ctx = ContextBuilder::new(&message(5, 9, "x", None)).build();
        assert_eq!(ctx.channel.id, "9");
        assert!(ctx.channel.name.is_none());
        assert!(ctx.author.avatar.is_none());
    }
}

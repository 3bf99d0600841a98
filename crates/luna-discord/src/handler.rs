use std::sync::Arc;
use std::time::Duration;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler};
use tracing::{info, warn};

use luna_client::{OriginMessage, WorkflowClient};
use luna_context::ContextAssembler;
use luna_core::config::RelaySettings;

use crate::history::DiscordHistory;
use crate::{dispatch, send, snapshot};

/// Serenity event handler relaying messages to the LUNA workflow API.
///
/// serenity runs every event on its own task, so messages are relayed
/// concurrently and independently of one another.
pub struct RelayHandler {
    pub workflow: Arc<WorkflowClient>,
    pub assembler: ContextAssembler,
    pub settings: RelaySettings,
}

impl RelayHandler {
    pub fn new(workflow: Arc<WorkflowClient>, settings: RelaySettings) -> Self {
        Self {
            workflow,
            assembler: ContextAssembler::new(settings.max_reply_depth),
            settings,
        }
    }

    fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.fetch_timeout_secs)
    }
}

#[async_trait]
impl EventHandler for RelayHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            tag = %ready.user.tag(),
            guilds = ready.guilds.len(),
            "Discord bot connected"
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Ignore bots, including ourselves.
        if msg.author.bot {
            return;
        }

        let history = DiscordHistory::new(Arc::clone(&ctx.http), self.fetch_timeout());
        let inbound = snapshot::inbound_message(&ctx, &msg, self.fetch_timeout()).await;
        let context = self.assembler.build_context(&history, &inbound).await;

        info!(channel_id = %msg.channel_id, message_id = %msg.id, "processing message");
        let origin = OriginMessage {
            message: &inbound.message,
            source: &history,
        };
        let result = self
            .workflow
            .send_message(&msg.content, context, Some(origin))
            .await;

        if let Err(ref e) = result {
            warn!(channel_id = %msg.channel_id, error = %e, "error sending message to LUNA");
        }

        let Some(reply) = dispatch::plan_reply(
            &msg.content,
            &result,
            &self.settings.debug_prefix,
            self.workflow.api_url(),
        ) else {
            return;
        };

        if let Err(e) = send::send_reply(&ctx.http, msg.channel_id, msg.id, &reply).await {
            warn!(channel_id = %msg.channel_id, error = %e, "Discord reply failed");
        }
    }
}

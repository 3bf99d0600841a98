use std::sync::Arc;

use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use tracing::info;

use luna_client::WorkflowClient;
use luna_core::config::RelayConfig;

use crate::error::DiscordError;
use crate::handler::RelayHandler;

/// Discord side of the relay.
///
/// Wraps a serenity `Client`; serenity resumes dropped gateway sessions on
/// its own, so `run` only returns when login or the gateway fails for good.
pub struct DiscordAdapter {
    config: RelayConfig,
    workflow: Arc<WorkflowClient>,
}

impl DiscordAdapter {
    pub fn new(config: &RelayConfig, workflow: Arc<WorkflowClient>) -> Self {
        Self {
            config: config.clone(),
            workflow,
        }
    }

    pub async fn run(self) -> Result<(), DiscordError> {
        if self.config.discord.bot_token.is_empty() {
            return Err(DiscordError::NoToken);
        }

        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MEMBERS;

        let handler = RelayHandler::new(self.workflow, self.config.relay.clone());
        let mut client = Client::builder(&self.config.discord.bot_token, intents)
            .event_handler(handler)
            .await?;

        info!("Discord: gateway connecting");
        client.start().await?;

        info!("Discord: gateway stopped");
        Ok(())
    }
}

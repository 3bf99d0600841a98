use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

/// Relay Discord messages to a LUNA workflow and post its replies back.
#[derive(Debug, Parser)]
#[command(name = "luna-relay", version, about)]
struct Cli {
    /// Path to a TOML config file (default: $RELAY_CONFIG or ~/.luna/relay.toml).
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real env vars win over it.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "luna_relay=info,luna_discord=info,luna_client=info,luna_context=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > RELAY_CONFIG env > ~/.luna/relay.toml, then env overrides
    let config = luna_core::RelayConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults and environment", e);
        luna_core::RelayConfig::from_env()
    });

    info!(
        api_url = %config.luna.api_url,
        workflow = %config.luna.workflow_id,
        "LUNA relay starting"
    );

    let workflow = Arc::new(luna_client::WorkflowClient::new(
        &config.luna,
        config.relay.history_limit,
    )?);

    let adapter = luna_discord::DiscordAdapter::new(&config, workflow);
    if let Err(e) = adapter.run().await {
        error!(error = %e, "Failed to log in to Discord");
        std::process::exit(1);
    }

    Ok(())
}

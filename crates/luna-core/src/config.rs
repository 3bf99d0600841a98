use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_WORKFLOW_ID: &str = "discord-root";
pub const DEFAULT_DEBUG_PREFIX: &str = "!debug";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_REPLY_DEPTH: usize = 50;
/// How many recent channel messages are scanned when checking for replies.
pub const DEFAULT_HISTORY_LIMIT: u8 = 20;

/// Top-level config (relay.toml + DISCORD_BOT_TOKEN / LUNA_* / RELAY_* env overrides).
///
/// Built once at startup and handed to the workflow client and the Discord
/// dispatcher; nothing reads the environment after that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub luna: LunaConfig,
    #[serde(default)]
    pub relay: RelaySettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Bot credential. Usually supplied through `DISCORD_BOT_TOKEN`.
    #[serde(default)]
    pub bot_token: String,
}

/// Remote workflow API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LunaConfig {
    /// Base URL without trailing slash, e.g. `http://localhost:5000/api`.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Workflow every new session is started on.
    #[serde(default = "default_workflow_id")]
    pub workflow_id: String,
    /// Per-request timeout applied to every call against the API.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LunaConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            workflow_id: default_workflow_id(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Relay behaviour knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Messages starting with this prefix get API errors echoed back into chat.
    #[serde(default = "default_debug_prefix")]
    pub debug_prefix: String,
    /// Maximum reply-chain hops followed per message. `0` means unbounded.
    #[serde(default = "default_max_reply_depth")]
    pub max_reply_depth: usize,
    /// Number of recent channel messages scanned for replies to the inbound message.
    #[serde(default = "default_history_limit")]
    pub history_limit: u8,
    /// Timeout for each Discord REST fetch (reply-chain hops, recent history).
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            debug_prefix: default_debug_prefix(),
            max_reply_depth: DEFAULT_MAX_REPLY_DEPTH,
            history_limit: DEFAULT_HISTORY_LIMIT,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_workflow_id() -> String {
    DEFAULT_WORKFLOW_ID.to_string()
}
fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_debug_prefix() -> String {
    DEFAULT_DEBUG_PREFIX.to_string()
}
fn default_max_reply_depth() -> usize {
    DEFAULT_MAX_REPLY_DEPTH
}
fn default_history_limit() -> u8 {
    DEFAULT_HISTORY_LIMIT
}
fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

impl RelayConfig {
    /// Load config from defaults, an optional TOML file and the environment.
    ///
    /// Precedence (lowest to highest):
    ///   1. Built-in defaults
    ///   2. TOML file: explicit path, else `RELAY_CONFIG`, else ~/.luna/relay.toml
    ///   3. `DISCORD_BOT_TOKEN`, `LUNA_*` and `RELAY_*` env vars
    ///
    /// A missing TOML file is not an error; env-only deployments are the norm.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("RELAY_CONFIG").ok())
            .unwrap_or_else(default_config_path);

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::RelayError::Config(e.to_string()))
    }

    /// Defaults plus the environment, skipping the TOML file.
    ///
    /// Used when `load` fails. Each section is extracted on its own so a bad
    /// value in one (say `RELAY_MAX_REPLY_DEPTH=fifty`) only resets that
    /// section to its defaults; the bot token and API settings survive.
    pub fn from_env() -> Self {
        let figment =
            Self::env_layers(Figment::from(Serialized::defaults(RelayConfig::default())));
        Self {
            discord: section(&figment, "discord"),
            luna: section(&figment, "luna"),
            relay: section(&figment, "relay"),
        }
    }

    fn figment(path: &str) -> Figment {
        Self::env_layers(
            Figment::from(Serialized::defaults(RelayConfig::default())).merge(Toml::file(path)),
        )
    }

    fn env_layers(figment: Figment) -> Figment {
        figment
            .merge(
                Env::raw()
                    .only(&["DISCORD_BOT_TOKEN"])
                    .map(|_| "discord.bot_token".into()),
            )
            .merge(
                Env::prefixed("LUNA_")
                    .map(|k| format!("luna.{}", k.as_str().to_ascii_lowercase()).into()),
            )
            .merge(
                Env::prefixed("RELAY_")
                    .ignore(&["CONFIG"])
                    .map(|k| format!("relay.{}", k.as_str().to_ascii_lowercase()).into()),
            )
    }
}

fn section<T: DeserializeOwned + Default>(figment: &Figment, key: &str) -> T {
    figment.extract_inner(key).unwrap_or_else(|e| {
        warn!(section = key, error = %e, "invalid config section, using its defaults");
        T::default()
    })
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.luna/relay.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_documented_values() {
        let config = RelayConfig::default();
        assert_eq!(config.luna.api_url, "http://localhost:5000/api");
        assert_eq!(config.luna.workflow_id, "discord-root");
        assert_eq!(config.relay.debug_prefix, "!debug");
        assert_eq!(config.relay.history_limit, 20);
        assert!(config.discord.bot_token.is_empty());
    }

    #[test]
    fn env_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("DISCORD_BOT_TOKEN", "secret-token");
            jail.set_env("LUNA_API_URL", "http://luna.internal:8080/api");
            jail.set_env("LUNA_WORKFLOW_ID", "discord_operator");
            jail.set_env("RELAY_MAX_REPLY_DEPTH", "5");

            let config: RelayConfig = RelayConfig::figment("missing.toml").extract()?;
            assert_eq!(config.discord.bot_token, "secret-token");
            assert_eq!(config.luna.api_url, "http://luna.internal:8080/api");
            assert_eq!(config.luna.workflow_id, "discord_operator");
            assert_eq!(config.relay.max_reply_depth, 5);
            assert_eq!(config.relay.debug_prefix, "!debug");
            Ok(())
        });
    }

    #[test]
    fn toml_file_is_layered_under_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "relay.toml",
                r#"
                [luna]
                api_url = "http://from-file/api"
                request_timeout_secs = 5

                [relay]
                debug_prefix = "?dbg"
                "#,
            )?;
            jail.set_env("LUNA_API_URL", "http://from-env/api");

            let config: RelayConfig = RelayConfig::figment("relay.toml").extract()?;
            assert_eq!(config.luna.api_url, "http://from-env/api");
            assert_eq!(config.luna.request_timeout_secs, 5);
            assert_eq!(config.relay.debug_prefix, "?dbg");
            assert_eq!(config.luna.workflow_id, "discord-root");
            Ok(())
        });
    }

    #[test]
    fn malformed_file_keeps_environment() {
        Jail::expect_with(|jail| {
            jail.create_file("relay.toml", "[luna\napi_url = ")?;
            jail.set_env("DISCORD_BOT_TOKEN", "secret-token");
            jail.set_env("LUNA_API_URL", "http://from-env/api");

            assert!(matches!(
                RelayConfig::load(Some("relay.toml")),
                Err(crate::error::RelayError::Config(_))
            ));

            let config = RelayConfig::from_env();
            assert_eq!(config.discord.bot_token, "secret-token");
            assert_eq!(config.luna.api_url, "http://from-env/api");
            assert_eq!(config.relay.debug_prefix, "!debug");
            Ok(())
        });
    }

    #[test]
    fn bad_env_value_only_resets_its_section() {
        Jail::expect_with(|jail| {
            jail.set_env("DISCORD_BOT_TOKEN", "secret-token");
            jail.set_env("LUNA_WORKFLOW_ID", "discord_operator");
            jail.set_env("RELAY_MAX_REPLY_DEPTH", "fifty");
            jail.set_env("RELAY_DEBUG_PREFIX", "?dbg");

            assert!(RelayConfig::load(Some("missing.toml")).is_err());

            let config = RelayConfig::from_env();
            assert_eq!(config.discord.bot_token, "secret-token");
            assert_eq!(config.luna.workflow_id, "discord_operator");
            assert_eq!(config.relay.max_reply_depth, DEFAULT_MAX_REPLY_DEPTH);
            assert_eq!(config.relay.debug_prefix, "!debug");
            Ok(())
        });
    }
}

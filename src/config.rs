//! Configuration shape and per-channel webhook lookup.
//!
//! The adapter reads one slice of the host configuration:
//! `channels.discord.guilds.<guild_id>.channels.<channel_id>.webhook`.
//! Everything else in the host config is opaque to this crate.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

/// Top-level host configuration (the slice this adapter consumes).
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Per-platform channel configuration.
    #[serde(default)]
    pub channels: ChannelsConfig,
}

/// Channel configuration keyed by platform.
#[derive(Debug, Default, Deserialize)]
pub struct ChannelsConfig {
    /// Discord channel settings.
    #[serde(default)]
    pub discord: DiscordConfig,
}

/// Discord-specific configuration.
#[derive(Debug, Deserialize)]
pub struct DiscordConfig {
    /// Environment variable name holding the bot token.
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    /// Guild entries keyed by guild snowflake.
    #[serde(default)]
    pub guilds: HashMap<String, GuildConfig>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token_env: default_bot_token_env(),
            guilds: HashMap::new(),
        }
    }
}

/// One guild entry: channels keyed by channel snowflake.
#[derive(Debug, Default, Deserialize)]
pub struct GuildConfig {
    /// Channel entries for this guild.
    #[serde(default)]
    pub channels: HashMap<String, ChannelConfig>,
}

/// One channel entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelConfig {
    /// Identity-branded webhook endpoint registered for this channel, if any.
    pub webhook: Option<String>,
}

fn default_bot_token_env() -> String {
    "DISCORD_BOT_TOKEN".to_owned()
}

/// Find the webhook endpoint configured for `channel_id`, if any.
///
/// Scans every guild entry and returns the first configured endpoint whose
/// guild carries the channel. Guild iteration order is unspecified; if the
/// same channel ID is (incorrectly) configured under two guilds, which
/// endpoint wins is not defined beyond "first encountered".
pub fn webhook_for_channel<'a>(config: &'a Config, channel_id: &str) -> Option<&'a str> {
    config
        .channels
        .discord
        .guilds
        .values()
        .find_map(|guild| {
            guild
                .channels
                .get(channel_id)
                .and_then(|channel| channel.webhook.as_deref())
        })
}

/// Load the host config from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}

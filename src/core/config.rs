//! Environment-backed configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Token, prefix, guild scoping and startup sync flags

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serenity::model::id::GuildId;
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub discord_token: String,
    pub command_prefix: String,
    /// Guilds to register commands in. Empty means global registration.
    pub guild_ids: Vec<GuildId>,
    pub sync_commands_on_startup: bool,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            discord_token: lookup("DISCORD_TOKEN")
                .ok_or_else(|| anyhow::anyhow!("DISCORD_TOKEN environment variable not set"))?,
            command_prefix: lookup("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string()),
            guild_ids: parse_guild_ids(lookup("GUILD_IDS").as_deref().unwrap_or(""))?,
            sync_commands_on_startup: match lookup("SYNC_COMMANDS_ON_STARTUP") {
                Some(raw) => parse_flag(&raw)?,
                None => true,
            },
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_guild_ids(raw: &str) -> Result<Vec<GuildId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map(GuildId)
                .map_err(|_| anyhow::anyhow!("Invalid guild id in GUILD_IDS: {s}"))
        })
        .collect()
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!(
            "Invalid boolean for SYNC_COMMANDS_ON_STARTUP: {other}"
        )),
    }
}

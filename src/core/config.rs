//! Environment-driven configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{Context, Result};
use std::env;

/// Cooldown applied to commands that do not declare one
pub const DEFAULT_COOLDOWN_SECONDS: u64 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Development guild; commands are registered there instead of globally
    pub discord_guild_id: Option<String>,
    pub database_path: String,
    pub log_level: String,
    pub default_cooldown_seconds: u64,
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .context("DISCORD_TOKEN is not set in the environment variables")?;

        let discord_guild_id = lookup("DISCORD_GUILD_ID").filter(|id| !id.trim().is_empty());
        if let Some(ref id) = discord_guild_id {
            id.parse::<u64>()
                .with_context(|| format!("DISCORD_GUILD_ID must be a numeric id, got '{id}'"))?;
        }

        let default_cooldown_seconds = match lookup("DEFAULT_COOLDOWN_SECONDS") {
            Some(raw) => raw.trim().parse::<u64>().with_context(|| {
                format!("DEFAULT_COOLDOWN_SECONDS must be a non-negative integer, got '{raw}'")
            })?,
            None => DEFAULT_COOLDOWN_SECONDS,
        };

        Ok(Config {
            discord_token,
            discord_guild_id,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "partybot.db".to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            default_cooldown_seconds,
        })
    }
}

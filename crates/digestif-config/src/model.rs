// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the digestif digest service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level digestif configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DigestifConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Anthropic API settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Digest scheduling and rendering settings.
    #[serde(default)]
    pub digest: DigestConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the service.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "digestif".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables Telegram integration.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat IDs the bot will serve. Empty means every group chat the bot
    /// is added to is served (chats are created on first observed activity).
    #[serde(default)]
    pub allowed_chats: Vec<i64>,
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Anthropic API key. `None` requires environment variable, or disables
    /// the generative backend entirely (the deterministic fallback is used).
    #[serde(default)]
    pub api_key: Option<String>,

    /// Default model to use for digest generation.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Maximum tokens to generate per digest.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: default_model(),
            max_tokens: default_max_tokens(),
            api_version: default_api_version(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("digestif").join("digestif.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("digestif.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Digest scheduling and rendering configuration.
///
/// Per-chat `report_time`/`timezone`/`target_mention` override these
/// defaults; the defaults apply to newly observed chats.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DigestConfig {
    /// Default local delivery time for new chats, `HH:MM`.
    #[serde(default = "default_report_time")]
    pub default_report_time: String,

    /// Default IANA timezone for new chats.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// Default mention string addressed in digests for new chats.
    #[serde(default = "default_target_mention")]
    pub default_target_mention: String,

    /// Upper bound on one generative backend call, in seconds. A timed-out
    /// generation falls back to the deterministic template.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Upper bound on one delivery attempt, in seconds.
    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,

    /// Approximate character bound requested from the generative backend.
    #[serde(default = "default_max_digest_chars")]
    pub max_digest_chars: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            default_report_time: default_report_time(),
            default_timezone: default_timezone(),
            default_target_mention: default_target_mention(),
            generation_timeout_secs: default_generation_timeout_secs(),
            delivery_timeout_secs: default_delivery_timeout_secs(),
            max_digest_chars: default_max_digest_chars(),
        }
    }
}

fn default_report_time() -> String {
    "21:00".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_target_mention() -> String {
    "@all".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    60
}

fn default_delivery_timeout_secs() -> u64 {
    30
}

fn default_max_digest_chars() -> usize {
    3500
}

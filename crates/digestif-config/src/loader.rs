// SPDX-FileCopyrightText: 2026 Digestif Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./digestif.toml` > `~/.config/digestif/digestif.toml` > `/etc/digestif/digestif.toml`
//! with environment variable overrides via `DIGESTIF_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::DigestifConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/digestif/digestif.toml` (system-wide)
/// 3. `~/.config/digestif/digestif.toml` (user XDG config)
/// 4. `./digestif.toml` (local directory)
/// 5. `DIGESTIF_*` environment variables
pub fn load_config() -> Result<DigestifConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DigestifConfig::default()))
        .merge(Toml::file("/etc/digestif/digestif.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("digestif/digestif.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("digestif.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config file specification.
pub fn load_config_from_str(toml_content: &str) -> Result<DigestifConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DigestifConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DigestifConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DigestifConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `DIGESTIF_TELEGRAM_BOT_TOKEN`
/// must map to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("DIGESTIF_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: DIGESTIF_TELEGRAM_BOT_TOKEN -> "telegram_bot_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("anthropic_", "anthropic.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("digest_", "digest.", 1);
        mapped.into()
    })
}

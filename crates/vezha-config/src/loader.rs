// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading through figment.
//!
//! `./vezha.toml` wins over `~/.config/vezha/vezha.toml`, which wins over
//! `/etc/vezha/vezha.toml`; `VEZHA_*` environment variables override all
//! three.

#![allow(clippy::result_large_err)] // figment::Error is foreign; boxing it would need a wrapper type

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VezhaConfig;

/// Extract configuration from the default search locations.
///
/// Later layers override earlier ones:
/// 1. Compiled-in defaults
/// 2. `/etc/vezha/vezha.toml` (system-wide)
/// 3. `~/.config/vezha/vezha.toml` (user XDG config)
/// 4. `./vezha.toml` (local directory)
/// 5. `VEZHA_*` environment variables
pub fn load_config() -> Result<VezhaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VezhaConfig::default()))
        .merge(Toml::file("/etc/vezha/vezha.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("vezha/vezha.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("vezha.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string only (no XDG lookup).
///
/// Used for testing and inline overrides.
pub fn load_config_from_str(toml_content: &str) -> Result<VezhaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VezhaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Extract configuration from one named file plus environment overrides.
pub fn load_config_from_path(path: &Path) -> Result<VezhaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VezhaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider with explicit section-to-dot mapping.
///
/// `Env::split("_")` would be ambiguous for keys that themselves contain
/// underscores: `VEZHA_TELEGRAM_BOT_TOKEN` has to become
/// `telegram.bot_token`, never `telegram.bot.token`. Rewriting only the
/// section prefix keeps the rest of the name intact.
fn env_provider() -> Env {
    Env::prefixed("VEZHA_").map(|key| {
        // Figment hands the name over lowercased with the prefix gone,
        // so VEZHA_DEEPSEEK_API_KEY arrives as "deepseek_api_key".
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("deepseek_", "deepseek.", 1)
            .replacen("history_", "history.", 1)
            .replacen("moderation_", "moderation.", 1)
            .replacen("health_", "health.", 1);
        mapped.into()
    })
}

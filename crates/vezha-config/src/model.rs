// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vezha moderation bot.
//!
//! Every section derives `deny_unknown_fields`, so a misspelled key
//! fails startup instead of being silently dropped.

use serde::{Deserialize, Serialize};

/// Top-level Vezha configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; only the two secrets (bot token, API key) have no default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VezhaConfig {
    /// Process identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// DeepSeek API settings.
    #[serde(default)]
    pub deepseek: DeepSeekConfig,

    /// Conversation history window settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Moderation pipeline settings.
    #[serde(default)]
    pub moderation: ModerationConfig,

    /// Health/metrics endpoint settings.
    #[serde(default)]
    pub health: HealthConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the bot process.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Log verbosity for the `vezha` target (trace through error).
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
    "vezha".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required to serve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
}

/// DeepSeek API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeepSeekConfig {
    /// DeepSeek API key. Required to serve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API base URL (without the `/v1/chat/completions` suffix).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout for non-streaming calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries for transient HTTP failures on non-streaming calls.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    1
}

/// Conversation history window configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Maximum messages retained per chat.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Lifetime of a chat's whole window. Every write restarts the clock.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Fullness ratio above which tone classification runs.
    #[serde(default = "default_saturation_threshold")]
    pub saturation_threshold: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_secs: default_ttl_secs(),
            saturation_threshold: default_saturation_threshold(),
        }
    }
}

fn default_capacity() -> usize {
    10
}

fn default_ttl_secs() -> u64 {
    86_400
}

fn default_saturation_threshold() -> f64 {
    0.5
}

/// Moderation pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModerationConfig {
    /// Path to a lexicon TOML file replacing the built-in word lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexicon_path: Option<String>,

    /// Window within which an identical repeated message counts as spam,
    /// in seconds.
    #[serde(default = "default_repeat_window_secs")]
    pub repeat_window_secs: u64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            lexicon_path: None,
            repeat_window_secs: default_repeat_window_secs(),
        }
    }
}

fn default_repeat_window_secs() -> u64 {
    180
}

/// Health/metrics endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    /// Whether to serve the health/metrics listener at all.
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,

    /// Address to bind the listener to.
    #[serde(default = "default_health_host")]
    pub host: String,

    /// Port to bind the listener to.
    #[serde(default = "default_health_port")]
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            host: default_health_host(),
            port: default_health_port(),
        }
    }
}

fn default_health_enabled() -> bool {
    true
}

fn default_health_host() -> String {
    "127.0.0.1".to_string()
}

fn default_health_port() -> u16 {
    8601
}

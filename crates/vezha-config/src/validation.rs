// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that run after deserialization.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: required secrets, window bounds, threshold ranges, and
//! listener addresses.

use crate::diagnostic::ConfigError;
use crate::model::VezhaConfig;

/// Check a deserialized configuration for semantic problems.
///
/// Keeps going after the first failure and returns every problem at once.
pub fn validate_config(config: &VezhaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    match &config.telegram.bot_token {
        None => errors.push(ConfigError::Validation {
            message: "telegram.bot_token is required (set VEZHA_TELEGRAM_BOT_TOKEN or add it to vezha.toml)".to_string(),
        }),
        Some(token) if token.trim().is_empty() => errors.push(ConfigError::Validation {
            message: "telegram.bot_token must not be empty".to_string(),
        }),
        Some(_) => {}
    }

    match &config.deepseek.api_key {
        None => errors.push(ConfigError::Validation {
            message: "deepseek.api_key is required (set VEZHA_DEEPSEEK_API_KEY or add it to vezha.toml)".to_string(),
        }),
        Some(key) if key.trim().is_empty() => errors.push(ConfigError::Validation {
            message: "deepseek.api_key must not be empty".to_string(),
        }),
        Some(_) => {}
    }

    let base_url = config.deepseek.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("deepseek.base_url `{base_url}` must start with http:// or https://"),
        });
    }

    if config.deepseek.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "deepseek.request_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.history.capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "history.capacity must be at least 1".to_string(),
        });
    }

    if config.history.ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "history.ttl_secs must be at least 1".to_string(),
        });
    }

    let threshold = config.history.saturation_threshold;
    if !(threshold > 0.0 && threshold < 1.0) {
        errors.push(ConfigError::Validation {
            message: format!(
                "history.saturation_threshold must be strictly between 0 and 1, got {threshold}"
            ),
        });
    }

    if config.moderation.repeat_window_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "moderation.repeat_window_secs must be at least 1".to_string(),
        });
    }

    if let Some(path) = &config.moderation.lexicon_path
        && path.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "moderation.lexicon_path must not be empty when set".to_string(),
        });
    }

    // The health listener address only matters when the listener is enabled.
    if config.health.enabled {
        let host = config.health.host.trim();
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = !host.is_empty()
            && host
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("health.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_secrets() -> VezhaConfig {
        let mut config = VezhaConfig::default();
        config.telegram.bot_token = Some("123:abc".to_string());
        config.deepseek.api_key = Some("sk-test".to_string());
        config
    }

    #[test]
    fn config_with_secrets_validates() {
        assert!(validate_config(&config_with_secrets()).is_ok());
    }

    #[test]
    fn missing_secrets_are_both_reported() {
        let config = VezhaConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("bot_token"))
        ));
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("api_key"))
        ));
    }

    #[test]
    fn zero_capacity_fails_validation() {
        let mut config = config_with_secrets();
        config.history.capacity = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("capacity"))
        ));
    }

    #[test]
    fn threshold_bounds_are_exclusive() {
        for bad in [0.0, 1.0, -0.2, 1.5] {
            let mut config = config_with_secrets();
            config.history.saturation_threshold = bad;
            let errors = validate_config(&config).unwrap_err();
            assert!(
                errors.iter().any(|e| matches!(
                    e,
                    ConfigError::Validation { message } if message.contains("saturation_threshold")
                )),
                "threshold {bad} should be rejected"
            );
        }
    }

    #[test]
    fn bad_base_url_fails_validation() {
        let mut config = config_with_secrets();
        config.deepseek.base_url = "api.deepseek.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("base_url"))
        ));
    }

    #[test]
    fn bad_health_host_only_matters_when_enabled() {
        let mut config = config_with_secrets();
        config.health.host = "not a host!".to_string();
        assert!(validate_config(&config).is_err());

        config.health.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn multiple_problems_collect_in_one_pass() {
        let mut config = VezhaConfig::default();
        config.history.capacity = 0;
        config.history.saturation_threshold = 2.0;
        let errors = validate_config(&config).unwrap_err();
        // Two missing secrets plus the two history problems.
        assert_eq!(errors.len(), 4);
    }
}

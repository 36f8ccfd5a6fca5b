// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Vezha moderation bot.
//!
//! TOML files from the XDG hierarchy are layered under `VEZHA_*`
//! environment overrides and deserialized with `deny_unknown_fields`;
//! semantic checks run after parsing. Failures come back as miette
//! diagnostics carrying source spans and typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use vezha_config::load_and_validate;
//!
//! let config = load_and_validate().expect("invalid configuration");
//! println!("history window: {}", config.history.capacity);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{report_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::VezhaConfig;
pub use validation::validate_config;

/// Resolve configuration from the XDG hierarchy and validate it.
///
/// Layers the TOML files and `VEZHA_*` environment variables through
/// figment, then runs the semantic checks. A figment failure is split
/// into miette diagnostics with spans and typo suggestions attached.
///
/// Returns a checked `VezhaConfig`, or every problem found.
pub fn load_and_validate() -> Result<VezhaConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            // Read TOML source files for error source span information.
            let toml_sources = collect_toml_sources();
            Err(diagnostic::errors_from_figment(err, &toml_sources))
        }
    }
}

/// Load configuration from an explicit file path and validate it.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<VezhaConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let mut sources = Vec::new();
            if let Ok(content) = std::fs::read_to_string(path) {
                sources.push((path.display().to_string(), content));
            }
            Err(diagnostic::errors_from_figment(err, &sources))
        }
    }
}

/// Resolve configuration from an inline TOML string and validate it.
///
/// Feeds tests and tools that carry their own TOML.
pub fn load_and_validate_str(toml_content: &str) -> Result<VezhaConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::errors_from_figment(err, &sources))
        }
    }
}

/// Read back the TOML layers so diagnostics can point into them.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();

    // Working-directory layer.
    if let Ok(content) = std::fs::read_to_string("vezha.toml") {
        let path = std::env::current_dir()
            .map(|d| d.join("vezha.toml").display().to_string())
            .unwrap_or_else(|_| "vezha.toml".to_string());
        sources.push((path, content));
    }

    // XDG user layer.
    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("vezha/vezha.toml");
        if let Ok(content) = std::fs::read_to_string(&path) {
            sources.push((path.display().to_string(), content));
        }
    }

    // System layer.
    let system_path = std::path::Path::new("/etc/vezha/vezha.toml");
    if let Ok(content) = std::fs::read_to_string(system_path) {
        sources.push((system_path.display().to_string(), content));
    }

    sources
}

// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vezha config` command implementation.
//!
//! Read-only inspection of the effective configuration after all layers
//! (defaults, config files, environment) have been merged.

use clap::Subcommand;
use vezha_config::VezhaConfig;
use vezha_core::VezhaError;

const REDACTED: &str = "[redacted]";

/// Configuration inspection actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the effective configuration and print a summary.
    Check,
    /// Print the effective configuration as TOML with secrets redacted.
    Show,
}

/// Runs the `vezha config` command.
///
/// The configuration has already been loaded and validated by `main`, so
/// `check` reduces to printing a summary of the values that matter most.
pub fn run_config(action: ConfigAction, config: &VezhaConfig) -> Result<(), VezhaError> {
    match action {
        ConfigAction::Check => run_check(config),
        ConfigAction::Show => run_show(config),
    }
}

fn run_check(config: &VezhaConfig) -> Result<(), VezhaError> {
    println!();
    println!("  vezha config");
    println!("  {}", "-".repeat(40));
    println!();
    println!("    agent.name           {}", config.agent.name);
    println!("    agent.log_level      {}", config.agent.log_level);
    println!(
        "    telegram.bot_token   {}",
        presence(config.telegram.bot_token.as_deref())
    );
    println!(
        "    deepseek.api_key     {}",
        presence(config.deepseek.api_key.as_deref())
    );
    println!("    deepseek.model       {}", config.deepseek.model);
    println!("    history.capacity     {}", config.history.capacity);
    println!(
        "    moderation.lexicon   {}",
        config.moderation.lexicon_path.as_deref().unwrap_or("embedded")
    );
    if config.health.enabled {
        println!(
            "    health endpoint      http://{}:{}/health",
            config.health.host, config.health.port
        );
    } else {
        println!("    health endpoint      disabled");
    }
    println!();
    println!("  Configuration OK.");
    println!();
    Ok(())
}

fn run_show(config: &VezhaConfig) -> Result<(), VezhaError> {
    print!("{}", redacted_toml(config)?);
    Ok(())
}

/// Serializes `config` to TOML with secret fields replaced by a placeholder.
fn redacted_toml(config: &VezhaConfig) -> Result<String, VezhaError> {
    let mut redacted = config.clone();
    if redacted.telegram.bot_token.is_some() {
        redacted.telegram.bot_token = Some(REDACTED.to_string());
    }
    if redacted.deepseek.api_key.is_some() {
        redacted.deepseek.api_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&redacted)
        .map_err(|e| VezhaError::Internal(format!("failed to render configuration: {e}")))
}

fn presence(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "set",
        _ => "not set",
    }
}

// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vezha - a real-time Telegram chat moderator.
//!
//! This is the binary entry point for the Vezha daemon.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod config;
mod serve;

/// Vezha - a real-time Telegram chat moderator.
#[derive(Parser, Debug)]
#[command(name = "vezha", version, about, long_about = None)]
struct Cli {
    /// Configuration file replacing the default search locations.
    /// `VEZHA_*` environment variables still override its values.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the moderation daemon.
    Serve,
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: config::ConfigAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let loaded = match &cli.config {
        Some(path) => vezha_config::load_and_validate_path(path),
        None => vezha_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            vezha_config::report_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Config { action }) => config::run_config(action, &config),
        None => {
            println!("vezha: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Artifact Trust CLI
//!
//! The `trustctl` binary gives operators direct access to the trust core:
//! validating license payloads, issuing and inspecting usage-license
//! tokens, and managing the platform signing key.
//!
//! ## Commands
//!
//! - `trustctl license validate-payload|issue|inspect` - Usage licenses
//! - `trustctl keygen` - Generate an Ed25519 platform key
//! - `trustctl config show|validate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;

use commands::{ConfigCommand, LicenseCommand};

/// Artifact registry trust tooling
#[derive(Parser)]
#[command(name = "trustctl")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "ARTIFACT_TRUST_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "ARTIFACT_TRUST_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Usage-license operations
    #[command(name = "license")]
    License {
        #[command(subcommand)]
        command: LicenseCommand,
    },

    /// Generate an Ed25519 signing key (PKCS#8 PEM)
    #[command(name = "keygen")]
    Keygen {
        /// Write the key to FILE instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::License { command }) => {
            commands::license::handle_command(command, cli.config).await
        }
        Some(Commands::Keygen { output }) => commands::keygen::execute(output),
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config)
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

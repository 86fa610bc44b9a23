// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use artifact_trust_core::domain::trust_config::{TrustConfig, CONFIG_PATH_ENV};
use artifact_trust_core::infrastructure::usage_license::PlatformSigningKey;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration and the signing key it points to
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = TrustConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./artifact-trust.yaml");
        println!("  4. ~/.artifact-trust/config.yaml");
        println!("  5. /etc/artifact-trust/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();
    println!("  Issuer: {}", config.issuer);

    let key_source = match (&config.signing_key_pem, &config.signing_key_path) {
        (Some(_), _) => "inline PEM".to_string(),
        (None, Some(path)) => path.display().to_string(),
        (None, None) => "(none, tokens are unsigned)".to_string(),
    };
    println!("  Signing key: {}", key_source);

    match config.oracle_timeout {
        Some(timeout) => println!("  Oracle timeout: {}ms", timeout.as_millis()),
        None => println!("  Oracle timeout: {}", "(unbounded)".dimmed()),
    }
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = TrustConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    let key = PlatformSigningKey::from_config(&config).context("Signing key is unusable")?;
    if !key.is_configured() {
        println!("{}", "⚠ No signing key configured, usage licenses will be unsigned".yellow());
    }

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

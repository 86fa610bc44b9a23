// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Trust Configuration Types
//
// Defines the configuration schema of the artifact trust subsystem:
// - Issuer identity placed in usage-license tokens
// - Location of the platform Ed25519 signing key (file or inline PEM)
// - Deadline for validity-oracle lookups

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "ARTIFACT_TRUST_CONFIG_PATH";
pub const ISSUER_ENV: &str = "ARTIFACT_TRUST_ISSUER";
pub const PRIVATE_KEY_ENV: &str = "ARTIFACT_TRUST_LICENSE_PRIVATE_KEY";
pub const ORACLE_TIMEOUT_ENV: &str = "ARTIFACT_TRUST_ORACLE_TIMEOUT_MS";

fn default_issuer() -> String {
    "localhost".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Public hostname of the platform, written to the `iss` claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Path to a PKCS#8 PEM Ed25519 private key used to sign usage licenses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_path: Option<PathBuf>,

    /// Inline PKCS#8 PEM key; takes precedence over `signing_key_path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_pem: Option<String>,

    /// Upper bound for a single validity-oracle lookup (e.g. "2s")
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub oracle_timeout: Option<Duration>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            signing_key_path: None,
            signing_key_pem: None,
            oracle_timeout: None,
        }
    }
}

impl TrustConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. ARTIFACT_TRUST_CONFIG_PATH environment variable
    /// 2. ./artifact-trust.yaml (working directory)
    /// 3. ~/.artifact-trust/config.yaml (user home)
    /// 4. /etc/artifact-trust/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./artifact-trust.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".artifact-trust").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/artifact-trust/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?
        } else if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(issuer) = lookup(ISSUER_ENV) {
            tracing::info!("Environment override: {}={}", ISSUER_ENV, issuer);
            self.issuer = issuer;
        }

        if let Some(pem) = lookup(PRIVATE_KEY_ENV) {
            tracing::info!("Environment override: {} is set", PRIVATE_KEY_ENV);
            self.signing_key_pem = Some(pem);
        }

        if let Some(val) = lookup(ORACLE_TIMEOUT_ENV) {
            match val.parse::<u64>() {
                Ok(ms) => {
                    tracing::info!("Environment override: {}={}", ORACLE_TIMEOUT_ENV, ms);
                    self.oracle_timeout = Some(Duration::from_millis(ms));
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for {}: '{}'. Expected milliseconds. Ignoring.",
                        ORACLE_TIMEOUT_ENV,
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.issuer.trim().is_empty() {
            anyhow::bail!("issuer cannot be empty");
        }

        if self.oracle_timeout == Some(Duration::ZERO) {
            anyhow::bail!("oracle_timeout must be greater than zero");
        }

        Ok(())
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Usage-license commands
//!
//! Commands: validate-payload, issue, inspect

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::Colorize;
use serde_json::value::RawValue;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use artifact_trust_core::application::usage_license_service::UsageLicenseService;
use artifact_trust_core::domain::claims::validate_payload;
use artifact_trust_core::domain::principal::{CustomerOrganizationId, OrganizationId};
use artifact_trust_core::domain::trust_config::TrustConfig;
use artifact_trust_core::domain::usage_license::NewUsageLicense;
use artifact_trust_core::infrastructure::repositories::InMemoryUsageLicenseRepository;
use artifact_trust_core::infrastructure::usage_license::{
    decode_unverified, PlatformSigningKey, UsageLicenseTokenIssuer, UsageLicenseTokenVerifier,
};

#[derive(Subcommand)]
pub enum LicenseCommand {
    /// Check a payload against the reserved-claim policy
    ValidatePayload {
        /// JSON object of custom claims
        #[arg(value_name = "JSON")]
        payload: String,
    },

    /// Issue a usage license with the configured signing key
    Issue {
        /// Vendor organization ID
        #[arg(long)]
        org_id: Uuid,

        /// License name
        #[arg(long)]
        name: String,

        /// Optional description
        #[arg(long)]
        description: Option<String>,

        /// JSON object of custom claims
        #[arg(long, value_name = "JSON")]
        payload: String,

        /// Start of validity (RFC 3339)
        #[arg(long, value_name = "TIMESTAMP")]
        not_before: DateTime<Utc>,

        /// End of validity, exclusive (RFC 3339)
        #[arg(long, value_name = "TIMESTAMP")]
        expires_at: DateTime<Utc>,

        /// Target customer organization (default: every customer)
        #[arg(long)]
        customer_org_id: Option<Uuid>,
    },

    /// Decode a token and verify it when it is signed
    Inspect {
        /// Compact JWT
        #[arg(value_name = "TOKEN")]
        token: String,
    },
}

pub async fn handle_command(command: LicenseCommand, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        LicenseCommand::ValidatePayload { payload } => validate(&payload),
        LicenseCommand::Issue {
            org_id,
            name,
            description,
            payload,
            not_before,
            expires_at,
            customer_org_id,
        } => {
            let request = NewUsageLicense {
                name,
                description,
                payload: RawValue::from_string(payload).context("Payload is not valid JSON")?,
                not_before,
                expires_at,
                customer_organization_id: customer_org_id.map(CustomerOrganizationId),
            };
            issue(config_path, OrganizationId(org_id), request).await
        }
        LicenseCommand::Inspect { token } => inspect(config_path, &token),
    }
}

fn validate(payload: &str) -> Result<()> {
    validate_payload(payload).context("Payload rejected")?;
    println!("{}", "✓ Payload is valid".green());
    Ok(())
}

async fn issue(config_path: Option<PathBuf>, org_id: OrganizationId, request: NewUsageLicense) -> Result<()> {
    let config = TrustConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let key = PlatformSigningKey::from_config(&config).context("Failed to load signing key")?;
    if !key.is_configured() {
        eprintln!("{}", "⚠ No signing key configured, the token will be unsigned".yellow());
    }

    let issuer = Arc::new(UsageLicenseTokenIssuer::new(config.issuer, Arc::new(key)));
    let service = UsageLicenseService::new(Arc::new(InMemoryUsageLicenseRepository::new()), issuer);

    let license = service
        .create(org_id, request)
        .await
        .context("Failed to issue usage license")?;

    println!("{}", serde_json::to_string_pretty(&license)?);
    Ok(())
}

fn inspect(config_path: Option<PathBuf>, token: &str) -> Result<()> {
    let decoded = decode_unverified(token).context("Failed to decode token")?;

    let status = if !decoded.signed {
        format!("unsigned (alg: {})", decoded.algorithm).yellow()
    } else {
        let config = TrustConfig::load_or_default(config_path).context("Failed to load configuration")?;
        let key = PlatformSigningKey::from_config(&config).context("Failed to load signing key")?;
        match key.verifying_key() {
            Some(verifying_key) => {
                let verifier = UsageLicenseTokenVerifier::new(&verifying_key, &config.issuer)?;
                verifier.verify(token).context("Token verification failed")?;
                format!("signed (alg: {}), verified", decoded.algorithm).green()
            }
            None => format!("signed (alg: {}), not verified: no key configured", decoded.algorithm).yellow(),
        }
    };

    println!("{} {}", "Status:".bold(), status);
    println!("{}", serde_json::to_string_pretty(&decoded.claims)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_plain_object() {
        assert!(validate(r#"{"seats": 3}"#).is_ok());
    }

    #[test]
    fn test_validate_rejects_reserved_claim() {
        let err = validate(r#"{"iss": "me"}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("iss"));
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        assert!(inspect(None, "not-a-token").is_err());
    }
}

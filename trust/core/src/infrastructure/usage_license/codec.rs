// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Usage-License Token Codec
//!
//! Turns a [`UsageLicense`] into a compact JWT.
//!
//! ## Claims
//!
//! | Claim | Source |
//! |-------|--------|
//! | `iss` | platform issuer (public hostname) |
//! | `sub` | license id |
//! | `aud` | `["usage-license"]` |
//! | `iat` | issuance time |
//! | `jti` | fresh UUID per token |
//! | `nbf` / `exp` | license validity window |
//! | everything else | license payload, reserved names dropped |
//!
//! With a platform key the token is signed with EdDSA (Ed25519). Without one
//! the header declares `alg: none` and the signature segment is empty, so a
//! verifier can tell "unsigned by configuration" from "signature stripped".

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{encode, Algorithm, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::domain::claims::{ClaimPolicyError, CustomClaims};
use crate::domain::usage_license::UsageLicense;
use crate::infrastructure::usage_license::signing_key::PlatformSigningKey;

/// Audience of every usage-license token.
pub const USAGE_LICENSE_AUDIENCE: &str = "usage-license";

/// Header algorithm of tokens issued without a platform key.
pub const UNSIGNED_ALGORITHM: &str = "none";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("signing key error: {0}")]
    SigningKey(String),

    #[error("could not encode token: {0}")]
    Encoding(String),
}

impl From<ClaimPolicyError> for CodecError {
    fn from(err: ClaimPolicyError) -> Self {
        CodecError::InvalidPayload(err.to_string())
    }
}

/// Represents the JWT `aud` claim, which may be either a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AudienceClaim {
    Single(String),
    Multiple(Vec<String>),
}

impl AudienceClaim {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::Single(aud) => aud == audience,
            Self::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Claim set of a usage-license token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLicenseClaims {
    pub iss: String,
    pub sub: String,
    pub aud: AudienceClaim,
    pub iat: i64,
    pub jti: String,
    pub nbf: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub custom: CustomClaims,
}

#[derive(Serialize)]
struct UnsignedHeader<'a> {
    alg: &'a str,
    typ: &'a str,
}

/// Build and sign (or explicitly leave unsigned) the token for `license`.
///
/// Reserved keys in the payload are dropped here even though issuance
/// validates the payload first.
pub fn generate_token(
    license: &UsageLicense,
    issuer: &str,
    key: &PlatformSigningKey,
) -> Result<String, CodecError> {
    let custom = CustomClaims::from_json(license.payload.get())?.sanitized();

    let claims = UsageLicenseClaims {
        iss: issuer.to_string(),
        sub: license.id.to_string(),
        aud: AudienceClaim::Multiple(vec![USAGE_LICENSE_AUDIENCE.to_string()]),
        iat: Utc::now().timestamp(),
        jti: Uuid::new_v4().to_string(),
        nbf: license.not_before.timestamp(),
        exp: license.expires_at.timestamp(),
        custom,
    };

    let token = match key {
        PlatformSigningKey::Ed25519(key) => {
            encode(&Header::new(Algorithm::EdDSA), &claims, key.encoding_key()).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidKeyFormat => CodecError::SigningKey(e.to_string()),
                    _ => CodecError::Encoding(e.to_string()),
                }
            })?
        }
        PlatformSigningKey::Unconfigured => encode_unsigned(&claims)?,
    };

    info!(
        license_id = %license.id,
        jti = %claims.jti,
        signed = key.is_configured(),
        "Issued usage license token"
    );
    metrics::counter!(
        "artifact_trust_license_tokens_issued_total",
        "signed" => if key.is_configured() { "true" } else { "false" }
    )
    .increment(1);

    Ok(token)
}

fn encode_unsigned(claims: &UsageLicenseClaims) -> Result<String, CodecError> {
    let header = serde_json::to_vec(&UnsignedHeader {
        alg: UNSIGNED_ALGORITHM,
        typ: "JWT",
    })
    .map_err(|e| CodecError::Encoding(e.to_string()))?;
    let body = serde_json::to_vec(claims).map_err(|e| CodecError::Encoding(e.to_string()))?;

    Ok(format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(body)
    ))
}

/// Issues tokens for one platform identity with the platform key.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct UsageLicenseTokenIssuer {
    issuer: String,
    key: Arc<PlatformSigningKey>,
}

impl UsageLicenseTokenIssuer {
    pub fn new(issuer: impl Into<String>, key: Arc<PlatformSigningKey>) -> Self {
        Self {
            issuer: issuer.into(),
            key,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn signing_key(&self) -> &PlatformSigningKey {
        &self.key
    }

    pub fn issue(&self, license: &UsageLicense) -> Result<String, CodecError> {
        generate_token(license, &self.issuer, &self.key)
    }
}

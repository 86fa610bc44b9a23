// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ed25519_dalek::VerifyingKey;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::infrastructure::usage_license::codec::{
    UsageLicenseClaims, UNSIGNED_ALGORITHM, USAGE_LICENSE_AUDIENCE,
};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token is unsigned")]
    Unsigned,

    #[error("invalid verification key: {0}")]
    InvalidKey(String),

    #[error("token rejected: {0}")]
    Rejected(#[from] jsonwebtoken::errors::Error),
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Claims of a token read without checking its signature.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub algorithm: String,
    pub signed: bool,
    pub claims: UsageLicenseClaims,
}

/// Split a compact token and decode header and claims. Performs no
/// signature, issuer or time checks.
pub fn decode_unverified(token: &str) -> Result<DecodedToken, VerifyError> {
    let mut segments = token.trim().split('.');
    let (Some(header), Some(body), Some(signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(VerifyError::Malformed("expected three dot-separated segments".to_string()));
    };

    let header: RawHeader = decode_segment(header, "header")?;
    let claims: UsageLicenseClaims = decode_segment(body, "claims")?;

    Ok(DecodedToken {
        signed: header.alg != UNSIGNED_ALGORITHM && !signature.is_empty(),
        algorithm: header.alg,
        claims,
    })
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> Result<T, VerifyError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| VerifyError::Malformed(format!("{} is not base64url: {}", what, e)))?;
    serde_json::from_slice(&bytes).map_err(|e| VerifyError::Malformed(format!("{} is not valid JSON: {}", what, e)))
}

/// Verifies signed usage-license tokens against the platform public key.
pub struct UsageLicenseTokenVerifier {
    decoding_key: DecodingKey,
    expected_issuer: String,
}

impl UsageLicenseTokenVerifier {
    pub fn new(verifying_key: &VerifyingKey, expected_issuer: &str) -> Result<Self, VerifyError> {
        if expected_issuer.is_empty() {
            return Err(VerifyError::InvalidKey("expected_issuer must not be empty".to_string()));
        }
        let x = URL_SAFE_NO_PAD.encode(verifying_key.as_bytes());
        let decoding_key = DecodingKey::from_ed_components(&x)
            .map_err(|e| VerifyError::InvalidKey(e.to_string()))?;
        Ok(Self {
            decoding_key,
            expected_issuer: expected_issuer.to_string(),
        })
    }

    /// Check signature, issuer, audience and the `nbf`/`exp` window.
    /// `alg: none` tokens are refused before any cryptographic work.
    pub fn verify(&self, token: &str) -> Result<TokenData<UsageLicenseClaims>, VerifyError> {
        let decoded = decode_unverified(token)?;
        if !decoded.signed {
            return Err(VerifyError::Unsigned);
        }

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.expected_issuer]);
        validation.set_audience(&[USAGE_LICENSE_AUDIENCE]);

        Ok(decode::<UsageLicenseClaims>(token.trim(), &self.decoding_key, &validation)?)
    }
}

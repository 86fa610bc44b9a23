// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Platform signing key for usage-license tokens.
//!
//! Loaded once at startup and never mutated afterwards, so a single
//! `Arc<PlatformSigningKey>` can be shared by every request handler.
//! When no key is configured the platform issues explicitly unsigned tokens.

use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use jsonwebtoken::EncodingKey;
use std::path::Path;

use crate::domain::trust_config::TrustConfig;
use crate::infrastructure::usage_license::codec::CodecError;

/// Ed25519 key pair with its pre-built JWT encoding key.
#[derive(Clone)]
pub struct Ed25519LicenseKey {
    signing_key: SigningKey,
    encoding_key: EncodingKey,
}

impl Ed25519LicenseKey {
    pub fn from_signing_key(signing_key: SigningKey) -> Result<Self, CodecError> {
        let der = signing_key
            .to_pkcs8_der()
            .map_err(|e| CodecError::SigningKey(format!("could not encode private key: {}", e)))?;
        let encoding_key = EncodingKey::from_ed_der(der.as_bytes());
        Ok(Self {
            signing_key,
            encoding_key,
        })
    }

    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, CodecError> {
        let signing_key = SigningKey::from_pkcs8_pem(pem.trim())
            .map_err(|e| CodecError::SigningKey(format!("could not parse Ed25519 private key: {}", e)))?;
        Self::from_signing_key(signing_key)
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn to_pkcs8_pem(&self) -> Result<String, CodecError> {
        self.signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.as_str().to_owned())
            .map_err(|e| CodecError::SigningKey(format!("could not encode private key: {}", e)))
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

impl std::fmt::Debug for Ed25519LicenseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519LicenseKey")
            .field("verifying_key", &self.verifying_key())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum PlatformSigningKey {
    Ed25519(Ed25519LicenseKey),
    /// No key configured: tokens are issued with `alg: none`.
    Unconfigured,
}

impl PlatformSigningKey {
    /// Resolve the key from configuration. Inline PEM wins over a key file.
    pub fn from_config(config: &TrustConfig) -> Result<Self, CodecError> {
        if let Some(pem) = &config.signing_key_pem {
            return Ed25519LicenseKey::from_pkcs8_pem(pem).map(Self::Ed25519);
        }
        if let Some(path) = &config.signing_key_path {
            return Self::from_pem_file(path);
        }
        tracing::warn!("No usage-license signing key configured; tokens will be issued unsigned");
        Ok(Self::Unconfigured)
    }

    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|e| {
            CodecError::SigningKey(format!("could not read {}: {}", path.display(), e))
        })?;
        Ed25519LicenseKey::from_pkcs8_pem(&pem).map(Self::Ed25519)
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Ed25519(_))
    }

    pub fn verifying_key(&self) -> Option<VerifyingKey> {
        match self {
            Self::Ed25519(key) => Some(key.verifying_key()),
            Self::Unconfigured => None,
        }
    }
}

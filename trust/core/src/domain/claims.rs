// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Usage-License Claim Policy
//!
//! The registered JWT claim names (`exp`, `nbf`, `iss`, `sub`, `aud`, `iat`,
//! `jti`) are populated only by the token codec from trusted inputs. A
//! license payload supplied by an operator may add any other top-level claim
//! but never one of these.
//!
//! | Function | Used by |
//! |----------|---------|
//! | [`validate_payload`] | the issuance flow, before a license is persisted |
//! | [`CustomClaims::sanitized`] | the token codec, which silently drops reserved keys |

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Claim names owned by the token codec.
pub const RESERVED_CLAIMS: [&str; 7] = ["exp", "nbf", "iss", "sub", "aud", "iat", "jti"];

pub fn is_reserved_claim(name: &str) -> bool {
    RESERVED_CLAIMS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimPolicyError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("payload must not contain registered JWT claim '{0}'")]
    ReservedClaim(String),
}

/// Check that `payload` is a JSON object without any reserved top-level key.
pub fn validate_payload(payload: &str) -> Result<(), ClaimPolicyError> {
    let claims = CustomClaims::from_json(payload)?;
    let reserved = claims
        .iter()
        .find(|(name, _)| is_reserved_claim(name))
        .map(|(name, _)| name.clone());
    match reserved {
        Some(name) => Err(ClaimPolicyError::ReservedClaim(name)),
        None => Ok(()),
    }
}

/// Ordered set of custom token claims.
///
/// Keeps the order in which keys appeared in the license payload. A key that
/// appears twice keeps its first position and its last value, matching how
/// JSON decoders resolve duplicate keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomClaims(Vec<(String, Value)>);

impl CustomClaims {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Decode a license payload. Anything but a JSON object is rejected.
    pub fn from_json(payload: &str) -> Result<Self, ClaimPolicyError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| ClaimPolicyError::InvalidPayload(format!("invalid JSON: {}", e)))?;
        if !value.is_object() {
            return Err(ClaimPolicyError::InvalidPayload(
                "payload must be a JSON object".to_string(),
            ));
        }
        serde_json::from_str(payload)
            .map_err(|e| ClaimPolicyError::InvalidPayload(format!("invalid JSON: {}", e)))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Copy of these claims with every reserved key removed.
    pub fn sanitized(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(name, _)| !is_reserved_claim(name))
                .cloned()
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CustomClaims {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CustomClaims {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ClaimsVisitor;

        impl<'de> Visitor<'de> for ClaimsVisitor {
            type Value = CustomClaims;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON object of claims")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut claims = CustomClaims::new();
                while let Some((name, value)) = access.next_entry::<String, Value>()? {
                    claims.insert(name, value);
                }
                Ok(claims)
            }
        }

        deserializer.deserialize_map(ClaimsVisitor)
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Usage License Aggregate
//!
//! A usage license is a signed, time-bounded grant that a vendor issues to a
//! customer organization (or to every customer of the vendor when
//! `customer_organization_id` is `None`).
//!
//! ## Lifecycle
//!
//! ```text
//! UsageLicense::new(..)        token == ""   (payload validated, window checked)
//!   └─ repository.create()
//!   └─ codec.generate_token()  token fixed to {id, nbf, exp, iss, payload}
//!   └─ repository.update_token()
//!        └─ update_metadata()  name/description only, token untouched
//!        └─ delete()           the only revocation
//! ```
//!
//! There is no revoked state. Because an issued token can outlive its
//! record, the validity oracle always re-checks persisted state instead of
//! trusting a signature alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::claims::{validate_payload, ClaimPolicyError};
use crate::domain::principal::{CustomerOrganizationId, OrganizationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsageLicenseId(pub Uuid);

impl UsageLicenseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UsageLicenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UsageLicenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation failures for a license before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageLicenseValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("expiresAt must be after notBefore")]
    InvalidWindow,

    #[error(transparent)]
    Payload(#[from] ClaimPolicyError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLicense {
    pub id: UsageLicenseId,
    pub created_at: DateTime<Utc>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Custom claims requested by the issuer, kept verbatim.
    pub payload: Box<RawValue>,
    /// Serialized credential; empty until issuance completes.
    #[serde(default)]
    pub token: String,
    pub not_before: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub organization_id: OrganizationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_organization_id: Option<CustomerOrganizationId>,
}

/// Parameters an operator supplies to create a license.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUsageLicense {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub payload: Box<RawValue>,
    pub not_before: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_organization_id: Option<CustomerOrganizationId>,
}

impl NewUsageLicense {
    /// Pre-issuance gate: a license failing this check must never reach the codec.
    pub fn validate(&self) -> Result<(), UsageLicenseValidationError> {
        if self.name.trim().is_empty() {
            return Err(UsageLicenseValidationError::EmptyName);
        }
        // tokens carry whole seconds
        if self.expires_at.timestamp() <= self.not_before.timestamp() {
            return Err(UsageLicenseValidationError::InvalidWindow);
        }
        validate_payload(self.payload.get())?;
        Ok(())
    }
}

impl UsageLicense {
    /// Build an unissued license (empty token) owned by `organization_id`.
    pub fn new(
        organization_id: OrganizationId,
        request: NewUsageLicense,
    ) -> Result<Self, UsageLicenseValidationError> {
        request.validate()?;
        Ok(Self {
            id: UsageLicenseId::new(),
            created_at: Utc::now(),
            name: request.name,
            description: request.description,
            payload: request.payload,
            token: String::new(),
            not_before: request.not_before,
            expires_at: request.expires_at,
            organization_id,
            customer_organization_id: request.customer_organization_id,
        })
    }

    pub fn is_issued(&self) -> bool {
        !self.token.is_empty()
    }

    /// `true` when `at` falls inside `[not_before, expires_at)`.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at < self.expires_at
    }

    /// Whether this license grants anything to `customer`. Org-wide licenses
    /// (no customer) cover every customer of the issuing vendor.
    pub fn covers_customer(&self, customer: CustomerOrganizationId) -> bool {
        self.customer_organization_id
            .map_or(true, |target| target == customer)
    }

    pub fn update_metadata(&mut self, name: String, description: Option<String>) {
        self.name = name;
        self.description = description;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn request(payload: &str, not_before: DateTime<Utc>, expires_at: DateTime<Utc>) -> NewUsageLicense {
        NewUsageLicense {
            name: "gold".to_string(),
            description: None,
            payload: RawValue::from_string(payload.to_string()).unwrap(),
            not_before,
            expires_at,
            customer_organization_id: None,
        }
    }

    #[test]
    fn test_new_license_starts_unissued() {
        let now = Utc::now();
        let license = UsageLicense::new(
            OrganizationId::new(),
            request(r#"{"seats": 5}"#, now, now + Duration::days(30)),
        )
        .unwrap();
        assert!(!license.is_issued());
        assert!(license.is_valid_at(now));
        assert!(!license.is_valid_at(now + Duration::days(30)));
    }

    #[test]
    fn test_rejects_empty_window() {
        let now = Utc::now();
        let err = UsageLicense::new(OrganizationId::new(), request("{}", now, now)).unwrap_err();
        assert_eq!(err, UsageLicenseValidationError::InvalidWindow);

        let err = UsageLicense::new(
            OrganizationId::new(),
            request("{}", now, now - Duration::seconds(1)),
        )
        .unwrap_err();
        assert_eq!(err, UsageLicenseValidationError::InvalidWindow);
    }

    #[test]
    fn test_rejects_window_shorter_than_a_second() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let err = request(
            "{}",
            base + Duration::milliseconds(100),
            base + Duration::milliseconds(900),
        )
        .validate()
        .unwrap_err();
        assert_eq!(err, UsageLicenseValidationError::InvalidWindow);

        assert!(request("{}", base + Duration::milliseconds(900), base + Duration::milliseconds(1100))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_rejects_reserved_payload() {
        let now = Utc::now();
        let err = UsageLicense::new(
            OrganizationId::new(),
            request(r#"{"exp": 1}"#, now, now + Duration::hours(1)),
        )
        .unwrap_err();
        assert_eq!(
            err,
            UsageLicenseValidationError::Payload(ClaimPolicyError::ReservedClaim("exp".to_string()))
        );
    }

    #[test]
    fn test_rejects_blank_name() {
        let now = Utc::now();
        let mut req = request("{}", now, now + Duration::hours(1));
        req.name = "  ".to_string();
        assert_eq!(req.validate(), Err(UsageLicenseValidationError::EmptyName));
    }

    #[test]
    fn test_covers_customer() {
        let now = Utc::now();
        let customer = CustomerOrganizationId::new();
        let mut license = UsageLicense::new(
            OrganizationId::new(),
            request("{}", now, now + Duration::hours(1)),
        )
        .unwrap();
        assert!(license.covers_customer(customer));

        license.customer_organization_id = Some(CustomerOrganizationId::new());
        assert!(!license.covers_customer(customer));
    }
}

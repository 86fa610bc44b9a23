// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # License Validity Oracle Port
//!
//! Answers "does a currently valid usage license entitle this customer to
//! this artifact reference / blob right now?". The authorizer consults it
//! on the read path for customer principals of organizations with the
//! licensing feature enabled.
//!
//! Implementations must distinguish a policy answer ([`OracleError::Forbidden`])
//! from a lookup failure; the authorizer turns only the former into a denial.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::principal::{CustomerOrganizationId, OrganizationId};
use crate::domain::usage_license::UsageLicenseId;

#[derive(Debug, Error)]
pub enum OracleError {
    /// No valid license covers the requested resource.
    #[error("no valid license covers the requested resource")]
    Forbidden,

    /// The lookup did not finish before the caller's deadline.
    #[error("license lookup timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The backing store failed.
    #[error("license lookup failed: {0}")]
    Lookup(String),
}

impl OracleError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden)
    }
}

#[async_trait]
pub trait LicenseValidityOracle: Send + Sync {
    /// Check a license for `<org_name>/<artifact_name>` at `reference` (tag or digest).
    async fn check_license_for_artifact(
        &self,
        org_name: &str,
        artifact_name: &str,
        reference: &str,
        customer_org_id: CustomerOrganizationId,
        org_id: OrganizationId,
    ) -> Result<(), OracleError>;

    /// Check a license for the blob identified by `digest`.
    async fn check_license_for_artifact_blob(
        &self,
        digest: &str,
        customer_org_id: CustomerOrganizationId,
        org_id: OrganizationId,
    ) -> Result<(), OracleError>;
}

/// Notified after a usage license has been deleted.
pub trait LicenseRevocationListener: Send + Sync {
    fn license_deleted(&self, license_id: UsageLicenseId);
}

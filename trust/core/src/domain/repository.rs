// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contract for the [`UsageLicense`] aggregate, following the DDD
//! Repository pattern: the interface lives in the domain layer and is
//! implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `UsageLicenseRepository` | `UsageLicense` | `InMemoryUsageLicenseRepository` |
//!
//! License names are unique per owning organization; implementations report
//! a collision as [`RepositoryError::Conflict`].

use async_trait::async_trait;

use crate::domain::principal::{CustomerOrganizationId, OrganizationId};
use crate::domain::usage_license::{UsageLicense, UsageLicenseId};

/// Repository interface for UsageLicense aggregates
#[async_trait]
pub trait UsageLicenseRepository: Send + Sync {
    /// Insert a new license. Fails with `Conflict` when the name is taken
    /// within the owning organization.
    async fn create(&self, license: &UsageLicense) -> Result<(), RepositoryError>;

    /// Find license by ID
    async fn find_by_id(&self, id: UsageLicenseId) -> Result<Option<UsageLicense>, RepositoryError>;

    /// All licenses issued by a vendor, ordered by name
    async fn list_by_organization(
        &self,
        org_id: OrganizationId,
    ) -> Result<Vec<UsageLicense>, RepositoryError>;

    /// Licenses issued by a vendor to one customer, ordered by name
    async fn list_by_customer(
        &self,
        org_id: OrganizationId,
        customer_org_id: CustomerOrganizationId,
    ) -> Result<Vec<UsageLicense>, RepositoryError>;

    /// Store the issued token of a license
    async fn update_token(&self, id: UsageLicenseId, token: &str) -> Result<(), RepositoryError>;

    /// Change name and description, leaving the token untouched
    async fn update_metadata(
        &self,
        id: UsageLicenseId,
        name: &str,
        description: Option<&str>,
    ) -> Result<UsageLicense, RepositoryError>;

    /// Delete license by ID
    async fn delete(&self, id: UsageLicenseId) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

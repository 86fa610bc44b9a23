// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Usage License Service
//!
//! Operator-facing lifecycle of usage licenses: create (with token
//! issuance), rename, delete and list. Every operation is scoped to the
//! calling vendor organization; a license owned by anyone else is reported
//! as not found.

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::license_oracle::LicenseRevocationListener;
use crate::domain::principal::{CustomerOrganizationId, OrganizationId};
use crate::domain::repository::{RepositoryError, UsageLicenseRepository};
use crate::domain::usage_license::{
    NewUsageLicense, UsageLicense, UsageLicenseId, UsageLicenseValidationError,
};
use crate::infrastructure::usage_license::{CodecError, UsageLicenseTokenIssuer};

#[derive(Debug, Error)]
pub enum UsageLicenseError {
    #[error("invalid license: {0}")]
    Validation(#[from] UsageLicenseValidationError),

    #[error("token generation failed: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("usage license not found: {0}")]
    NotFound(UsageLicenseId),
}

pub struct UsageLicenseService {
    repository: Arc<dyn UsageLicenseRepository>,
    issuer: Arc<UsageLicenseTokenIssuer>,
    revocation_listeners: Vec<Arc<dyn LicenseRevocationListener>>,
}

impl UsageLicenseService {
    pub fn new(repository: Arc<dyn UsageLicenseRepository>, issuer: Arc<UsageLicenseTokenIssuer>) -> Self {
        Self {
            repository,
            issuer,
            revocation_listeners: Vec::new(),
        }
    }

    /// Notify `listener` after every successful delete.
    pub fn with_revocation_listener(mut self, listener: Arc<dyn LicenseRevocationListener>) -> Self {
        self.revocation_listeners.push(listener);
        self
    }

    /// Validate, persist and issue. The record is removed again when the
    /// token cannot be generated or stored.
    pub async fn create(
        &self,
        org_id: OrganizationId,
        request: NewUsageLicense,
    ) -> Result<UsageLicense, UsageLicenseError> {
        let mut license = UsageLicense::new(org_id, request)?;
        self.repository.create(&license).await?;

        let issued = match self.issuer.issue(&license) {
            Ok(token) => self
                .repository
                .update_token(license.id, &token)
                .await
                .map(|_| token)
                .map_err(UsageLicenseError::from),
            Err(e) => Err(e.into()),
        };

        match issued {
            Ok(token) => {
                license.token = token;
                info!(
                    license_id = %license.id,
                    org_id = %org_id,
                    name = %license.name,
                    "Created usage license"
                );
                Ok(license)
            }
            Err(e) => {
                error!(license_id = %license.id, error = %e, "Usage license issuance failed, rolling back");
                if let Err(rollback) = self.repository.delete(license.id).await {
                    error!(license_id = %license.id, error = %rollback, "Failed to remove partially created usage license");
                }
                Err(e)
            }
        }
    }

    pub async fn get(
        &self,
        org_id: OrganizationId,
        id: UsageLicenseId,
    ) -> Result<UsageLicense, UsageLicenseError> {
        self.repository
            .find_by_id(id)
            .await?
            .filter(|l| l.organization_id == org_id)
            .ok_or(UsageLicenseError::NotFound(id))
    }

    /// Rename or re-describe a license. The issued token is not touched.
    pub async fn update_metadata(
        &self,
        org_id: OrganizationId,
        id: UsageLicenseId,
        name: &str,
        description: Option<&str>,
    ) -> Result<UsageLicense, UsageLicenseError> {
        if name.trim().is_empty() {
            return Err(UsageLicenseValidationError::EmptyName.into());
        }
        self.get(org_id, id).await?;
        let updated = self.repository.update_metadata(id, name, description).await?;
        info!(license_id = %id, name, "Updated usage license metadata");
        Ok(updated)
    }

    pub async fn delete(&self, org_id: OrganizationId, id: UsageLicenseId) -> Result<(), UsageLicenseError> {
        self.get(org_id, id).await?;
        self.repository.delete(id).await?;
        for listener in &self.revocation_listeners {
            listener.license_deleted(id);
        }
        info!(license_id = %id, org_id = %org_id, "Deleted usage license");
        Ok(())
    }

    pub async fn list_for_vendor(&self, org_id: OrganizationId) -> Result<Vec<UsageLicense>, UsageLicenseError> {
        Ok(self.repository.list_by_organization(org_id).await?)
    }

    pub async fn list_for_customer(
        &self,
        org_id: OrganizationId,
        customer_org_id: CustomerOrganizationId,
    ) -> Result<Vec<UsageLicense>, UsageLicenseError> {
        Ok(self.repository.list_by_customer(org_id, customer_org_id).await?)
    }
}

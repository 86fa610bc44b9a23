// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository abstractions defined in
//! the domain layer, following the Repository pattern from DDD.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve [`UsageLicense`] aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **InMemoryUsageLicenseRepository** - Thread-safe HashMap-backed storage
//!   for tests, the CLI and single-process deployments
//!
//! A database adapter implements the same trait out of tree.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::principal::{CustomerOrganizationId, OrganizationId};
use crate::domain::repository::{RepositoryError, UsageLicenseRepository};
use crate::domain::usage_license::{UsageLicense, UsageLicenseId};

#[derive(Clone, Default)]
pub struct InMemoryUsageLicenseRepository {
    licenses: Arc<RwLock<HashMap<UsageLicenseId, UsageLicense>>>,
}

impl InMemoryUsageLicenseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn name_taken(
        licenses: &HashMap<UsageLicenseId, UsageLicense>,
        org_id: OrganizationId,
        name: &str,
        except: Option<UsageLicenseId>,
    ) -> bool {
        licenses.values().any(|l| {
            l.organization_id == org_id && l.name == name && Some(l.id) != except
        })
    }

    fn sorted_by_name(mut licenses: Vec<UsageLicense>) -> Vec<UsageLicense> {
        licenses.sort_by(|a, b| a.name.cmp(&b.name));
        licenses
    }
}

#[async_trait]
impl UsageLicenseRepository for InMemoryUsageLicenseRepository {
    async fn create(&self, license: &UsageLicense) -> Result<(), RepositoryError> {
        let mut licenses = self.licenses.write();
        if licenses.contains_key(&license.id) {
            return Err(RepositoryError::Conflict(format!("license {} already exists", license.id)));
        }
        if Self::name_taken(&licenses, license.organization_id, &license.name, None) {
            return Err(RepositoryError::Conflict(format!(
                "license name '{}' is already used",
                license.name
            )));
        }
        licenses.insert(license.id, license.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UsageLicenseId) -> Result<Option<UsageLicense>, RepositoryError> {
        Ok(self.licenses.read().get(&id).cloned())
    }

    async fn list_by_organization(
        &self,
        org_id: OrganizationId,
    ) -> Result<Vec<UsageLicense>, RepositoryError> {
        let licenses = self.licenses.read();
        Ok(Self::sorted_by_name(
            licenses
                .values()
                .filter(|l| l.organization_id == org_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_by_customer(
        &self,
        org_id: OrganizationId,
        customer_org_id: CustomerOrganizationId,
    ) -> Result<Vec<UsageLicense>, RepositoryError> {
        let licenses = self.licenses.read();
        Ok(Self::sorted_by_name(
            licenses
                .values()
                .filter(|l| {
                    l.organization_id == org_id && l.customer_organization_id == Some(customer_org_id)
                })
                .cloned()
                .collect(),
        ))
    }

    async fn update_token(&self, id: UsageLicenseId, token: &str) -> Result<(), RepositoryError> {
        let mut licenses = self.licenses.write();
        let license = licenses
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("license {}", id)))?;
        license.token = token.to_string();
        Ok(())
    }

    async fn update_metadata(
        &self,
        id: UsageLicenseId,
        name: &str,
        description: Option<&str>,
    ) -> Result<UsageLicense, RepositoryError> {
        let mut licenses = self.licenses.write();
        let org_id = licenses
            .get(&id)
            .map(|l| l.organization_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("license {}", id)))?;
        if Self::name_taken(&licenses, org_id, name, Some(id)) {
            return Err(RepositoryError::Conflict(format!("license name '{}' is already used", name)));
        }

        let license = licenses
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("license {}", id)))?;
        license.update_metadata(name.to_string(), description.map(str::to_string));
        Ok(license.clone())
    }

    async fn delete(&self, id: UsageLicenseId) -> Result<(), RepositoryError> {
        self.licenses
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("license {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::usage_license::NewUsageLicense;
    use chrono::{Duration, Utc};
    use serde_json::value::RawValue;

    fn license(org_id: OrganizationId, name: &str, customer: Option<CustomerOrganizationId>) -> UsageLicense {
        let now = Utc::now();
        UsageLicense::new(
            org_id,
            NewUsageLicense {
                name: name.to_string(),
                description: None,
                payload: RawValue::from_string("{}".to_string()).unwrap(),
                not_before: now,
                expires_at: now + Duration::days(1),
                customer_organization_id: customer,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_names_are_unique_per_organization() {
        let repo = InMemoryUsageLicenseRepository::new();
        let org = OrganizationId::new();
        repo.create(&license(org, "gold", None)).await.unwrap();

        assert!(matches!(
            repo.create(&license(org, "gold", None)).await,
            Err(RepositoryError::Conflict(_))
        ));
        repo.create(&license(OrganizationId::new(), "gold", None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_lists_are_scoped_and_sorted() {
        let repo = InMemoryUsageLicenseRepository::new();
        let org = OrganizationId::new();
        let customer = CustomerOrganizationId::new();
        repo.create(&license(org, "silver", Some(customer))).await.unwrap();
        repo.create(&license(org, "bronze", Some(customer))).await.unwrap();
        repo.create(&license(org, "gold", None)).await.unwrap();
        repo.create(&license(OrganizationId::new(), "alpha", Some(customer))).await.unwrap();

        let names: Vec<_> = repo
            .list_by_organization(org)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["bronze", "gold", "silver"]);

        let names: Vec<_> = repo
            .list_by_customer(org, customer)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["bronze", "silver"]);
    }

    #[tokio::test]
    async fn test_update_metadata_keeps_token() {
        let repo = InMemoryUsageLicenseRepository::new();
        let org = OrganizationId::new();
        let original = license(org, "gold", None);
        repo.create(&original).await.unwrap();
        repo.update_token(original.id, "header.claims.sig").await.unwrap();

        let updated = repo
            .update_metadata(original.id, "platinum", Some("renamed"))
            .await
            .unwrap();
        assert_eq!(updated.name, "platinum");
        assert_eq!(updated.description.as_deref(), Some("renamed"));
        assert_eq!(updated.token, "header.claims.sig");
    }

    #[tokio::test]
    async fn test_update_metadata_rejects_taken_name() {
        let repo = InMemoryUsageLicenseRepository::new();
        let org = OrganizationId::new();
        let gold = license(org, "gold", None);
        repo.create(&gold).await.unwrap();
        repo.create(&license(org, "silver", None)).await.unwrap();

        assert!(matches!(
            repo.update_metadata(gold.id, "silver", None).await,
            Err(RepositoryError::Conflict(_))
        ));
        // renaming to its own name is fine
        repo.update_metadata(gold.id, "gold", Some("same")).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let repo = InMemoryUsageLicenseRepository::new();
        assert!(matches!(
            repo.delete(UsageLicenseId::new()).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository-backed [`LicenseValidityOracle`].
//!
//! Answers from persisted license state on every call, so deleting a
//! license revokes access immediately even while its token is unexpired.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::license_oracle::{LicenseRevocationListener, LicenseValidityOracle, OracleError};
use crate::domain::principal::{CustomerOrganizationId, OrganizationId};
use crate::domain::repository::UsageLicenseRepository;
use crate::domain::usage_license::{UsageLicense, UsageLicenseId};

/// Artifact unlocked by a license. Empty `references` cover every tag of
/// the artifact. Blobs are content-addressed and cannot be traced back to an
/// artifact, so only the listed `digests` are covered; none when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactEntitlement {
    pub org_name: String,
    pub artifact_name: String,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub digests: Vec<String>,
}

impl ArtifactEntitlement {
    pub fn new(org_name: impl Into<String>, artifact_name: impl Into<String>) -> Self {
        Self {
            org_name: org_name.into(),
            artifact_name: artifact_name.into(),
            references: Vec::new(),
            digests: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_digests(mut self, digests: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.digests = digests.into_iter().map(Into::into).collect();
        self
    }

    fn covers_reference(&self, org_name: &str, artifact_name: &str, reference: &str) -> bool {
        self.org_name == org_name
            && self.artifact_name == artifact_name
            && (self.references.is_empty() || self.references.iter().any(|r| r == reference))
    }

    fn covers_digest(&self, digest: &str) -> bool {
        self.digests.iter().any(|d| d == digest)
    }
}

pub struct RepositoryLicenseOracle {
    repository: Arc<dyn UsageLicenseRepository>,
    entitlements: RwLock<HashMap<UsageLicenseId, Vec<ArtifactEntitlement>>>,
}

impl RepositoryLicenseOracle {
    pub fn new(repository: Arc<dyn UsageLicenseRepository>) -> Self {
        Self {
            repository,
            entitlements: RwLock::new(HashMap::new()),
        }
    }

    pub fn grant(&self, license_id: UsageLicenseId, entitlement: ArtifactEntitlement) {
        self.entitlements.write().entry(license_id).or_default().push(entitlement);
    }

    /// Drop every entitlement of a license.
    pub fn revoke(&self, license_id: UsageLicenseId) {
        self.entitlements.write().remove(&license_id);
    }

    /// Drop entitlements of licenses that no longer exist. Returns how many
    /// licenses were pruned.
    pub async fn prune(&self) -> Result<usize, OracleError> {
        let granted: Vec<UsageLicenseId> = self.entitlements.read().keys().copied().collect();
        let mut stale = Vec::new();
        for id in granted {
            let found = self
                .repository
                .find_by_id(id)
                .await
                .map_err(|e| OracleError::Lookup(e.to_string()))?;
            if found.is_none() {
                stale.push(id);
            }
        }

        let mut entitlements = self.entitlements.write();
        for id in &stale {
            entitlements.remove(id);
        }
        Ok(stale.len())
    }

    pub fn granted_licenses(&self) -> usize {
        self.entitlements.read().len()
    }

    /// Licenses of `org_id` that cover `customer` right now.
    async fn current_licenses(
        &self,
        customer: CustomerOrganizationId,
        org_id: OrganizationId,
    ) -> Result<Vec<UsageLicense>, OracleError> {
        let now = Utc::now();
        let licenses = self
            .repository
            .list_by_organization(org_id)
            .await
            .map_err(|e| OracleError::Lookup(e.to_string()))?;
        Ok(licenses
            .into_iter()
            .filter(|l| l.covers_customer(customer) && l.is_valid_at(now))
            .collect())
    }

    fn any_entitlement(
        &self,
        licenses: &[UsageLicense],
        matches: impl Fn(&ArtifactEntitlement) -> bool,
    ) -> Option<UsageLicenseId> {
        let entitlements = self.entitlements.read();
        licenses
            .iter()
            .find(|l| {
                entitlements
                    .get(&l.id)
                    .is_some_and(|grants| grants.iter().any(&matches))
            })
            .map(|l| l.id)
    }
}

impl LicenseRevocationListener for RepositoryLicenseOracle {
    fn license_deleted(&self, license_id: UsageLicenseId) {
        self.revoke(license_id);
    }
}

#[async_trait]
impl LicenseValidityOracle for RepositoryLicenseOracle {
    async fn check_license_for_artifact(
        &self,
        org_name: &str,
        artifact_name: &str,
        reference: &str,
        customer_org_id: CustomerOrganizationId,
        org_id: OrganizationId,
    ) -> Result<(), OracleError> {
        let licenses = self.current_licenses(customer_org_id, org_id).await?;
        match self.any_entitlement(&licenses, |e| e.covers_reference(org_name, artifact_name, reference)) {
            Some(license_id) => {
                debug!(%license_id, org = org_name, artifact = artifact_name, reference, "License covers artifact");
                Ok(())
            }
            None => Err(OracleError::Forbidden),
        }
    }

    async fn check_license_for_artifact_blob(
        &self,
        digest: &str,
        customer_org_id: CustomerOrganizationId,
        org_id: OrganizationId,
    ) -> Result<(), OracleError> {
        let licenses = self.current_licenses(customer_org_id, org_id).await?;
        match self.any_entitlement(&licenses, |e| e.covers_digest(digest)) {
            Some(license_id) => {
                debug!(%license_id, digest, "License covers blob");
                Ok(())
            }
            None => Err(OracleError::Forbidden),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::usage_license::NewUsageLicense;
    use crate::infrastructure::repositories::InMemoryUsageLicenseRepository;
    use chrono::Duration;
    use serde_json::value::RawValue;

    struct Fixture {
        repo: Arc<InMemoryUsageLicenseRepository>,
        oracle: RepositoryLicenseOracle,
        org: OrganizationId,
        customer: CustomerOrganizationId,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryUsageLicenseRepository::new());
        Fixture {
            oracle: RepositoryLicenseOracle::new(repo.clone()),
            repo,
            org: OrganizationId::new(),
            customer: CustomerOrganizationId::new(),
        }
    }

    async fn store(
        f: &Fixture,
        name: &str,
        customer: Option<CustomerOrganizationId>,
        window: (Duration, Duration),
    ) -> UsageLicenseId {
        let now = Utc::now();
        let license = UsageLicense::new(
            f.org,
            NewUsageLicense {
                name: name.to_string(),
                description: None,
                payload: RawValue::from_string("{}".to_string()).unwrap(),
                not_before: now + window.0,
                expires_at: now + window.1,
                customer_organization_id: customer,
            },
        )
        .unwrap();
        f.repo.create(&license).await.unwrap();
        license.id
    }

    fn current() -> (Duration, Duration) {
        (Duration::hours(-1), Duration::hours(1))
    }

    #[tokio::test]
    async fn test_customer_license_covers_listed_reference() {
        let f = fixture();
        let id = store(&f, "gold", Some(f.customer), current()).await;
        f.oracle
            .grant(id, ArtifactEntitlement::new("acme", "widget").with_references(["1.0"]));

        assert!(f
            .oracle
            .check_license_for_artifact("acme", "widget", "1.0", f.customer, f.org)
            .await
            .is_ok());
        assert!(f
            .oracle
            .check_license_for_artifact("acme", "widget", "2.0", f.customer, f.org)
            .await
            .unwrap_err()
            .is_forbidden());
        assert!(f
            .oracle
            .check_license_for_artifact("acme", "gadget", "1.0", f.customer, f.org)
            .await
            .unwrap_err()
            .is_forbidden());
    }

    #[tokio::test]
    async fn test_org_wide_license_covers_every_customer() {
        let f = fixture();
        let id = store(&f, "public", None, current()).await;
        f.oracle.grant(id, ArtifactEntitlement::new("acme", "widget"));

        for customer in [f.customer, CustomerOrganizationId::new()] {
            assert!(f
                .oracle
                .check_license_for_artifact("acme", "widget", "latest", customer, f.org)
                .await
                .is_ok());
        }
    }

    #[tokio::test]
    async fn test_other_customer_license_does_not_apply() {
        let f = fixture();
        let id = store(&f, "gold", Some(CustomerOrganizationId::new()), current()).await;
        f.oracle.grant(id, ArtifactEntitlement::new("acme", "widget"));

        assert!(f
            .oracle
            .check_license_for_artifact("acme", "widget", "latest", f.customer, f.org)
            .await
            .unwrap_err()
            .is_forbidden());
    }

    #[tokio::test]
    async fn test_license_outside_window_does_not_apply() {
        let f = fixture();
        let expired = store(&f, "expired", Some(f.customer), (Duration::days(-10), Duration::days(-1))).await;
        let future = store(&f, "future", Some(f.customer), (Duration::days(1), Duration::days(10))).await;
        for id in [expired, future] {
            f.oracle.grant(id, ArtifactEntitlement::new("acme", "widget"));
        }

        assert!(f
            .oracle
            .check_license_for_artifact("acme", "widget", "latest", f.customer, f.org)
            .await
            .unwrap_err()
            .is_forbidden());
    }

    #[tokio::test]
    async fn test_deleted_license_revokes_access() {
        let f = fixture();
        let id = store(&f, "gold", Some(f.customer), current()).await;
        f.oracle
            .grant(id, ArtifactEntitlement::new("acme", "widget").with_digests(["sha256:abc"]));
        assert!(f
            .oracle
            .check_license_for_artifact_blob("sha256:abc", f.customer, f.org)
            .await
            .is_ok());

        f.repo.delete(id).await.unwrap();
        assert!(f
            .oracle
            .check_license_for_artifact_blob("sha256:abc", f.customer, f.org)
            .await
            .unwrap_err()
            .is_forbidden());
    }

    #[tokio::test]
    async fn test_blob_digest_lists() {
        let f = fixture();
        let id = store(&f, "gold", Some(f.customer), current()).await;
        f.oracle
            .grant(id, ArtifactEntitlement::new("acme", "widget").with_digests(["sha256:abc"]));

        assert!(f
            .oracle
            .check_license_for_artifact_blob("sha256:def", f.customer, f.org)
            .await
            .unwrap_err()
            .is_forbidden());

        f.oracle.revoke(id);
        assert!(f
            .oracle
            .check_license_for_artifact_blob("sha256:abc", f.customer, f.org)
            .await
            .unwrap_err()
            .is_forbidden());
    }

    #[tokio::test]
    async fn test_artifact_entitlement_without_digests_covers_no_blob() {
        let f = fixture();
        let id = store(&f, "widget-only", Some(f.customer), current()).await;
        f.oracle.grant(id, ArtifactEntitlement::new("acme", "widget"));

        assert!(f
            .oracle
            .check_license_for_artifact("acme", "widget", "1.0", f.customer, f.org)
            .await
            .is_ok());
        assert!(f
            .oracle
            .check_license_for_artifact_blob("sha256:blob-of-gadget", f.customer, f.org)
            .await
            .unwrap_err()
            .is_forbidden());
    }

    #[tokio::test]
    async fn test_prune_drops_entitlements_of_deleted_licenses() {
        let f = fixture();
        let kept = store(&f, "kept", Some(f.customer), current()).await;
        let deleted = store(&f, "deleted", Some(f.customer), current()).await;
        f.oracle.grant(kept, ArtifactEntitlement::new("acme", "widget"));
        f.oracle.grant(deleted, ArtifactEntitlement::new("acme", "gadget"));

        f.repo.delete(deleted).await.unwrap();
        assert_eq!(f.oracle.prune().await.unwrap(), 1);
        assert_eq!(f.oracle.granted_licenses(), 1);
        assert_eq!(f.oracle.prune().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_license_deleted_notification_revokes() {
        let f = fixture();
        let id = store(&f, "gold", Some(f.customer), current()).await;
        f.oracle.grant(id, ArtifactEntitlement::new("acme", "widget"));

        f.oracle.license_deleted(id);
        assert_eq!(f.oracle.granted_licenses(), 0);
    }
}

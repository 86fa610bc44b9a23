// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Registry Authorizer
//!
//! Decides whether a [`Principal`] may `read`, `write` or `stat` a repository
//! name, a reference within it, or a content-addressed blob.
//!
//! ## Decision Pipeline
//!
//! ```text
//! authorize(name)              authorize_reference(name, ref)     authorize_blob(digest)
//!   └─ write gate                └─ write gate                      └─ write gate
//!   └─ parse name + slug check   └─ parse name + slug check         └─ licensed customer?
//!                                └─ non-write, licensed customer?        └─ oracle(digest)
//!                                     └─ oracle(org, artifact, ref)
//! ```
//!
//! The write gate is shared by all three entry points. The blob path consults
//! the oracle without looking at the action; a customer write never gets that
//! far because the gate rejects it first.
//!
//! Every decision is a function of its inputs plus at most one oracle lookup.
//! The authorizer keeps no state between calls and can be shared freely.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::authorization::{AccessDenied, Action, AuthzError};
use crate::domain::license_oracle::{LicenseValidityOracle, OracleError};
use crate::domain::principal::{Principal, UserRole};
use crate::domain::resource_name::ResourceName;

#[async_trait]
pub trait ArtifactAuthorizer: Send + Sync {
    async fn authorize(&self, principal: &Principal, name: &str, action: Action) -> Result<(), AuthzError>;

    async fn authorize_reference(
        &self,
        principal: &Principal,
        name: &str,
        reference: &str,
        action: Action,
    ) -> Result<(), AuthzError>;

    async fn authorize_blob(&self, principal: &Principal, digest: &str, action: Action) -> Result<(), AuthzError>;
}

/// Customers, role-less users and read-only users never write.
pub fn check_write_gate(principal: &Principal, action: Action) -> Result<(), AccessDenied> {
    if action != Action::Write {
        return Ok(());
    }
    if principal.is_customer() {
        return Err(AccessDenied::CustomerWriteDenied);
    }
    match principal.user_role {
        None => Err(AccessDenied::NoRoleWriteDenied),
        Some(UserRole::ReadOnly) => Err(AccessDenied::ReadOnlyWriteDenied),
        Some(UserRole::Admin | UserRole::ReadWrite) => Ok(()),
    }
}

/// Parse `name` and require its organization segment to equal the
/// principal's organization slug.
pub fn check_organization(principal: &Principal, name: &str) -> Result<ResourceName, AccessDenied> {
    let parsed = ResourceName::parse(name)?;
    match principal.organization.slug.as_deref() {
        Some(slug) if slug == parsed.org_name => Ok(parsed),
        slug => Err(AccessDenied::OrgMismatch {
            organization_slug: slug.map(str::to_string),
            requested_org: parsed.org_name,
        }),
    }
}

/// [`ArtifactAuthorizer`] that consults a [`LicenseValidityOracle`] for
/// customers of organizations with the licensing feature.
#[derive(Clone)]
pub struct LicenseAwareAuthorizer {
    oracle: Arc<dyn LicenseValidityOracle>,
    oracle_timeout: Option<Duration>,
}

impl LicenseAwareAuthorizer {
    pub fn new(oracle: Arc<dyn LicenseValidityOracle>) -> Self {
        Self {
            oracle,
            oracle_timeout: None,
        }
    }

    /// Bound every oracle lookup; an elapsed bound is reported as
    /// [`OracleError::Timeout`], never as a denial.
    pub fn with_oracle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    async fn consult_oracle(
        &self,
        lookup: impl Future<Output = Result<(), OracleError>> + Send,
    ) -> Result<(), AuthzError> {
        let outcome = match self.oracle_timeout {
            Some(limit) => tokio::time::timeout(limit, lookup)
                .await
                .unwrap_or_else(|_| Err(OracleError::Timeout(limit))),
            None => lookup.await,
        };
        outcome.map_err(AuthzError::from)
    }
}

#[async_trait]
impl ArtifactAuthorizer for LicenseAwareAuthorizer {
    async fn authorize(&self, principal: &Principal, name: &str, action: Action) -> Result<(), AuthzError> {
        let result = check_write_gate(principal, action)
            .and_then(|_| check_organization(principal, name))
            .map(|_| ())
            .map_err(AuthzError::from);

        record_decision("name", name, action, &result);
        result
    }

    async fn authorize_reference(
        &self,
        principal: &Principal,
        name: &str,
        reference: &str,
        action: Action,
    ) -> Result<(), AuthzError> {
        let result = async {
            check_write_gate(principal, action)?;
            let parsed = check_organization(principal, name)?;

            if action != Action::Write {
                if let Some(customer) = principal.licensed_customer() {
                    self.consult_oracle(self.oracle.check_license_for_artifact(
                        &parsed.org_name,
                        &parsed.artifact_name,
                        reference,
                        customer,
                        principal.organization_id(),
                    ))
                    .await?;
                }
            }
            Ok::<(), AuthzError>(())
        }
        .await;

        record_decision("reference", name, action, &result);
        result
    }

    async fn authorize_blob(&self, principal: &Principal, digest: &str, action: Action) -> Result<(), AuthzError> {
        let result = async {
            check_write_gate(principal, action)?;

            if let Some(customer) = principal.licensed_customer() {
                self.consult_oracle(self.oracle.check_license_for_artifact_blob(
                    digest,
                    customer,
                    principal.organization_id(),
                ))
                .await?;
            }
            Ok::<(), AuthzError>(())
        }
        .await;

        record_decision("blob", digest, action, &result);
        result
    }
}

fn record_decision(entry: &'static str, resource: &str, action: Action, result: &Result<(), AuthzError>) {
    let outcome = match result {
        Ok(()) => {
            debug!(entry, resource, action = %action, "Registry access granted");
            "allow"
        }
        Err(AuthzError::AccessDenied(reason)) => {
            info!(entry, resource, action = %action, reason = %reason, "Registry access denied");
            reason.code()
        }
        Err(err) => {
            warn!(entry, resource, action = %action, error = %err, "Registry authorization failed");
            "error"
        }
    };
    metrics::counter!(
        "artifact_trust_authz_decisions_total",
        "entry" => entry,
        "outcome" => outcome
    )
    .increment(1);
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Principal Value Object
//!
//! The authorization-relevant attributes of one authenticated caller. An
//! authentication layer outside this crate builds a [`Principal`] once per
//! request; the authorizer only ever reads it.
//!
//! ## Vendor vs. customer principals
//!
//! | `customer_organization_id` | Meaning |
//! |----------------------------|---------|
//! | `None` | vendor-side staff of `organization_id` |
//! | `Some(id)` | a user of customer org `id`, served by vendor `organization_id` |

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Identifier of a vendor organization (the owner of artifacts and licenses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganizationId(pub Uuid);

impl OrganizationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrganizationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a customer organization served by a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerOrganizationId(pub Uuid);

impl CustomerOrganizationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CustomerOrganizationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CustomerOrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a user within their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    ReadWrite,
    ReadOnly,
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "read_write" | "read-write" => Ok(Self::ReadWrite),
            "read_only" | "read-only" => Ok(Self::ReadOnly),
            other => Err(format!("unknown user role '{}'", other)),
        }
    }
}

/// Feature flags that can be enabled on an organization.
///
/// The authorizer only inspects [`OrganizationFeature::Licensing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationFeature {
    Licensing,
    PrePostScripts,
}

/// The organization the current session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    /// URL-safe organization handle; registry names are prefixed by it.
    /// Organizations created before slugs existed may not have one.
    pub slug: Option<String>,
    #[serde(default)]
    pub features: BTreeSet<OrganizationFeature>,
}

impl Organization {
    pub fn has_feature(&self, feature: OrganizationFeature) -> bool {
        self.features.contains(&feature)
    }
}

/// Authorization-relevant view of an authenticated caller.
///
/// Immutable for the lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub organization: Organization,
    pub customer_organization_id: Option<CustomerOrganizationId>,
    pub user_role: Option<UserRole>,
}

impl Principal {
    /// A vendor-side user of `organization`.
    pub fn vendor(organization: Organization, role: Option<UserRole>) -> Self {
        Self {
            organization,
            customer_organization_id: None,
            user_role: role,
        }
    }

    /// A user of `customer` served by the vendor `organization`.
    pub fn customer(
        organization: Organization,
        customer: CustomerOrganizationId,
        role: Option<UserRole>,
    ) -> Self {
        Self {
            organization,
            customer_organization_id: Some(customer),
            user_role: role,
        }
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization.id
    }

    pub fn is_customer(&self) -> bool {
        self.customer_organization_id.is_some()
    }

    /// Customer organization of this principal when license checks apply to it,
    /// i.e. it is a customer and the vendor has licensing enabled.
    pub fn licensed_customer(&self) -> Option<CustomerOrganizationId> {
        self.customer_organization_id
            .filter(|_| self.organization.has_feature(OrganizationFeature::Licensing))
    }
}

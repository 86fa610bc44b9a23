// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Registry Authorization Types
//!
//! The closed set of registry actions and the structured outcome of an
//! authorization decision.
//!
//! ## Error categories
//!
//! | Variant | Category | Typical HTTP mapping |
//! |---------|----------|----------------------|
//! | [`AuthzError::AccessDenied`] | policy denial, expected and frequent | 403 / 404 |
//! | [`AuthzError::Oracle`] | infrastructure failure | 500 / 503 |
//!
//! A denial always carries an [`AccessDenied`] reason, so callers never
//! have to reconstruct it from a message string.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::license_oracle::OracleError;
use crate::domain::resource_name::NameError;

/// Registry action requested by a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Stat,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Stat => "stat",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "stat" => Ok(Self::Stat),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("malformed name: {0}")]
    MalformedName(#[from] NameError),

    #[error("customer user can not perform write action")]
    CustomerWriteDenied,

    #[error("user with no role can not perform write action")]
    NoRoleWriteDenied,

    #[error("read-only user can not perform write action")]
    ReadOnlyWriteDenied,

    #[error("{}", org_mismatch_reason(.organization_slug, .requested_org))]
    OrgMismatch {
        organization_slug: Option<String>,
        requested_org: String,
    },

    #[error("license required")]
    LicenseRequired,
}

fn org_mismatch_reason(slug: &Option<String>, requested: &str) -> String {
    match slug {
        None => "organization has no slug".to_string(),
        Some(slug) => format!(
            "organization slug '{}' does not match '{}'",
            slug, requested
        ),
    }
}

impl AccessDenied {
    /// Stable machine-readable reason, suitable for metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedName(_) => "malformed_name",
            Self::CustomerWriteDenied => "customer_write_denied",
            Self::NoRoleWriteDenied => "no_role_write_denied",
            Self::ReadOnlyWriteDenied => "read_only_write_denied",
            Self::OrgMismatch { .. } => "org_mismatch",
            Self::LicenseRequired => "license_required",
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("access denied: {0}")]
    AccessDenied(#[from] AccessDenied),

    #[error(transparent)]
    Oracle(OracleError),
}

impl AuthzError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied(_))
    }

    pub fn denial(&self) -> Option<&AccessDenied> {
        match self {
            Self::AccessDenied(reason) => Some(reason),
            Self::Oracle(_) => None,
        }
    }
}

impl From<OracleError> for AuthzError {
    /// A forbidden answer is a license denial; everything else is an
    /// infrastructure failure and must not be read as "allow".
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::Forbidden => Self::AccessDenied(AccessDenied::LicenseRequired),
            other => Self::Oracle(other),
        }
    }
}

impl From<NameError> for AuthzError {
    fn from(err: NameError) -> Self {
        Self::AccessDenied(AccessDenied::MalformedName(err))
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod authorizer;
pub mod usage_license_service;

// Re-export use cases for convenience
pub use authorizer::{check_organization, check_write_gate, ArtifactAuthorizer, LicenseAwareAuthorizer};
pub use usage_license_service::{UsageLicenseError, UsageLicenseService};

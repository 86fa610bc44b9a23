// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod license_oracle;
pub mod repositories;
pub mod usage_license;

pub use license_oracle::{ArtifactEntitlement, RepositoryLicenseOracle};
pub use repositories::InMemoryUsageLicenseRepository;

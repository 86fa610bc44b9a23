// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Pure trust types: principals, repository names, the claim policy, the
//! usage-license aggregate and the ports the application layer depends on.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Authorization and licensing vocabulary, free of I/O

pub mod authorization;
pub mod claims;
pub mod license_oracle;
pub mod principal;
pub mod repository;
pub mod resource_name;
pub mod trust_config;
pub mod usage_license;

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Artifact Trust Core
//!
//! Registry authorization and usage-license issuance.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** `domain` types and ports, `application` use cases,
//!   `infrastructure` adapters (JWT codec, in-memory store, validity oracle)

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;

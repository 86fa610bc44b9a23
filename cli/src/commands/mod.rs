// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the trustctl CLI

pub mod config;
pub mod keygen;
pub mod license;

pub use self::config::ConfigCommand;
pub use self::license::LicenseCommand;

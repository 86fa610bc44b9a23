// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Usage-license token issuance and verification.

pub mod codec;
pub mod signing_key;
pub mod verifier;

pub use codec::{generate_token, CodecError, UsageLicenseClaims, UsageLicenseTokenIssuer, USAGE_LICENSE_AUDIENCE};
pub use signing_key::{Ed25519LicenseKey, PlatformSigningKey};
pub use verifier::{decode_unverified, DecodedToken, UsageLicenseTokenVerifier, VerifyError};

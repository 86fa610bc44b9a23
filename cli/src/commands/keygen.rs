// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use colored::Colorize;
use ed25519_dalek::SigningKey;
use rand_core::OsRng;
use std::path::{Path, PathBuf};

use artifact_trust_core::infrastructure::usage_license::Ed25519LicenseKey;

pub fn execute(output: Option<PathBuf>) -> Result<()> {
    let pem = generate_pem()?;

    match output {
        Some(path) => {
            write_private(&path, &pem)?;
            eprintln!(
                "{}",
                format!("✓ Signing key written: {}", path.display()).green()
            );
        }
        None => print!("{}", pem),
    }
    Ok(())
}

fn generate_pem() -> Result<String> {
    let key = Ed25519LicenseKey::from_signing_key(SigningKey::generate(&mut OsRng))
        .context("Failed to build signing key")?;
    Ok(key.to_pkcs8_pem()?)
}

fn write_private(path: &Path, pem: &str) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Refusing to overwrite existing file {:?}", path);
    }
    std::fs::write(path, pem).with_context(|| format!("Failed to write key to {:?}", path))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict permissions on {:?}", path))?;
    }
    Ok(())
}

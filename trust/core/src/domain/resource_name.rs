// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Resource Name Parser
//!
//! Parses registry repository names of the form `<org>/<artifact>` into a
//! [`ResourceName`]. The artifact part may itself contain further
//! `/`-separated path components (`acme/charts/widget`).
//!
//! # Grammar
//!
//! ```text
//! name      := org "/" artifact
//! org       := component
//! artifact  := component ("/" component)*
//! component := alnum ([a-z0-9._-]* alnum)?
//! ```
//!
//! Tags and digests are never part of the name; they travel as a separate
//! reference, so `:` and `@` are rejected here.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Total parser; every input either yields a name or a [`NameError`]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum accepted length of a full repository name.
pub const MAX_NAME_LEN: usize = 255;

/// Reasons a repository name is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name is empty")]
    Empty,

    #[error("name '{0}' has no artifact segment")]
    MissingArtifact(String),

    #[error("name '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("name '{name}' contains invalid segment '{segment}'")]
    InvalidSegment { name: String, segment: String },

    #[error("name exceeds {MAX_NAME_LEN} characters")]
    TooLong,
}

/// A parsed registry repository name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceName {
    pub org_name: String,
    pub artifact_name: String,
}

impl ResourceName {
    pub fn parse(name: &str) -> Result<Self, NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(NameError::TooLong);
        }

        let (org, artifact) = name
            .split_once('/')
            .ok_or_else(|| NameError::MissingArtifact(name.to_string()))?;

        for segment in std::iter::once(org).chain(artifact.split('/')) {
            if segment.is_empty() {
                return Err(NameError::EmptySegment(name.to_string()));
            }
            if !is_valid_component(segment) {
                return Err(NameError::InvalidSegment {
                    name: name.to_string(),
                    segment: segment.to_string(),
                });
            }
        }

        Ok(Self {
            org_name: org.to_string(),
            artifact_name: artifact.to_string(),
        })
    }
}

impl std::str::FromStr for ResourceName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.org_name, self.artifact_name)
    }
}

fn is_valid_component(segment: &str) -> bool {
    let is_alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let starts_and_ends = segment.chars().next().is_some_and(is_alnum)
        && segment.chars().last().is_some_and(is_alnum);

    starts_and_ends
        && segment
            .chars()
            .all(|c| is_alnum(c) || matches!(c, '.' | '_' | '-'))
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Run configuration.

use anyhow::{Context, Result};
use std::path::Path;

use crate::orchestrator::FailurePolicy;
use crate::zone::SourceCredentials;

/// Settings shared by every zone of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Source account owning the zones
    pub source: SourceCredentials,
    /// Target compartment for migrated zones
    pub target_compartment: String,
    /// Target compartment for TSIG keys
    pub tsig_key_compartment: String,
    /// What to do after a zone fails
    pub failure_policy: FailurePolicy,
    /// Report zones that already exist in the target as skipped instead of reconciling them
    pub skip_existing: bool,
}

/// Read zone names from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_zone_names(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read zone names file {}", path.display()))?;
    Ok(parse_zone_names(&text))
}

/// One zone per line; blank lines and `#` comments are ignored.
#[must_use]
pub fn parse_zone_names(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Password from the command line or environment, else prompted without echo.
///
/// # Errors
///
/// Returns an error if prompting fails or the password is empty.
pub fn resolve_password(provided: Option<String>, username: &str) -> Result<String> {
    let password = match provided {
        Some(password) => password,
        None => rpassword::prompt_password(format!("Dyn password for {username}: "))
            .context("Failed to read Dyn password")?,
    };
    anyhow::ensure!(!password.is_empty(), "Dyn password must not be empty");
    Ok(password)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

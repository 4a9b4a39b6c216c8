// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! OCI SDK/CLI configuration file.
//!
//! The file is INI-style: `[PROFILE]` sections of `key=value` lines, `#` or
//! `;` comments. Keys in `[DEFAULT]` are inherited by every other profile.
//!
//! ```text
//! [DEFAULT]
//! user=ocid1.user.oc1..aaaa
//! fingerprint=20:3b:97:13:55:1c:...
//! key_file=~/.oci/oci_api_key.pem
//! tenancy=ocid1.tenancy.oc1..aaaa
//! region=us-ashburn-1
//! ```

use anyhow::{bail, Context, Result};
use dirs::home_dir;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::signer::OciSigner;

const DEFAULT_SECTION: &str = "DEFAULT";

/// One resolved profile of the OCI config file.
///
/// `pass_phrase` is not read; encrypted API keys fail when the signer is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciProfile {
    pub user: String,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub tenancy: String,
    pub region: String,
}

impl OciProfile {
    /// `keyId` used in request signatures.
    #[must_use]
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy, self.user, self.fingerprint)
    }

    /// Build the request signer from the profile's key file.
    ///
    /// # Errors
    ///
    /// Returns an error if the key file cannot be read or parsed.
    pub fn signer(&self) -> Result<OciSigner> {
        let pem = std::fs::read_to_string(&self.key_file)
            .with_context(|| format!("Failed to read OCI API key {}", self.key_file.display()))?;
        OciSigner::from_pem(self.key_id(), &pem)
            .with_context(|| format!("Failed to load OCI API key {}", self.key_file.display()))
    }
}

/// Load `profile` from the config file at `path` (`~` is expanded).
///
/// # Errors
///
/// Returns an error if the file cannot be read, the profile does not exist,
/// or a required key is missing.
pub fn load_profile(path: &str, profile: &str) -> Result<OciProfile> {
    let path = expand_tilde(path);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read OCI config file {}", path.display()))?;
    debug!(path = %path.display(), profile = %profile, "Loading OCI config profile");
    parse_profile(&text, profile)
        .with_context(|| format!("Invalid OCI config file {}", path.display()))
}

/// Resolve `profile` from config file contents.
///
/// # Errors
///
/// Returns an error if the profile does not exist or a required key is missing.
pub fn parse_profile(text: &str, profile: &str) -> Result<OciProfile> {
    let sections = parse_sections(text)?;

    let mut values = sections.get(DEFAULT_SECTION).cloned().unwrap_or_default();
    match sections.get(profile) {
        Some(section) => values.extend(section.clone()),
        None if profile == DEFAULT_SECTION && !values.is_empty() => {}
        None => bail!("Profile '{profile}' not found"),
    }

    let required = |key: &str| -> Result<String> {
        values
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
            .with_context(|| format!("Profile '{profile}' is missing '{key}'"))
    };

    Ok(OciProfile {
        user: required("user")?,
        fingerprint: required("fingerprint")?,
        key_file: expand_tilde(&required("key_file")?),
        tenancy: required("tenancy")?,
        region: required("region")?,
    })
}

fn parse_sections(text: &str) -> Result<HashMap<String, HashMap<String, String>>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            bail!("line {}: expected 'key=value'", index + 1);
        };
        let Some(section) = &current else {
            bail!("line {}: key '{}' outside of a [section]", index + 1, key.trim());
        };
        sections
            .entry(section.clone())
            .or_default()
            .insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(sections)
}

/// Expand a leading `~` to the user's home directory.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    match (path.strip_prefix("~/"), home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => Path::new(path).to_path_buf(),
    }
}

#[cfg(test)]
#[path = "oci_config_tests.rs"]
mod oci_config_tests;

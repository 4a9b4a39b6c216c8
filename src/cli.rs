// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line interface.

use anyhow::Result;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::config::{load_zone_names, MigrationConfig};
use crate::constants::{DYNECT_TRANSFER_SERVER, OCI_DEFAULT_CONFIG_FILE, OCI_DEFAULT_PROFILE};
use crate::orchestrator::FailurePolicy;
use crate::zone::SourceCredentials;

/// Migrate DNS zones from Dyn Managed DNS to OCI DNS.
///
/// Primary zones are read with a zone transfer from Dyn and their record sets
/// written to OCI. Secondary zones are recreated as OCI secondary zones with
/// the same masters and TSIG key.
#[derive(Parser, Debug)]
#[command(name = "zonemigrate", version)]
#[command(group(
    ArgGroup::new("zones")
        .required(true)
        .args(["zone_name", "zone_names_file"])
))]
pub struct Cli {
    /// Dyn customer name
    pub dynect_customer: String,

    /// Dyn user name
    pub dynect_username: String,

    /// Dyn password; prompted for when not given
    #[arg(long, env = "DYNECT_PASSWORD", hide_env_values = true)]
    pub dynect_password: Option<String>,

    /// Name of a single zone to migrate
    #[arg(long)]
    pub zone_name: Option<String>,

    /// File with one zone name per line
    #[arg(long)]
    pub zone_names_file: Option<PathBuf>,

    /// OCI compartment to create zones in (defaults to the tenancy root)
    #[arg(long)]
    pub oci_compartment: Option<String>,

    /// OCI config file
    #[arg(long, default_value = OCI_DEFAULT_CONFIG_FILE)]
    pub oci_config_file: String,

    /// Profile within the OCI config file
    #[arg(long, default_value = OCI_DEFAULT_PROFILE)]
    pub oci_config_profile: String,

    /// OCI compartment holding TSIG keys (defaults to --oci-compartment)
    #[arg(long)]
    pub tsig_key_compartment: Option<String>,

    /// Keep going after a zone fails
    #[arg(long, conflicts_with = "no_ignore_failures")]
    pub ignore_failures: bool,

    /// Stop at the first zone that fails (default)
    #[arg(long)]
    pub no_ignore_failures: bool,

    /// Report zones that already exist in OCI as skipped instead of reconciling them
    #[arg(long)]
    pub skip_existing: bool,

    /// Zone transfer endpoint for primary zones (HOST[:PORT])
    #[arg(long, default_value = DYNECT_TRANSFER_SERVER)]
    pub transfer_server: String,

    /// Dyn TSIG key used to sign zone transfer requests
    #[arg(long)]
    pub transfer_tsig_key: Option<String>,

    /// Dyn REST API base URL
    #[arg(long)]
    pub dynect_api_url: Option<String>,

    /// OCI DNS API endpoint (defaults to the profile's regional endpoint)
    #[arg(long)]
    pub oci_endpoint: Option<String>,
}

impl Cli {
    #[must_use]
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.ignore_failures {
            FailurePolicy::ContinueOnFailure
        } else {
            FailurePolicy::StopOnFailure
        }
    }

    /// Zones to migrate, in the order given.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone names file cannot be read.
    pub fn zone_names(&self) -> Result<Vec<String>> {
        match (&self.zone_name, &self.zone_names_file) {
            (Some(zone), _) => Ok(vec![zone.trim().to_string()]),
            (None, Some(path)) => load_zone_names(path),
            (None, None) => Ok(Vec::new()),
        }
    }

    /// Run configuration. Empty compartments fall back to their defaults.
    #[must_use]
    pub fn migration_config(&self, tenancy: &str) -> MigrationConfig {
        let target_compartment = non_empty(self.oci_compartment.as_deref())
            .unwrap_or(tenancy)
            .to_string();
        let tsig_key_compartment = non_empty(self.tsig_key_compartment.as_deref())
            .unwrap_or(target_compartment.as_str())
            .to_string();

        MigrationConfig {
            source: SourceCredentials {
                customer: self.dynect_customer.clone(),
                username: self.dynect_username.clone(),
            },
            target_compartment,
            tsig_key_compartment,
            failure_policy: self.failure_policy(),
            skip_existing: self.skip_existing,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;

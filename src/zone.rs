// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone descriptors and per-zone migration outcomes.

use crate::migration_errors::MigrationError;
use serde::Serialize;
use std::fmt;

/// Source provider account that owns the zones being migrated.
///
/// The password is deliberately not part of this type; it only lives inside
/// the authenticated source client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCredentials {
    /// Dyn customer name
    pub customer: String,
    /// Dyn user name
    pub username: String,
}

/// Secondary zone configuration read from the source provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecondaryConfig {
    /// Addresses of the masters the zone transfers from
    pub masters: Vec<String>,
    /// TSIG key protecting transfers from the masters, if any.
    ///
    /// `None` is a valid, unauthenticated secondary.
    pub tsig_key_name: Option<String>,
}

/// Role of a zone in the source provider.
///
/// The role decides the retrieval strategy and is never inferred from record
/// content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneRole {
    /// Authoritative zone hosted by the source; read with AXFR
    Primary,
    /// Zone the source transfers from external masters; read through the management API
    Secondary(SecondaryConfig),
}

impl ZoneRole {
    /// Zone type name used by the target provider.
    #[must_use]
    pub fn target_zone_type(&self) -> &'static str {
        match self {
            Self::Primary => "PRIMARY",
            Self::Secondary(_) => "SECONDARY",
        }
    }

    /// TSIG key bound to a secondary zone.
    #[must_use]
    pub fn tsig_key_name(&self) -> Option<&str> {
        match self {
            Self::Primary => None,
            Self::Secondary(config) => config.tsig_key_name.as_deref(),
        }
    }
}

impl fmt::Display for ZoneRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary(_) => write!(f, "secondary"),
        }
    }
}

/// Everything needed to migrate one zone. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneDescriptor {
    /// Zone apex in canonical form
    pub name: String,
    /// Role in the source provider
    pub role: ZoneRole,
    /// Owner of the zone in the source provider
    pub source: SourceCredentials,
    /// Target compartment for the zone
    pub target_compartment: String,
    /// Target compartment holding TSIG keys
    pub tsig_key_compartment: String,
}

/// Final status of one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutcomeStatus {
    Success,
    Skipped,
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Skipped => write!(f, "SKIPPED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Result of processing one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    /// Zone name
    pub zone: String,
    /// Final status
    pub status: OutcomeStatus,
    /// Human-readable detail; for failures `"<Kind>: <message>"`
    pub detail: String,
    /// Record sets written to the target
    pub records_written: usize,
}

impl MigrationOutcome {
    #[must_use]
    pub fn success(zone: &str, records_written: usize, detail: impl Into<String>) -> Self {
        Self {
            zone: zone.to_string(),
            status: OutcomeStatus::Success,
            detail: detail.into(),
            records_written,
        }
    }

    #[must_use]
    pub fn skipped(zone: &str, detail: impl Into<String>) -> Self {
        Self {
            zone: zone.to_string(),
            status: OutcomeStatus::Skipped,
            detail: detail.into(),
            records_written: 0,
        }
    }

    #[must_use]
    pub fn failed(zone: &str, error: &MigrationError) -> Self {
        Self {
            zone: zone.to_string(),
            status: OutcomeStatus::Failed,
            detail: format!("{}: {error}", error.kind()),
            records_written: error.records_written(),
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}

#[cfg(test)]
#[path = "zone_tests.rs"]
mod zone_tests;

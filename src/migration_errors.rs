// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for zone migration.
//!
//! This module provides one error enum per engine stage:
//! - [`RetrievalError`] - reading a zone from the source provider (API or AXFR)
//! - [`TsigError`] - reconciling TSIG keys into the target provider
//! - [`TranslationError`] - mapping source records onto target record sets
//! - [`WriteError`] - creating zones and upserting record sets in the target
//!
//! [`MigrationError`] wraps them all and exposes a stable [`MigrationError::kind`]
//! used in the run summary. Every error is scoped to one zone.
//!
//! [`ProviderError`] is the transport-level error returned by provider clients;
//! the engine stages convert it into their own taxonomy.

use std::fmt;
use thiserror::Error;

/// Error returned by a provider client (HTTP API or DNS transport).
///
/// Preserves the HTTP status and the provider's request id so that failures
/// can be correlated with provider-side logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    /// HTTP status code, when the failure came from an HTTP response
    pub status: Option<u16>,
    /// Provider request id (OCI `opc-request-id`), when available
    pub request_id: Option<String>,
    /// Provider-specific error code (Dyn `ERR_CD`, OCI `code`), when available
    pub code: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl ProviderError {
    /// Error without HTTP context (network failure, decoding failure).
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            request_id: None,
            code: None,
            message: message.into(),
        }
    }

    /// Error built from an HTTP response.
    #[must_use]
    pub fn http(status: u16, request_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            request_id,
            code: None,
            message: message.into(),
        }
    }

    /// Attach a provider error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Returns true for HTTP 401 responses.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    /// Returns true for HTTP 403 responses or a provider `PERMISSION_DENIED` code.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        self.status == Some(403) || self.code.as_deref() == Some("PERMISSION_DENIED")
    }

    /// Returns true for HTTP 404 responses or a provider `NOT_FOUND` code.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404) || self.code.as_deref() == Some("NOT_FOUND")
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        match (self.status, &self.request_id) {
            (Some(status), Some(id)) => write!(f, " (HTTP {status}, opc-request-id: {id})"),
            (Some(status), None) => write!(f, " (HTTP {status})"),
            (None, Some(id)) => write!(f, " (opc-request-id: {id})"),
            (None, None) => Ok(()),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Errors that can occur while reading a zone from the source provider.
#[derive(Error, Debug, Clone)]
pub enum RetrievalError {
    /// Zone transfer refused by the source transfer endpoint
    ///
    /// Dyn only answers AXFR requests from public addresses that were enabled as
    /// transfer servers for the zone. A REFUSED/NOTAUTH answer means the current
    /// egress address is not allow-listed.
    #[error(
        "Zone transfer for '{zone}' refused by {server}; enable transfers to this host's \
         public IP address for the zone in Dyn (External Nameservers, \"Transfers\" selected)"
    )]
    TransferRefused {
        /// The zone being transferred
        zone: String,
        /// The transfer endpoint that refused
        server: String,
    },

    /// Zone transfer failed for another reason (network, malformed stream)
    #[error("Zone transfer for '{zone}' from {server} failed: {reason}")]
    TransferFailed {
        /// The zone being transferred
        zone: String,
        /// The transfer endpoint
        server: String,
        /// Reason for the failure
        reason: String,
    },

    /// Credentials rejected (management API 401/403 or TSIG BADKEY/BADSIG)
    #[error("Authentication against the source provider failed for '{zone}': {reason}")]
    AuthenticationFailed {
        /// The zone being read (or the session scope)
        zone: String,
        /// Reason for the failure
        reason: String,
    },

    /// The user lacks a permission required for this zone
    #[error("Missing Dyn permission '{permission}' for zone '{zone}': {reason}")]
    PermissionDenied {
        /// The zone being read
        zone: String,
        /// The Dyn permission that is likely missing (`ZoneGet`, `SecondaryGet`, `TSIGGet`)
        permission: String,
        /// Provider message
        reason: String,
    },

    /// The zone does not exist in the source provider
    #[error("Zone '{zone}' not found in the source provider")]
    ZoneNotFound {
        /// The zone that was not found
        zone: String,
    },

    /// The zone has no SOA record, so TTL defaults cannot be resolved
    #[error("Zone '{zone}' has no SOA record")]
    MissingSoa {
        /// The zone without SOA
        zone: String,
    },

    /// A record could not be decoded
    #[error("Malformed {rtype} record '{owner}' in zone '{zone}': {reason}")]
    MalformedRecord {
        /// The zone containing the record
        zone: String,
        /// The record owner name
        owner: String,
        /// The record type
        rtype: String,
        /// Explanation of what is invalid
        reason: String,
    },

    /// Management API call failed
    #[error("Source API request for '{zone}' failed: {source}")]
    Api {
        /// The zone being read
        zone: String,
        /// Underlying provider error
        #[source]
        source: ProviderError,
    },
}

/// Errors that can occur while reconciling a TSIG key into the target provider.
#[derive(Error, Debug, Clone)]
pub enum TsigError {
    /// Looking up the key in the target compartment failed
    #[error("Failed to look up TSIG key '{key}' in compartment '{compartment}': {reason}")]
    LookupFailed {
        /// The TSIG key name
        key: String,
        /// The target compartment
        compartment: String,
        /// Reason for the failure
        reason: String,
    },

    /// A key with this name exists in the target but is not usable
    #[error("TSIG key '{key}' exists in the target in state '{state}', but must be ACTIVE")]
    KeyNotActive {
        /// The TSIG key name
        key: String,
        /// The lifecycle state reported by the target
        state: String,
    },

    /// The source provider could not supply the key's secret material
    #[error("Secret for TSIG key '{key}' is not available from the source provider: {reason}")]
    SecretUnavailable {
        /// The TSIG key name
        key: String,
        /// Reason the secret is unavailable
        reason: String,
    },

    /// Creating the key in the target failed
    #[error("Failed to create TSIG key '{key}' in compartment '{compartment}': {reason}")]
    CreateFailed {
        /// The TSIG key name
        key: String,
        /// The target compartment
        compartment: String,
        /// Reason for the failure
        reason: String,
    },
}

/// Errors that can occur while translating records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// Record is a provider value-added artifact or otherwise not a plain DNS record
    #[error("Unsupported {rtype} record '{owner}': {reason}")]
    UnsupportedType {
        /// The record owner name
        owner: String,
        /// The record type
        rtype: String,
        /// Why it cannot be migrated automatically
        reason: String,
    },

    /// A CNAME shares its owner with other data
    #[error("CNAME at '{owner}' conflicts with other records at the same name")]
    CnameConflict {
        /// The conflicting owner name
        owner: String,
    },
}

/// Errors that can occur while writing a zone into the target provider.
#[derive(Error, Debug, Clone)]
pub enum WriteError {
    /// Looking up the zone in the target compartment failed
    #[error("Failed to look up zone '{zone}' in compartment '{compartment}': {reason}")]
    ZoneLookupFailed {
        /// The zone name
        zone: String,
        /// The target compartment
        compartment: String,
        /// Reason for the failure
        reason: String,
    },

    /// Creating the zone failed
    #[error("Failed to create zone '{zone}': {reason}")]
    ZoneCreateFailed {
        /// The zone name
        zone: String,
        /// Reason for the failure
        reason: String,
    },

    /// The zone exists in the target with a different type
    #[error("Zone '{zone}' already exists in the target as {existing}, expected {expected}")]
    ZoneTypeMismatch {
        /// The zone name
        zone: String,
        /// Type of the existing target zone
        existing: String,
        /// Type required by the source role
        expected: String,
    },

    /// Updating the secondary zone configuration (external masters, TSIG) failed
    #[error("Failed to configure secondary zone '{zone}': {reason}")]
    SecondaryConfigFailed {
        /// The zone name
        zone: String,
        /// Reason for the failure
        reason: String,
    },

    /// A record set write was rejected; earlier record sets remain applied
    #[error(
        "Failed to write {rtype} record set '{owner}' in zone '{zone}' \
         ({written} record sets written before the failure): {reason}"
    )]
    RecordSetRejected {
        /// The zone name
        zone: String,
        /// The record set owner
        owner: String,
        /// The record set type
        rtype: String,
        /// Record sets successfully written before this one
        written: usize,
        /// Reason for the failure
        reason: String,
    },
}

impl WriteError {
    /// Number of record sets applied to the target before the failure.
    #[must_use]
    pub fn records_written(&self) -> usize {
        match self {
            Self::RecordSetRejected { written, .. } => *written,
            _ => 0,
        }
    }
}

/// Stage of the per-zone pipeline an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Retrieval,
    Tsig,
    Translation,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retrieval => write!(f, "retrieval"),
            Self::Tsig => write!(f, "tsig"),
            Self::Translation => write!(f, "translation"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Composite error for one zone's migration.
#[derive(Error, Debug, Clone)]
pub enum MigrationError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Tsig(#[from] TsigError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl MigrationError {
    /// Pipeline stage that produced the error.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Retrieval(_) => Stage::Retrieval,
            Self::Tsig(_) => Stage::Tsig,
            Self::Translation(_) => Stage::Translation,
            Self::Write(_) => Stage::Write,
        }
    }

    /// Stable reason code shown in the run summary.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Retrieval(RetrievalError::TransferRefused { .. }) => "TransferRefused",
            Self::Retrieval(RetrievalError::TransferFailed { .. }) => "TransferFailed",
            Self::Retrieval(RetrievalError::AuthenticationFailed { .. }) => "AuthenticationFailed",
            Self::Retrieval(RetrievalError::PermissionDenied { .. }) => "PermissionDenied",
            Self::Retrieval(RetrievalError::ZoneNotFound { .. }) => "ZoneNotFound",
            Self::Retrieval(RetrievalError::MissingSoa { .. }) => "MissingSoa",
            Self::Retrieval(RetrievalError::MalformedRecord { .. }) => "MalformedRecord",
            Self::Retrieval(RetrievalError::Api { .. }) => "SourceApiError",

            Self::Tsig(TsigError::LookupFailed { .. }) => "TsigLookupFailed",
            Self::Tsig(TsigError::KeyNotActive { .. }) => "TsigKeyNotActive",
            Self::Tsig(TsigError::SecretUnavailable { .. }) => "SecretUnavailable",
            Self::Tsig(TsigError::CreateFailed { .. }) => "TsigCreateFailed",

            Self::Translation(TranslationError::UnsupportedType { .. }) => "UnsupportedType",
            Self::Translation(TranslationError::CnameConflict { .. }) => "CnameConflict",

            Self::Write(WriteError::ZoneLookupFailed { .. }) => "ZoneLookupFailed",
            Self::Write(WriteError::ZoneCreateFailed { .. }) => "ZoneCreateFailed",
            Self::Write(WriteError::ZoneTypeMismatch { .. }) => "ZoneTypeMismatch",
            Self::Write(WriteError::SecondaryConfigFailed { .. }) => "SecondaryConfigFailed",
            Self::Write(WriteError::RecordSetRejected { .. }) => "RecordSetRejected",
        }
    }

    /// Record sets applied before the failure (non-zero only for partial writes).
    #[must_use]
    pub fn records_written(&self) -> usize {
        match self {
            Self::Write(e) => e.records_written(),
            _ => 0,
        }
    }
}

#[cfg(test)]
#[path = "migration_errors_tests.rs"]
mod migration_errors_tests;

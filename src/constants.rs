// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for zonemigrate.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Dyn Managed DNS (source provider)
// ============================================================================

/// Base URL of the Dyn Managed DNS REST API
pub const DYNECT_API_URL: &str = "https://api.dynect.net";

/// Header carrying the Dyn session token
pub const DYNECT_AUTH_HEADER: &str = "Auth-Token";

/// Public zone transfer endpoint for Dyn primary zones
pub const DYNECT_TRANSFER_SERVER: &str = "xfrout1.dynect.net";

/// Maximum number of polls of a Dyn job before giving up
pub const DYNECT_MAX_JOB_POLLS: u32 = 30;

/// Interval between polls of an incomplete Dyn job
pub const DYNECT_JOB_POLL_INTERVAL_SECS: u64 = 2;

// ============================================================================
// OCI DNS (target provider)
// ============================================================================

/// OCI DNS API version path segment
pub const OCI_DNS_API_VERSION: &str = "20180115";

/// Default OCI CLI/SDK config file location
pub const OCI_DEFAULT_CONFIG_FILE: &str = "~/.oci/config";

/// Default OCI config profile
pub const OCI_DEFAULT_PROFILE: &str = "DEFAULT";

/// Header carrying the OCI request id, echoed in error messages
pub const OCI_REQUEST_ID_HEADER: &str = "opc-request-id";

/// Maximum number of lifecycle polls while a zone or TSIG key is being created
pub const OCI_MAX_POLL_ATTEMPTS: u32 = 100;

/// Interval between lifecycle polls
pub const OCI_POLL_INTERVAL_SECS: u64 = 5;

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Standard DNS port for queries and zone transfers
pub const DNS_PORT: u16 = 53;

/// TSIG fudge time in seconds (allows for clock skew)
pub const TSIG_FUDGE_TIME_SECS: u64 = 300;

/// Timeout for a full zone transfer over TCP
pub const ZONE_TRANSFER_TIMEOUT_SECS: u64 = 60;

/// Longest character-string allowed inside TXT rdata
pub const TXT_MAX_STRING_LEN: usize = 255;

// ============================================================================
// Process exit codes
// ============================================================================

/// At least one zone failed
pub const EXIT_ZONE_FAILURE: i32 = 1;

/// Invalid arguments or configuration
pub const EXIT_USAGE: i32 = 2;

/// Run interrupted between zones
pub const EXIT_CANCELLED: i32 = 130;

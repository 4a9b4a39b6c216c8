// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Target provider access and zone writing.
//!
//! [`TargetProvider`] is the seam to the target DNS API; [`oci::OciDnsClient`]
//! implements it for OCI DNS. [`TargetZoneWriter`] applies a translated zone
//! through it:
//!
//! 1. look the zone up by name in the target compartment, create it when absent
//! 2. for secondary zones, make the external masters match the source masters
//! 3. for primary zones, replace every record set in turn
//!
//! Every step is an idempotent "make it so" call, so a re-run after a partial
//! failure converges on the same state.

pub mod oci;
pub mod oci_config;
pub mod signer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::constants::DNS_PORT;
use crate::migration_errors::{ProviderError, WriteError};
use crate::records::RecordSet;
use crate::tsig::{TsigKey, TsigKeyRef};
use crate::zone::{ZoneDescriptor, ZoneRole};

/// Lifecycle state of a target resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Active,
    Creating,
    Deleted,
    Deleting,
    Failed,
    Updating,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "ACTIVE",
            Self::Creating => "CREATING",
            Self::Deleted => "DELETED",
            Self::Deleting => "DELETING",
            Self::Failed => "FAILED",
            Self::Updating => "UPDATING",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Master server a secondary zone transfers from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMaster {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsig_key_id: Option<String>,
}

/// A zone in the target provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetZone {
    pub id: String,
    pub name: String,
    pub zone_type: String,
    pub lifecycle_state: LifecycleState,
    #[serde(default)]
    pub external_masters: Vec<ExternalMaster>,
}

/// Zone to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSpec {
    pub name: String,
    pub zone_type: String,
    pub compartment: String,
    pub external_masters: Vec<ExternalMaster>,
}

/// A TSIG key in the target provider. Secrets are never read back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetTsigKey {
    pub id: String,
    pub name: String,
    pub algorithm: String,
    #[serde(rename = "compartmentId")]
    pub compartment: String,
    pub lifecycle_state: LifecycleState,
}

/// Operations the engine needs from the target DNS provider.
///
/// Creation calls return once the resource is ACTIVE.
#[async_trait]
pub trait TargetProvider: Send + Sync {
    /// Zone with exactly this name in the compartment.
    async fn find_zone(
        &self,
        name: &str,
        compartment: &str,
    ) -> Result<Option<TargetZone>, ProviderError>;

    async fn create_zone(&self, spec: &ZoneSpec) -> Result<TargetZone, ProviderError>;

    async fn update_external_masters(
        &self,
        zone_id: &str,
        masters: &[ExternalMaster],
    ) -> Result<(), ProviderError>;

    /// Replace the whole RRSet at (owner, type) with `set`.
    async fn replace_record_set(&self, zone_id: &str, set: &RecordSet) -> Result<(), ProviderError>;

    /// TSIG key with exactly this name in the compartment.
    async fn find_tsig_key(
        &self,
        name: &str,
        compartment: &str,
    ) -> Result<Option<TargetTsigKey>, ProviderError>;

    async fn create_tsig_key(
        &self,
        key: &TsigKey,
        compartment: &str,
    ) -> Result<TargetTsigKey, ProviderError>;
}

/// Writes translated zones into the target provider.
#[derive(Clone)]
pub struct TargetZoneWriter {
    target: Arc<dyn TargetProvider>,
}

impl TargetZoneWriter {
    #[must_use]
    pub fn new(target: Arc<dyn TargetProvider>) -> Self {
        Self { target }
    }

    /// Look up the zone in its target compartment.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::ZoneLookupFailed`] if the lookup call fails.
    pub async fn existing_zone(
        &self,
        name: &str,
        compartment: &str,
    ) -> Result<Option<TargetZone>, WriteError> {
        self.target
            .find_zone(name, compartment)
            .await
            .map_err(|e| WriteError::ZoneLookupFailed {
                zone: name.to_string(),
                compartment: compartment.to_string(),
                reason: e.to_string(),
            })
    }

    /// Make the target zone match the source zone.
    ///
    /// Returns the number of record sets written. Secondary zones write none;
    /// their records arrive by transfer from the external masters.
    ///
    /// # Errors
    ///
    /// Returns a [`WriteError`]. For [`WriteError::RecordSetRejected`] the
    /// record sets written before the failure stay applied.
    pub async fn apply(
        &self,
        zone: &ZoneDescriptor,
        record_sets: &[RecordSet],
        tsig: Option<&TsigKeyRef>,
    ) -> Result<usize, WriteError> {
        let expected_type = zone.role.target_zone_type();
        let masters = external_masters(&zone.role, tsig);

        let target_zone = match self.existing_zone(&zone.name, &zone.target_compartment).await? {
            Some(existing) => {
                if !existing.zone_type.eq_ignore_ascii_case(expected_type) {
                    return Err(WriteError::ZoneTypeMismatch {
                        zone: zone.name.clone(),
                        existing: existing.zone_type,
                        expected: expected_type.to_string(),
                    });
                }
                if existing.lifecycle_state != LifecycleState::Active {
                    warn!(
                        zone = %zone.name,
                        state = %existing.lifecycle_state,
                        "Target zone exists but is not ACTIVE"
                    );
                }
                debug!(zone = %zone.name, zone_id = %existing.id, "Target zone already exists");
                existing
            }
            None => {
                info!(zone = %zone.name, zone_type = expected_type, "Creating target zone");
                let spec = ZoneSpec {
                    name: zone.name.clone(),
                    zone_type: expected_type.to_string(),
                    compartment: zone.target_compartment.clone(),
                    external_masters: masters.clone(),
                };
                self.target
                    .create_zone(&spec)
                    .await
                    .map_err(|e| WriteError::ZoneCreateFailed {
                        zone: zone.name.clone(),
                        reason: e.to_string(),
                    })?
            }
        };

        match &zone.role {
            ZoneRole::Secondary(_) => {
                self.ensure_masters(zone, &target_zone, &masters).await?;
                Ok(0)
            }
            ZoneRole::Primary => self.write_record_sets(zone, &target_zone, record_sets).await,
        }
    }

    async fn ensure_masters(
        &self,
        zone: &ZoneDescriptor,
        target_zone: &TargetZone,
        masters: &[ExternalMaster],
    ) -> Result<(), WriteError> {
        let mut current = target_zone.external_masters.clone();
        for master in &mut current {
            if master.port == Some(DNS_PORT) {
                master.port = None;
            }
        }
        current.sort();
        if current == masters {
            debug!(zone = %zone.name, "External masters already up to date");
            return Ok(());
        }

        info!(zone = %zone.name, masters = masters.len(), "Updating external masters");
        self.target
            .update_external_masters(&target_zone.id, masters)
            .await
            .map_err(|e| WriteError::SecondaryConfigFailed {
                zone: zone.name.clone(),
                reason: e.to_string(),
            })
    }

    async fn write_record_sets(
        &self,
        zone: &ZoneDescriptor,
        target_zone: &TargetZone,
        record_sets: &[RecordSet],
    ) -> Result<usize, WriteError> {
        let mut written = 0;
        for set in record_sets {
            if is_provider_managed(&zone.name, set) {
                debug!(zone = %zone.name, owner = %set.owner, rtype = %set.rtype, "Leaving provider-managed record set");
                continue;
            }

            self.target
                .replace_record_set(&target_zone.id, set)
                .await
                .map_err(|e| WriteError::RecordSetRejected {
                    zone: zone.name.clone(),
                    owner: set.owner.clone(),
                    rtype: set.rtype.clone(),
                    written,
                    reason: e.to_string(),
                })?;
            written += 1;
        }

        info!(zone = %zone.name, record_sets = written, "Record sets written");
        Ok(written)
    }
}

/// SOA and apex NS are generated by the target provider.
#[must_use]
pub fn is_provider_managed(zone: &str, set: &RecordSet) -> bool {
    set.rtype == "SOA" || (set.rtype == "NS" && set.owner == zone)
}

/// External masters for a zone role, sorted by address.
#[must_use]
pub fn external_masters(role: &ZoneRole, tsig: Option<&TsigKeyRef>) -> Vec<ExternalMaster> {
    let ZoneRole::Secondary(config) = role else {
        return Vec::new();
    };

    let mut masters: Vec<ExternalMaster> = config
        .masters
        .iter()
        .map(|address| ExternalMaster {
            address: address.trim().to_string(),
            port: None,
            tsig_key_id: tsig.map(|key| key.id.clone()),
        })
        .collect();
    masters.sort();
    masters.dedup();
    masters
}

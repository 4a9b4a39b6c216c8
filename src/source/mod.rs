// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Source zone retrieval.
//!
//! The [`SourceZoneReader`] picks the retrieval strategy from the zone's role:
//!
//! - **Primary** zones are read with an authoritative zone transfer (AXFR)
//!   against the provider's public transfer endpoint.
//! - **Secondary** zones are read through the provider's management API; no
//!   transfer is attempted.
//!
//! Both paths end in [`normalize::normalize_records`], so the rest of the
//! engine never sees provider wire quirks. The reader never writes to the
//! source provider.
//!
//! Provider access goes through the [`SourceProvider`] trait;
//! [`dynect::DynectSource`] is the Dyn Managed DNS implementation.

pub mod dynect;
pub mod normalize;
pub mod xfr;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::MigrationConfig;
use crate::migration_errors::RetrievalError;
use crate::records::{normalize_name, RawRecord, ResourceRecord};
use crate::tsig::TsigKey;
use crate::zone::{ZoneDescriptor, ZoneRole};

/// Read-only access to the source DNS provider.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Role of the zone, including secondary configuration when applicable.
    async fn zone_role(&self, zone: &str) -> Result<ZoneRole, RetrievalError>;

    /// Full record set of a primary zone via AXFR.
    async fn transfer_zone(&self, zone: &str) -> Result<Vec<RawRecord>, RetrievalError>;

    /// Full record set of a zone via the management API.
    async fn list_records(&self, zone: &str) -> Result<Vec<RawRecord>, RetrievalError>;

    /// TSIG key material. `Ok(None)` when the provider has no key by that name.
    async fn tsig_key(&self, name: &str) -> Result<Option<TsigKey>, RetrievalError>;
}

/// Retrieves zones from the source provider in canonical form.
#[derive(Clone)]
pub struct SourceZoneReader {
    source: Arc<dyn SourceProvider>,
}

impl SourceZoneReader {
    #[must_use]
    pub fn new(source: Arc<dyn SourceProvider>) -> Self {
        Self { source }
    }

    /// Build the immutable descriptor for a zone name.
    ///
    /// The role is looked up once here and carried by the descriptor for the
    /// rest of the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the zone cannot be found or its configuration cannot be read.
    pub async fn describe(
        &self,
        name: &str,
        config: &MigrationConfig,
    ) -> Result<ZoneDescriptor, RetrievalError> {
        let name = normalize_name(name);
        let role = self.source.zone_role(&name).await?;

        debug!(zone = %name, role = %role, "Resolved zone role");

        Ok(ZoneDescriptor {
            name,
            role,
            source: config.source.clone(),
            target_compartment: config.target_compartment.clone(),
            tsig_key_compartment: config.tsig_key_compartment.clone(),
        })
    }

    /// Retrieve the zone's records, ordered with the SOA first.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::TransferRefused`] when a primary zone's transfer
    /// is refused, or any other [`RetrievalError`] from the provider or normalization.
    pub async fn fetch(&self, zone: &ZoneDescriptor) -> Result<Vec<ResourceRecord>, RetrievalError> {
        let raw = match &zone.role {
            ZoneRole::Primary => {
                info!(zone = %zone.name, "Transferring primary zone (AXFR)");
                self.source.transfer_zone(&zone.name).await?
            }
            ZoneRole::Secondary(_) => {
                info!(zone = %zone.name, "Listing secondary zone records via management API");
                self.source.list_records(&zone.name).await?
            }
        };

        let records = normalize::normalize_records(&zone.name, raw)?;
        info!(zone = %zone.name, records = records.len(), "Retrieved zone records");
        Ok(records)
    }
}

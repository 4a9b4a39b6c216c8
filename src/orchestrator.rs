// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Batch orchestration.
//!
//! Zones are migrated one at a time, in input order. For each zone:
//!
//! 1. describe and fetch it from the source
//! 2. translate its records
//! 3. reconcile its TSIG key (secondary zones with a key binding only)
//! 4. write it to the target
//!
//! A failure in any stage ends that zone with [`OutcomeStatus::Failed`]; the
//! [`FailurePolicy`] decides whether the batch goes on. Cancellation is
//! honoured between zones, never inside one.
//!
//! [`OutcomeStatus::Failed`]: crate::zone::OutcomeStatus::Failed

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::MigrationConfig;
use crate::migration_errors::MigrationError;
use crate::records::normalize_name;
use crate::source::{SourceProvider, SourceZoneReader};
use crate::target::{TargetProvider, TargetZoneWriter};
use crate::translate::translate;
use crate::tsig::TsigReconciler;
use crate::zone::{MigrationOutcome, ZoneRole};

/// What to do after a zone fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop the batch after the first failed zone
    #[default]
    StopOnFailure,
    /// Record the failure and move on to the next zone
    ContinueOnFailure,
}

/// Drives the per-zone pipeline across a batch of zones.
pub struct BatchOrchestrator {
    config: MigrationConfig,
    reader: SourceZoneReader,
    tsig: TsigReconciler,
    writer: TargetZoneWriter,
}

impl BatchOrchestrator {
    #[must_use]
    pub fn new(
        config: MigrationConfig,
        source: Arc<dyn SourceProvider>,
        target: Arc<dyn TargetProvider>,
    ) -> Self {
        Self {
            config,
            reader: SourceZoneReader::new(Arc::clone(&source)),
            tsig: TsigReconciler::new(source, Arc::clone(&target)),
            writer: TargetZoneWriter::new(target),
        }
    }

    /// Migrate `zones` in order and return one outcome per processed zone.
    ///
    /// Zones after a stop (failure under [`FailurePolicy::StopOnFailure`], or
    /// cancellation) get no outcome.
    pub async fn run(
        &mut self,
        zones: &[String],
        cancel: &CancellationToken,
    ) -> Vec<MigrationOutcome> {
        let mut outcomes = Vec::with_capacity(zones.len());

        for (index, zone) in zones.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    remaining = zones.len() - index,
                    "Run cancelled, not processing remaining zones"
                );
                break;
            }

            info!(zone = %zone, position = index + 1, total = zones.len(), "Migrating zone");
            let outcome = self.migrate_zone(zone).await;
            let failed = outcome.is_failure();
            outcomes.push(outcome);

            if failed && self.config.failure_policy == FailurePolicy::StopOnFailure {
                let remaining = zones.len() - index - 1;
                if remaining > 0 {
                    warn!(
                        remaining = remaining,
                        "Stopping after failure; pass --ignore-failures to continue past failed zones"
                    );
                }
                break;
            }
        }

        outcomes
    }

    /// Migrate one zone, turning any stage error into a failed outcome.
    pub async fn migrate_zone(&mut self, zone: &str) -> MigrationOutcome {
        let name = normalize_name(zone);
        match self.try_migrate_zone(&name).await {
            Ok(outcome) => {
                info!(
                    zone = %name,
                    status = %outcome.status,
                    records_written = outcome.records_written,
                    "{}",
                    outcome.detail
                );
                outcome
            }
            Err(e) => {
                error!(
                    zone = %name,
                    stage = %e.stage(),
                    kind = e.kind(),
                    error = %e,
                    "Zone migration failed"
                );
                MigrationOutcome::failed(&name, &e)
            }
        }
    }

    async fn try_migrate_zone(&mut self, name: &str) -> Result<MigrationOutcome, MigrationError> {
        if self.config.skip_existing {
            if let Some(existing) = self
                .writer
                .existing_zone(name, &self.config.target_compartment)
                .await?
            {
                return Ok(MigrationOutcome::skipped(
                    name,
                    format!("zone already exists in the target (id {})", existing.id),
                ));
            }
        }

        let descriptor = self.reader.describe(name, &self.config).await?;
        let records = self.reader.fetch(&descriptor).await?;
        let record_sets = translate(&records)?;

        let tsig = match descriptor.role.tsig_key_name() {
            Some(key_name) => Some(
                self.tsig
                    .reconcile(key_name, &descriptor.tsig_key_compartment)
                    .await?,
            ),
            None => None,
        };

        let written = self
            .writer
            .apply(&descriptor, &record_sets, tsig.as_ref())
            .await?;

        let detail = match &descriptor.role {
            ZoneRole::Primary => format!("{written} record sets written"),
            ZoneRole::Secondary(config) => format!(
                "secondary zone configured with {} external masters; {} record sets will transfer from them",
                config.masters.len(),
                record_sets.len()
            ),
        };
        Ok(MigrationOutcome::success(name, written, detail))
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod orchestrator_tests;

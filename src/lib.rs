// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # zonemigrate - Dyn Managed DNS to OCI DNS zone migration
//!
//! zonemigrate reconciles DNS zones held in Dyn Managed DNS into Oracle Cloud
//! Infrastructure DNS, so that a zone can be cut over without losing records.
//!
//! ## Overview
//!
//! Each zone goes through the same pipeline:
//!
//! - **Retrieval** - the zone's role decides how it is read: primary zones by
//!   zone transfer (AXFR), secondary zones through the Dyn REST API
//! - **TSIG** - a TSIG key bound to a secondary zone is recreated in OCI
//!   unless a key of that name already exists there
//! - **Translation** - records are grouped into OCI record sets
//! - **Write** - the OCI zone is created if needed and record sets are replaced
//!   whole, so re-running a migration is safe
//!
//! Provider value-added features (ALIAS flattening, HTTP redirects, traffic
//! management) are not migrated; zones using them fail with an
//! `UnsupportedType` error naming the record.
//!
//! ## Modules
//!
//! - [`source`] - source provider trait, Dyn client and AXFR
//! - [`tsig`] - TSIG key model and reconciliation
//! - [`translate`] - record set translation
//! - [`target`] - target provider trait, OCI client and zone writer
//! - [`orchestrator`] - batch execution and failure policy
//! - [`migration_errors`] - error taxonomy
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use zonemigrate::orchestrator::BatchOrchestrator;
//! # async fn run(
//! #     config: zonemigrate::config::MigrationConfig,
//! #     source: Arc<dyn zonemigrate::source::SourceProvider>,
//! #     target: Arc<dyn zonemigrate::target::TargetProvider>,
//! # ) {
//! let mut orchestrator = BatchOrchestrator::new(config, source, target);
//! let outcomes = orchestrator
//!     .run(&["example.com".to_string()], &CancellationToken::new())
//!     .await;
//! print!("{}", zonemigrate::report::render_summary(&outcomes));
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod migration_errors;
pub mod orchestrator;
pub mod records;
pub mod report;
pub mod retry;
pub mod source;
pub mod target;
pub mod translate;
pub mod tsig;
pub mod zone;

#[cfg(test)]
pub(crate) mod testing;

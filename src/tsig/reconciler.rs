// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciles TSIG keys referenced by secondary zones into the target.
//!
//! A key that already exists in the target compartment under the same name is
//! used as is, whatever its secret. The reconciler only ever creates keys; it
//! never updates or deletes one.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::TsigKeyRef;
use crate::migration_errors::TsigError;
use crate::source::SourceProvider;
use crate::target::{LifecycleState, TargetProvider, TargetTsigKey};

/// Ensures TSIG keys exist in the target provider.
///
/// Resolved keys are cached per run by (compartment, name), so zones sharing
/// a key cost one lookup.
pub struct TsigReconciler {
    source: Arc<dyn SourceProvider>,
    target: Arc<dyn TargetProvider>,
    cache: HashMap<(String, String), TsigKeyRef>,
}

impl TsigReconciler {
    #[must_use]
    pub fn new(source: Arc<dyn SourceProvider>, target: Arc<dyn TargetProvider>) -> Self {
        Self {
            source,
            target,
            cache: HashMap::new(),
        }
    }

    /// Return a reference to the target key named `key_name`, creating it
    /// from the source key material if it does not exist.
    ///
    /// # Errors
    ///
    /// - [`TsigError::LookupFailed`] if the target lookup fails
    /// - [`TsigError::KeyNotActive`] if the key exists but is not ACTIVE
    /// - [`TsigError::SecretUnavailable`] if the source cannot supply a non-empty secret
    /// - [`TsigError::CreateFailed`] if creation in the target fails
    pub async fn reconcile(
        &mut self,
        key_name: &str,
        compartment: &str,
    ) -> Result<TsigKeyRef, TsigError> {
        let cache_key = (compartment.to_string(), key_name.to_string());
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(key = %key_name, compartment = %compartment, "TSIG key resolved from cache");
            return Ok(cached.clone());
        }

        let existing = self
            .target
            .find_tsig_key(key_name, compartment)
            .await
            .map_err(|e| TsigError::LookupFailed {
                key: key_name.to_string(),
                compartment: compartment.to_string(),
                reason: e.to_string(),
            })?;

        let key = match existing {
            Some(key) => {
                debug!(key = %key_name, key_id = %key.id, "TSIG key already exists in target");
                key
            }
            None => self.create_from_source(key_name, compartment).await?,
        };

        if key.lifecycle_state != LifecycleState::Active {
            return Err(TsigError::KeyNotActive {
                key: key_name.to_string(),
                state: key.lifecycle_state.to_string(),
            });
        }

        let key_ref = TsigKeyRef {
            id: key.id,
            name: key.name,
            compartment: compartment.to_string(),
        };
        self.cache.insert(cache_key, key_ref.clone());
        Ok(key_ref)
    }

    async fn create_from_source(
        &self,
        key_name: &str,
        compartment: &str,
    ) -> Result<TargetTsigKey, TsigError> {
        let unavailable = |reason: String| TsigError::SecretUnavailable {
            key: key_name.to_string(),
            reason,
        };

        let source_key = self
            .source
            .tsig_key(key_name)
            .await
            .map_err(|e| unavailable(e.to_string()))?
            .ok_or_else(|| unavailable("key does not exist in the source provider".to_string()))?;

        if source_key.secret.is_empty() {
            return Err(unavailable("source provider returned an empty secret".to_string()));
        }

        info!(
            key = %key_name,
            algorithm = %source_key.algorithm,
            compartment = %compartment,
            "Creating TSIG key in target"
        );

        self.target
            .create_tsig_key(&source_key, compartment)
            .await
            .map_err(|e| TsigError::CreateFailed {
                key: key_name.to_string(),
                compartment: compartment.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory providers for engine tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use crate::config::MigrationConfig;
use crate::migration_errors::{ProviderError, RetrievalError};
use crate::orchestrator::FailurePolicy;
use crate::records::{RawRecord, RecordData, RecordSet};
use crate::source::SourceProvider;
use crate::target::{
    ExternalMaster, LifecycleState, TargetProvider, TargetTsigKey, TargetZone, ZoneSpec,
};
use crate::tsig::{TsigAlgorithm, TsigKey, TsigSecret};
use crate::zone::{SecondaryConfig, SourceCredentials, ZoneRole};

pub const COMPARTMENT: &str = "ocid1.compartment.oc1..test";

pub fn config(policy: FailurePolicy) -> MigrationConfig {
    MigrationConfig {
        source: SourceCredentials {
            customer: "acme".to_string(),
            username: "migrator".to_string(),
        },
        target_compartment: COMPARTMENT.to_string(),
        tsig_key_compartment: COMPARTMENT.to_string(),
        failure_policy: policy,
        skip_existing: false,
    }
}

pub fn raw(owner: &str, ttl: Option<u32>, data: RecordData) -> RawRecord {
    RawRecord {
        owner: owner.to_string(),
        ttl,
        data,
    }
}

pub fn soa(zone: &str) -> RawRecord {
    raw(
        zone,
        Some(3600),
        RecordData::Soa {
            mname: format!("ns1.{zone}"),
            rname: format!("hostmaster.{zone}"),
            serial: 2024010101,
            refresh: 3600,
            retry: 600,
            expire: 604_800,
            minimum: 300,
        },
    )
}

/// SOA, apex NS, an A record set of two and a TXT record.
pub fn primary_records(zone: &str) -> Vec<RawRecord> {
    vec![
        soa(zone),
        raw(zone, Some(86400), RecordData::Ns(format!("ns1.{zone}"))),
        raw(&format!("www.{zone}"), Some(300), RecordData::A("192.0.2.1".parse().unwrap())),
        raw(&format!("www.{zone}"), Some(300), RecordData::A("192.0.2.2".parse().unwrap())),
        raw(zone, None, RecordData::Txt(vec![b"v=spf1 -all".to_vec()])),
    ]
}

pub fn tsig_key(name: &str, secret: &str) -> TsigKey {
    TsigKey {
        name: name.to_string(),
        algorithm: TsigAlgorithm::HmacSha256,
        secret: TsigSecret::new(secret),
    }
}

#[derive(Default)]
pub struct FakeSource {
    roles: HashMap<String, ZoneRole>,
    records: HashMap<String, Vec<RawRecord>>,
    tsig_keys: HashMap<String, TsigKey>,
    refused: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_primary(mut self, zone: &str, records: Vec<RawRecord>) -> Self {
        self.roles.insert(zone.to_string(), ZoneRole::Primary);
        self.records.insert(zone.to_string(), records);
        self
    }

    pub fn with_secondary(
        mut self,
        zone: &str,
        masters: &[&str],
        tsig_key_name: Option<&str>,
        records: Vec<RawRecord>,
    ) -> Self {
        self.roles.insert(
            zone.to_string(),
            ZoneRole::Secondary(SecondaryConfig {
                masters: masters.iter().map(|m| (*m).to_string()).collect(),
                tsig_key_name: tsig_key_name.map(str::to_string),
            }),
        );
        self.records.insert(zone.to_string(), records);
        self
    }

    pub fn with_tsig_key(mut self, key: TsigKey) -> Self {
        self.tsig_keys.insert(key.name.clone(), key);
        self
    }

    pub fn refusing_transfer(mut self, zone: &str) -> Self {
        self.refused.insert(zone.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose name starts with `prefix` (e.g. `"tsig_key"`).
    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SourceProvider for FakeSource {
    async fn zone_role(&self, zone: &str) -> Result<ZoneRole, RetrievalError> {
        self.record(format!("zone_role:{zone}"));
        self.roles
            .get(zone)
            .cloned()
            .ok_or_else(|| RetrievalError::ZoneNotFound {
                zone: zone.to_string(),
            })
    }

    async fn transfer_zone(&self, zone: &str) -> Result<Vec<RawRecord>, RetrievalError> {
        self.record(format!("transfer:{zone}"));
        if self.refused.contains(zone) {
            return Err(RetrievalError::TransferRefused {
                zone: zone.to_string(),
                server: "xfr.test".to_string(),
            });
        }
        Ok(self.records.get(zone).cloned().unwrap_or_default())
    }

    async fn list_records(&self, zone: &str) -> Result<Vec<RawRecord>, RetrievalError> {
        self.record(format!("list:{zone}"));
        Ok(self.records.get(zone).cloned().unwrap_or_default())
    }

    async fn tsig_key(&self, name: &str) -> Result<Option<TsigKey>, RetrievalError> {
        self.record(format!("tsig_key:{name}"));
        Ok(self.tsig_keys.get(name).cloned())
    }
}

/// Target provider state, inspectable after a run.
#[derive(Debug, Clone, Default)]
pub struct TargetState {
    pub zones: Vec<TargetZone>,
    /// Keyed by (zone id, owner, type)
    pub record_sets: BTreeMap<(String, String, String), RecordSet>,
    pub tsig_keys: Vec<TargetTsigKey>,
    /// Secrets of created keys by key id
    pub tsig_secrets: BTreeMap<String, String>,
    pub calls: Vec<String>,
    next_id: u32,
}

impl TargetState {
    fn next_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("ocid1.{kind}.test.{}", self.next_id)
    }
}

#[derive(Default)]
pub struct FakeTarget {
    state: Mutex<TargetState>,
    reject: Option<(String, String)>,
}

impl FakeTarget {
    pub fn with_zone(self, name: &str, zone_type: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = state.next_id("dns-zone");
            state.zones.push(TargetZone {
                id,
                name: name.to_string(),
                zone_type: zone_type.to_string(),
                lifecycle_state: LifecycleState::Active,
                external_masters: Vec::new(),
            });
        }
        self
    }

    pub fn with_tsig_key(self, name: &str, state: LifecycleState) -> Self {
        {
            let mut target = self.state.lock().unwrap();
            let id = target.next_id("dnstsigkey");
            target.tsig_keys.push(TargetTsigKey {
                id,
                name: name.to_string(),
                algorithm: "hmac-sha256".to_string(),
                compartment: COMPARTMENT.to_string(),
                lifecycle_state: state,
            });
        }
        self
    }

    /// Reject writes of the record set at (owner, type).
    pub fn rejecting(mut self, owner: &str, rtype: &str) -> Self {
        self.reject = Some((owner.to_string(), rtype.to_string()));
        self
    }

    pub fn snapshot(&self) -> TargetState {
        self.state.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.snapshot()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl TargetProvider for FakeTarget {
    async fn find_zone(
        &self,
        name: &str,
        compartment: &str,
    ) -> Result<Option<TargetZone>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("find_zone:{name}:{compartment}"));
        Ok(state.zones.iter().find(|z| z.name == name).cloned())
    }

    async fn create_zone(&self, spec: &ZoneSpec) -> Result<TargetZone, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_zone:{}", spec.name));
        let zone = TargetZone {
            id: state.next_id("dns-zone"),
            name: spec.name.clone(),
            zone_type: spec.zone_type.clone(),
            lifecycle_state: LifecycleState::Active,
            external_masters: spec.external_masters.clone(),
        };
        state.zones.push(zone.clone());
        Ok(zone)
    }

    async fn update_external_masters(
        &self,
        zone_id: &str,
        masters: &[ExternalMaster],
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("update_masters:{zone_id}"));
        let zone = state
            .zones
            .iter_mut()
            .find(|z| z.id == zone_id)
            .ok_or_else(|| ProviderError::http(404, None, "zone not found"))?;
        zone.external_masters = masters.to_vec();
        Ok(())
    }

    async fn replace_record_set(&self, zone_id: &str, set: &RecordSet) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(format!("replace:{}:{}", set.owner, set.rtype));
        if self.reject.as_ref() == Some(&(set.owner.clone(), set.rtype.clone())) {
            return Err(ProviderError::http(400, Some("req-1".to_string()), "invalid rdata")
                .with_code("InvalidParameter"));
        }
        state.record_sets.insert(
            (zone_id.to_string(), set.owner.clone(), set.rtype.clone()),
            set.clone(),
        );
        Ok(())
    }

    async fn find_tsig_key(
        &self,
        name: &str,
        compartment: &str,
    ) -> Result<Option<TargetTsigKey>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("find_tsig_key:{name}:{compartment}"));
        Ok(state
            .tsig_keys
            .iter()
            .find(|k| k.name == name && k.compartment == compartment)
            .cloned())
    }

    async fn create_tsig_key(
        &self,
        key: &TsigKey,
        compartment: &str,
    ) -> Result<TargetTsigKey, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_tsig_key:{}", key.name));
        let created = TargetTsigKey {
            id: state.next_id("dnstsigkey"),
            name: key.name.clone(),
            algorithm: key.algorithm.as_str().to_string(),
            compartment: compartment.to_string(),
            lifecycle_state: LifecycleState::Active,
        };
        state
            .tsig_secrets
            .insert(created.id.clone(), key.secret.expose().to_string());
        state.tsig_keys.push(created.clone());
        Ok(created)
    }
}

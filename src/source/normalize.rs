// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Canonicalization of source records.
//!
//! - owner and rdata names lowercased, trailing dot stripped, `@` expanded to the apex
//! - a missing TTL replaced by the zone's SOA minimum
//! - exact duplicates removed (AXFR repeats the SOA at the end of the stream)
//! - records outside the zone rejected
//! - output ordered with the SOA first, then by owner, type and rdata

use crate::migration_errors::RetrievalError;
use crate::records::{normalize_name, RawRecord, RecordData, ResourceRecord};

/// Normalize a zone's raw records.
///
/// # Errors
///
/// Returns [`RetrievalError::MissingSoa`] if a record has no TTL and the zone
/// has no SOA to default it from, or [`RetrievalError::MalformedRecord`] for
/// records whose owner lies outside the zone.
pub fn normalize_records(
    zone: &str,
    raw: Vec<RawRecord>,
) -> Result<Vec<ResourceRecord>, RetrievalError> {
    let apex = normalize_name(zone);
    let soa_minimum = raw.iter().find_map(|r| match r.data {
        RecordData::Soa { minimum, .. } => Some(minimum),
        _ => None,
    });

    let mut records = Vec::with_capacity(raw.len());
    for record in raw {
        let owner = canonical_owner(&record.owner, &apex);
        if !in_zone(&owner, &apex) {
            return Err(RetrievalError::MalformedRecord {
                zone: apex.clone(),
                owner,
                rtype: record.data.rtype().to_string(),
                reason: "owner name is outside the zone".to_string(),
            });
        }

        let ttl = match record.ttl {
            Some(ttl) => ttl,
            None => soa_minimum.ok_or_else(|| RetrievalError::MissingSoa { zone: apex.clone() })?,
        };

        records.push(ResourceRecord {
            owner,
            ttl,
            data: canonical_data(record.data),
        });
    }

    records.sort_by(|a, b| {
        let a_rest = !matches!(a.data, RecordData::Soa { .. });
        let b_rest = !matches!(b.data, RecordData::Soa { .. });
        (a_rest, &a.owner, a.rtype(), &a.data).cmp(&(b_rest, &b.owner, b.rtype(), &b.data))
    });
    // Duplicates keep the largest TTL seen.
    records.dedup_by(|later, kept| {
        if later.owner == kept.owner && later.data == kept.data {
            kept.ttl = kept.ttl.max(later.ttl);
            true
        } else {
            false
        }
    });

    Ok(records)
}

fn canonical_owner(owner: &str, apex: &str) -> String {
    let owner = owner.trim();
    if owner.is_empty() || owner == "@" {
        apex.to_string()
    } else {
        normalize_name(owner)
    }
}

fn in_zone(owner: &str, apex: &str) -> bool {
    apex.is_empty()
        || owner == apex
        || owner
            .strip_suffix(apex)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Canonicalize the domain-name fields of record data.
#[must_use]
pub fn canonical_data(data: RecordData) -> RecordData {
    match data {
        RecordData::Cname(target) => RecordData::Cname(normalize_name(&target)),
        RecordData::Ns(target) => RecordData::Ns(normalize_name(&target)),
        RecordData::Ptr(target) => RecordData::Ptr(normalize_name(&target)),
        RecordData::Mx {
            preference,
            exchange,
        } => RecordData::Mx {
            preference,
            exchange: normalize_name(&exchange),
        },
        RecordData::Srv {
            priority,
            weight,
            port,
            target,
        } => RecordData::Srv {
            priority,
            weight,
            port,
            target: normalize_name(&target),
        },
        RecordData::Naptr {
            order,
            preference,
            flags,
            services,
            regexp,
            replacement,
        } => RecordData::Naptr {
            order,
            preference,
            flags,
            services,
            regexp,
            replacement: normalize_name(&replacement),
        },
        RecordData::Soa {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        } => RecordData::Soa {
            mname: normalize_name(&mname),
            rname: normalize_name(&rname),
            serial,
            refresh,
            retry,
            expire,
            minimum,
        },
        other => other,
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod normalize_tests;

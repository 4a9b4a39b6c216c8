// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Translation of normalized records into target record sets.
//!
//! Records are grouped by (owner, type). Each group becomes one [`RecordSet`]
//! whose TTL is the largest TTL in the group and whose rdata is rendered in
//! presentation format, deduplicated and sorted. Output order is
//! (owner, type), so permutations of the same input translate identically.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::constants::TXT_MAX_STRING_LEN;
use crate::migration_errors::TranslationError;
use crate::records::{RecordData, RecordSet, ResourceRecord};

/// Translate a zone's records into record sets.
///
/// # Errors
///
/// Returns [`TranslationError::UnsupportedType`] for records that are not
/// plain DNS data and [`TranslationError::CnameConflict`] when a CNAME shares
/// its owner with other data.
pub fn translate(records: &[ResourceRecord]) -> Result<Vec<RecordSet>, TranslationError> {
    let mut sorted: Vec<&ResourceRecord> = records.iter().collect();
    sorted.sort();

    let mut groups: BTreeMap<(String, String), (u32, BTreeSet<String>)> = BTreeMap::new();
    for record in sorted {
        let rdata = render(record)?;
        let entry = groups
            .entry((record.owner.clone(), record.rtype().to_string()))
            .or_insert_with(|| (record.ttl, BTreeSet::new()));
        entry.0 = entry.0.max(record.ttl);
        entry.1.insert(rdata);
    }

    check_cnames(&groups)?;

    Ok(groups
        .into_iter()
        .map(|((owner, rtype), (ttl, rdata))| RecordSet {
            owner,
            rtype,
            ttl,
            rdata: rdata.into_iter().collect(),
        })
        .collect())
}

fn check_cnames(
    groups: &BTreeMap<(String, String), (u32, BTreeSet<String>)>,
) -> Result<(), TranslationError> {
    let mut types_by_owner: BTreeMap<&str, usize> = BTreeMap::new();
    for (owner, _) in groups.keys() {
        *types_by_owner.entry(owner.as_str()).or_default() += 1;
    }

    for ((owner, rtype), (_, rdata)) in groups {
        let types_at_owner = types_by_owner.get(owner.as_str()).copied().unwrap_or(0);
        if rtype == "CNAME" && (rdata.len() > 1 || types_at_owner > 1) {
            return Err(TranslationError::CnameConflict {
                owner: owner.clone(),
            });
        }
    }
    Ok(())
}

/// Render one record's rdata in presentation format.
///
/// # Errors
///
/// Returns [`TranslationError::UnsupportedType`] for [`RecordData::Unsupported`].
pub fn render(record: &ResourceRecord) -> Result<String, TranslationError> {
    let text = match &record.data {
        RecordData::A(addr) => addr.to_string(),
        RecordData::Aaaa(addr) => addr.to_string(),
        RecordData::Caa { flags, tag, value } => {
            format!("{flags} {tag} {}", quote(value))
        }
        RecordData::Cname(target) | RecordData::Ns(target) | RecordData::Ptr(target) => fqdn(target),
        RecordData::Ds {
            key_tag,
            algorithm,
            digest_type,
            digest,
        } => format!("{key_tag} {algorithm} {digest_type} {digest}"),
        RecordData::Mx {
            preference,
            exchange,
        } => format!("{preference} {}", fqdn(exchange)),
        RecordData::Naptr {
            order,
            preference,
            flags,
            services,
            regexp,
            replacement,
        } => format!(
            "{order} {preference} {} {} {} {}",
            quote(flags),
            quote(services),
            quote(regexp),
            fqdn(replacement)
        ),
        RecordData::Soa {
            mname,
            rname,
            serial,
            refresh,
            retry,
            expire,
            minimum,
        } => format!(
            "{} {} {serial} {refresh} {retry} {expire} {minimum}",
            fqdn(mname),
            fqdn(rname)
        ),
        RecordData::Spf(strings) | RecordData::Txt(strings) => character_strings(strings),
        RecordData::Srv {
            priority,
            weight,
            port,
            target,
        } => format!("{priority} {weight} {port} {}", fqdn(target)),
        RecordData::Sshfp {
            algorithm,
            fp_type,
            fingerprint,
        } => format!("{algorithm} {fp_type} {fingerprint}"),
        RecordData::Tlsa {
            cert_usage,
            selector,
            matching_type,
            cert_data,
        } => format!("{cert_usage} {selector} {matching_type} {cert_data}"),
        RecordData::Unsupported { rtype, reason } => {
            return Err(TranslationError::UnsupportedType {
                owner: record.owner.clone(),
                rtype: rtype.clone(),
                reason: reason.clone(),
            })
        }
    };
    Ok(text)
}

/// Absolute form of a canonical name. The root is `.`.
#[must_use]
pub fn fqdn(name: &str) -> String {
    if name.is_empty() {
        ".".to_string()
    } else {
        format!("{name}.")
    }
}

/// Quoted character-strings, long strings split into 255-octet chunks.
fn character_strings(strings: &[Vec<u8>]) -> String {
    strings
        .iter()
        .flat_map(|s| split_character_string(s))
        .map(quote)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split into pieces of at most 255 octets. An empty string stays one piece.
#[must_use]
pub fn split_character_string(octets: &[u8]) -> Vec<&[u8]> {
    if octets.is_empty() {
        return vec![octets];
    }
    octets.chunks(TXT_MAX_STRING_LEN).collect()
}

/// Double-quote a character-string, escaping `"`, `\` and every octet
/// outside printable ASCII as `\DDD`.
#[must_use]
pub fn quote(octets: &[u8]) -> String {
    let mut out = String::with_capacity(octets.len() + 2);
    out.push('"');
    for &byte in octets {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b' '..=b'~' => out.push(char::from(byte)),
            _ => {
                let _ = write!(out, "\\{byte:03}");
            }
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
#[path = "translate_tests.rs"]
mod translate_tests;

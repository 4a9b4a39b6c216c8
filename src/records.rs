// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Provider-independent DNS record model.
//!
//! Both source retrieval paths (Dyn management API and AXFR) produce
//! [`RawRecord`]s carrying a typed [`RecordData`]. The source reader normalizes
//! them into [`ResourceRecord`]s, and the translator groups those into
//! [`RecordSet`]s, the unit of write to the target provider.
//!
//! Records that are provider value-added artifacts (Dyn ALIAS, HTTP redirects,
//! traffic-management owned records) or DNSSEC signing material are carried as
//! [`RecordData::Unsupported`] so that they are reported instead of dropped.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Type-specific record data.
///
/// Domain-name fields hold names as the provider returned them until the
/// source reader canonicalizes them. Character-string fields hold the raw
/// octets, which need not be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Caa {
        flags: u8,
        tag: String,
        value: Vec<u8>,
    },
    Cname(String),
    Ds {
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: String,
    },
    Mx {
        preference: u16,
        exchange: String,
    },
    Naptr {
        order: u16,
        preference: u16,
        flags: Vec<u8>,
        services: Vec<u8>,
        regexp: Vec<u8>,
        replacement: String,
    },
    Ns(String),
    Ptr(String),
    Soa {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    Spf(Vec<Vec<u8>>),
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    Sshfp {
        algorithm: u8,
        fp_type: u8,
        fingerprint: String,
    },
    Tlsa {
        cert_usage: u8,
        selector: u8,
        matching_type: u8,
        cert_data: String,
    },
    Txt(Vec<Vec<u8>>),
    /// A record that cannot be migrated as plain DNS data
    Unsupported {
        rtype: String,
        reason: String,
    },
}

impl RecordData {
    /// Record type mnemonic (e.g. `"AAAA"`).
    #[must_use]
    pub fn rtype(&self) -> &str {
        match self {
            Self::A(_) => "A",
            Self::Aaaa(_) => "AAAA",
            Self::Caa { .. } => "CAA",
            Self::Cname(_) => "CNAME",
            Self::Ds { .. } => "DS",
            Self::Mx { .. } => "MX",
            Self::Naptr { .. } => "NAPTR",
            Self::Ns(_) => "NS",
            Self::Ptr(_) => "PTR",
            Self::Soa { .. } => "SOA",
            Self::Spf(_) => "SPF",
            Self::Srv { .. } => "SRV",
            Self::Sshfp { .. } => "SSHFP",
            Self::Tlsa { .. } => "TLSA",
            Self::Txt(_) => "TXT",
            Self::Unsupported { rtype, .. } => rtype,
        }
    }

    /// Parse presentation-format rdata (RFC 1035 master file syntax).
    ///
    /// Types that are not plain DNS data yield [`RecordData::Unsupported`];
    /// an `Err` means the rdata of a supported type could not be decoded.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the rdata is malformed.
    pub fn from_presentation(rtype: &str, text: &str) -> Result<Self, String> {
        let rtype = rtype.trim().to_ascii_uppercase();
        if let Some(reason) = unsupported_reason(&rtype) {
            return Ok(Self::Unsupported {
                rtype,
                reason: reason.to_string(),
            });
        }

        let tokens = tokenize(text)?;
        let octets = |i: usize| -> Result<Vec<u8>, String> {
            tokens
                .get(i)
                .cloned()
                .ok_or_else(|| format!("missing field {} in '{text}'", i + 1))
        };
        let field = |i: usize| -> Result<String, String> {
            String::from_utf8(octets(i)?)
                .map_err(|_| format!("field {} in '{text}' is not valid UTF-8", i + 1))
        };

        let data = match rtype.as_str() {
            "A" => Self::A(parse_num(&field(0)?)?),
            "AAAA" => Self::Aaaa(parse_num(&field(0)?)?),
            "CAA" => Self::Caa {
                flags: parse_num(&field(0)?)?,
                tag: field(1)?.to_ascii_lowercase(),
                value: octets(2)?,
            },
            "CNAME" => Self::Cname(field(0)?),
            "DS" => Self::Ds {
                key_tag: parse_num(&field(0)?)?,
                algorithm: parse_num(&field(1)?)?,
                digest_type: parse_num(&field(2)?)?,
                digest: joined_hex(&tokens, 3, text)?,
            },
            "MX" => Self::Mx {
                preference: parse_num(&field(0)?)?,
                exchange: field(1)?,
            },
            "NAPTR" => Self::Naptr {
                order: parse_num(&field(0)?)?,
                preference: parse_num(&field(1)?)?,
                flags: octets(2)?,
                services: octets(3)?,
                regexp: octets(4)?,
                replacement: field(5)?,
            },
            "NS" => Self::Ns(field(0)?),
            "PTR" => Self::Ptr(field(0)?),
            "SOA" => Self::Soa {
                mname: field(0)?,
                rname: field(1)?,
                serial: parse_num(&field(2)?)?,
                refresh: parse_num(&field(3)?)?,
                retry: parse_num(&field(4)?)?,
                expire: parse_num(&field(5)?)?,
                minimum: parse_num(&field(6)?)?,
            },
            "SPF" => Self::Spf(non_empty(&tokens, text)?),
            "SRV" => Self::Srv {
                priority: parse_num(&field(0)?)?,
                weight: parse_num(&field(1)?)?,
                port: parse_num(&field(2)?)?,
                target: field(3)?,
            },
            "SSHFP" => Self::Sshfp {
                algorithm: parse_num(&field(0)?)?,
                fp_type: parse_num(&field(1)?)?,
                fingerprint: joined_hex(&tokens, 2, text)?,
            },
            "TLSA" => Self::Tlsa {
                cert_usage: parse_num(&field(0)?)?,
                selector: parse_num(&field(1)?)?,
                matching_type: parse_num(&field(2)?)?,
                cert_data: joined_hex(&tokens, 3, text)?,
            },
            "TXT" => Self::Txt(non_empty(&tokens, text)?),
            other => Self::Unsupported {
                rtype: other.to_string(),
                reason: "record type has no equivalent in the target provider".to_string(),
            },
        };

        Ok(data)
    }
}

/// Why a record type cannot be migrated as plain record data, if it cannot.
///
/// Covers Dyn value-added record types and DNSSEC signing material, which the
/// target provider generates itself.
#[must_use]
pub fn unsupported_reason(rtype: &str) -> Option<&'static str> {
    match rtype.to_ascii_uppercase().as_str() {
        "ALIAS" | "ANAME" => Some("apex ALIAS flattening is a Dyn value-added service"),
        "HTTPREDIRECT" | "WEBFWD" | "URL" => Some("HTTP redirect is a Dyn value-added service"),
        "RRSIG" | "NSEC" | "NSEC3" | "NSEC3PARAM" | "DNSKEY" | "CDS" | "CDNSKEY" => {
            Some("DNSSEC signing material must be regenerated by the target provider")
        }
        _ => None,
    }
}

fn non_empty(tokens: &[Vec<u8>], text: &str) -> Result<Vec<Vec<u8>>, String> {
    if tokens.is_empty() {
        Err(format!("no character-strings in '{text}'"))
    } else {
        Ok(tokens.to_vec())
    }
}

/// Hex blobs may be split over several whitespace-separated fields.
fn joined_hex(tokens: &[Vec<u8>], from: usize, text: &str) -> Result<String, String> {
    let joined = String::from_utf8(tokens.get(from..).unwrap_or_default().concat())
        .map_err(|_| format!("invalid hex data in '{text}'"))?;
    if joined.is_empty() {
        Err(format!("missing hex data in '{text}'"))
    } else {
        Ok(joined.to_ascii_uppercase())
    }
}

fn parse_num<T>(field: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    field
        .parse::<T>()
        .map_err(|e| format!("invalid value '{field}': {e}"))
}

/// Canonical form of a domain name: trimmed, lowercase, no trailing dot.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Split presentation-format rdata into fields of raw octets.
///
/// Double-quoted strings form one field with `\"`, `\\` and `\DDD` escapes
/// resolved; unquoted fields are split on whitespace. A `\DDD` escape is one
/// octet, so escaped UTF-8 sequences come back byte for byte.
///
/// # Errors
///
/// Returns an error on an unterminated quote or a bad decimal escape.
pub fn tokenize(text: &str) -> Result<Vec<Vec<u8>>, String> {
    let mut tokens = Vec::new();
    let mut bytes = text.bytes().peekable();

    while let Some(&b) = bytes.peek() {
        if b.is_ascii_whitespace() {
            bytes.next();
            continue;
        }

        let mut token = Vec::new();
        if b == b'"' {
            bytes.next();
            let mut closed = false;
            while let Some(b) = bytes.next() {
                match b {
                    b'"' => {
                        closed = true;
                        break;
                    }
                    b'\\' => token.push(unescape(&mut bytes)?),
                    other => token.push(other),
                }
            }
            if !closed {
                return Err(format!("unterminated quoted string in '{text}'"));
            }
        } else {
            while let Some(&b) = bytes.peek() {
                if b.is_ascii_whitespace() {
                    break;
                }
                bytes.next();
                if b == b'\\' {
                    token.push(unescape(&mut bytes)?);
                } else {
                    token.push(b);
                }
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

fn unescape(bytes: &mut impl Iterator<Item = u8>) -> Result<u8, String> {
    let first = bytes.next().ok_or("dangling escape")?;
    if !first.is_ascii_digit() {
        return Ok(first);
    }
    let mut digits = String::from(char::from(first));
    for _ in 0..2 {
        match bytes.next() {
            Some(d) if d.is_ascii_digit() => digits.push(char::from(d)),
            _ => return Err(format!("bad decimal escape '\\{digits}'")),
        }
    }
    digits
        .parse::<u8>()
        .map_err(|_| format!("decimal escape '\\{digits}' out of range"))
}

/// A record as returned by a source provider, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Owner name as the provider returned it
    pub owner: String,
    /// TTL, `None` when the provider omitted it (or reported 0 for "zone default")
    pub ttl: Option<u32>,
    /// Typed rdata
    pub data: RecordData,
}

/// A normalized resource record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRecord {
    /// Owner FQDN in canonical form
    pub owner: String,
    /// TTL in seconds
    pub ttl: u32,
    /// Typed rdata
    pub data: RecordData,
}

impl ResourceRecord {
    /// Record type mnemonic.
    #[must_use]
    pub fn rtype(&self) -> &str {
        self.data.rtype()
    }
}

/// All records sharing an owner and type, in the target provider's schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordSet {
    /// Owner FQDN (canonical, no trailing dot)
    pub owner: String,
    /// Record type mnemonic
    pub rtype: String,
    /// TTL applied to every item in the set
    pub ttl: u32,
    /// Target presentation-format rdata, sorted and deduplicated
    pub rdata: Vec<String>,
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;

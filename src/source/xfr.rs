// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Authoritative zone transfer (AXFR) over TCP.
//!
//! hickory-client is synchronous, so the transfer runs on a blocking thread.
//! Answers are converted into [`RawRecord`]s; the trailing SOA that closes
//! the AXFR stream is left in place and removed by normalization.

use hickory_client::client::{Client, SyncClient};
use hickory_client::rr::{Name, RData, Record};
use hickory_client::tcp::TcpClientConnection;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::{DNS_PORT, ZONE_TRANSFER_TIMEOUT_SECS};
use crate::migration_errors::RetrievalError;
use crate::records::{RawRecord, RecordData};
use crate::tsig::{create_tsig_signer, TsigKey};

/// AXFR client for one transfer endpoint.
#[derive(Debug, Clone)]
pub struct ZoneTransferClient {
    server: String,
    timeout: Duration,
    tsig: Option<TsigKey>,
}

impl ZoneTransferClient {
    /// Client for `server` (`host` or `host:port`, port defaults to 53).
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            timeout: Duration::from_secs(ZONE_TRANSFER_TIMEOUT_SECS),
            tsig: None,
        }
    }

    /// Sign transfer requests with a TSIG key.
    #[must_use]
    pub fn with_tsig(mut self, key: TsigKey) -> Self {
        self.tsig = Some(key);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Transfer a zone.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::TransferRefused`] on REFUSED/NOTAUTH,
    /// [`RetrievalError::AuthenticationFailed`] on TSIG errors and
    /// [`RetrievalError::TransferFailed`] for everything else.
    pub async fn transfer(&self, zone: &str) -> Result<Vec<RawRecord>, RetrievalError> {
        let addr = self.resolve(zone).await?;
        let zone_name = zone.to_string();
        let server = self.server.clone();
        let timeout = self.timeout;
        let tsig = self.tsig.clone();

        info!(zone = %zone, server = %server, address = %addr, signed = tsig.is_some(), "Starting AXFR");

        let records = tokio::task::spawn_blocking(move || {
            transfer_blocking(&zone_name, &server, addr, timeout, tsig.as_ref())
        })
        .await
        .map_err(|e| RetrievalError::TransferFailed {
            zone: zone.to_string(),
            server: self.server.clone(),
            reason: format!("transfer task failed: {e}"),
        })??;

        debug!(zone = %zone, records = records.len(), "AXFR complete");
        Ok(records)
    }

    async fn resolve(&self, zone: &str) -> Result<SocketAddr, RetrievalError> {
        if let Ok(addr) = self.server.parse::<SocketAddr>() {
            return Ok(addr);
        }

        let (host, port) = match self.server.rsplit_once(':') {
            Some((host, port)) => match port.parse::<u16>() {
                Ok(port) => (host.to_string(), port),
                Err(_) => (self.server.clone(), DNS_PORT),
            },
            None => (self.server.clone(), DNS_PORT),
        };

        let mut addrs = tokio::net::lookup_host((host.as_str(), port))
            .await
            .map_err(|e| RetrievalError::TransferFailed {
                zone: zone.to_string(),
                server: self.server.clone(),
                reason: format!("cannot resolve transfer server: {e}"),
            })?;
        let addr = addrs.next().ok_or_else(|| RetrievalError::TransferFailed {
            zone: zone.to_string(),
            server: self.server.clone(),
            reason: "transfer server resolved to no addresses".to_string(),
        })?;
        Ok(addr)
    }
}

fn transfer_blocking(
    zone: &str,
    server: &str,
    addr: SocketAddr,
    timeout: Duration,
    tsig: Option<&TsigKey>,
) -> Result<Vec<RawRecord>, RetrievalError> {
    let failed = |reason: String| RetrievalError::TransferFailed {
        zone: zone.to_string(),
        server: server.to_string(),
        reason,
    };

    let origin = Name::from_str(zone).map_err(|e| failed(format!("invalid zone name: {e}")))?;
    let conn = TcpClientConnection::with_timeout(addr, timeout)
        .map_err(|e| failed(format!("cannot connect: {e}")))?;

    let client = match tsig {
        Some(key) => {
            let signer = create_tsig_signer(key).map_err(|e| RetrievalError::AuthenticationFailed {
                zone: zone.to_string(),
                reason: format!("unusable TSIG key '{}': {e:#}", key.name),
            })?;
            SyncClient::with_tsigner(conn, signer)
        }
        None => SyncClient::new(conn),
    };

    let stream = client
        .zone_transfer(&origin, None)
        .map_err(|e| classify_client_error(zone, server, &e.to_string()))?;

    let mut records = Vec::new();
    for response in stream {
        let response = response.map_err(|e| classify_client_error(zone, server, &e.to_string()))?;
        if let Some(err) = response_code_error(zone, server, u16::from(response.response_code())) {
            return Err(err);
        }
        for record in response.answers() {
            records.push(convert_record(zone, record)?);
        }
    }

    if records.is_empty() {
        return Err(failed("transfer returned no records".to_string()));
    }

    Ok(records)
}

/// Map a non-zero DNS response code to a retrieval error.
///
/// REFUSED (5) and NOTAUTH (9) mean the requesting address is not allowed to
/// transfer the zone. BADSIG/BADKEY/BADTIME (16-18) are TSIG failures.
#[must_use]
pub fn response_code_error(zone: &str, server: &str, code: u16) -> Option<RetrievalError> {
    match code {
        0 => None,
        5 | 9 => Some(RetrievalError::TransferRefused {
            zone: zone.to_string(),
            server: server.to_string(),
        }),
        16..=18 => Some(RetrievalError::AuthenticationFailed {
            zone: zone.to_string(),
            reason: format!("TSIG verification failed (rcode {code})"),
        }),
        other => Some(RetrievalError::TransferFailed {
            zone: zone.to_string(),
            server: server.to_string(),
            reason: format!("server answered rcode {other}"),
        }),
    }
}

/// Classify a client-side error message.
///
/// hickory surfaces some negative answers as errors instead of responses.
fn classify_client_error(zone: &str, server: &str, message: &str) -> RetrievalError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("refused") || lower.contains("notauth") {
        RetrievalError::TransferRefused {
            zone: zone.to_string(),
            server: server.to_string(),
        }
    } else if lower.contains("badsig") || lower.contains("badkey") || lower.contains("badtime") {
        RetrievalError::AuthenticationFailed {
            zone: zone.to_string(),
            reason: message.to_string(),
        }
    } else {
        RetrievalError::TransferFailed {
            zone: zone.to_string(),
            server: server.to_string(),
            reason: message.to_string(),
        }
    }
}

fn convert_record(zone: &str, record: &Record) -> Result<RawRecord, RetrievalError> {
    let owner = record.name().to_string();
    let rtype = record.record_type().to_string();

    let data = match record.data() {
        Some(RData::A(a)) => RecordData::A(a.0),
        Some(RData::AAAA(aaaa)) => RecordData::Aaaa(aaaa.0),
        Some(RData::CNAME(cname)) => RecordData::Cname(cname.0.to_string()),
        Some(RData::NS(ns)) => RecordData::Ns(ns.0.to_string()),
        Some(RData::PTR(ptr)) => RecordData::Ptr(ptr.0.to_string()),
        Some(RData::MX(mx)) => RecordData::Mx {
            preference: mx.preference(),
            exchange: mx.exchange().to_string(),
        },
        Some(RData::TXT(txt)) => RecordData::Txt(txt.txt_data().iter().map(|b| b.to_vec()).collect()),
        Some(other) => RecordData::from_presentation(&rtype, &other.to_string()).map_err(|reason| {
            RetrievalError::MalformedRecord {
                zone: zone.to_string(),
                owner: owner.clone(),
                rtype: rtype.clone(),
                reason,
            }
        })?,
        None => {
            return Err(RetrievalError::MalformedRecord {
                zone: zone.to_string(),
                owner,
                rtype,
                reason: "record has no data".to_string(),
            })
        }
    };

    Ok(RawRecord {
        owner,
        ttl: Some(record.ttl()),
        data,
    })
}

#[cfg(test)]
#[path = "xfr_tests.rs"]
mod xfr_tests;

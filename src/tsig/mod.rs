// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TSIG key types and reconciliation.
//!
//! - [`TsigKey`] - key material read from the source provider
//! - [`TsigKeyRef`] - handle to a key that exists in the target provider
//! - [`TsigReconciler`] - makes sure a secondary zone's key exists in the target
//!
//! Secrets are wrapped in [`TsigSecret`], whose `Debug` output is redacted so
//! that key material never reaches logs.

pub mod reconciler;

pub use reconciler::TsigReconciler;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hickory_client::rr::rdata::tsig::TsigAlgorithm as HickoryTsigAlgorithm;
use hickory_client::rr::Name;
use hickory_proto::rr::dnssec::tsig::TSigner;
use std::fmt;
use std::str::FromStr;

use crate::constants::TSIG_FUDGE_TIME_SECS;

/// HMAC algorithm of a TSIG key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TsigAlgorithm {
    HmacMd5,
    HmacSha1,
    HmacSha224,
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

impl TsigAlgorithm {
    /// Algorithm name as used by BIND, Dyn and OCI (`hmac-sha256`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacMd5 => "hmac-md5",
            Self::HmacSha1 => "hmac-sha1",
            Self::HmacSha224 => "hmac-sha224",
            Self::HmacSha256 => "hmac-sha256",
            Self::HmacSha384 => "hmac-sha384",
            Self::HmacSha512 => "hmac-sha512",
        }
    }
}

impl FromStr for TsigAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().trim_end_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "hmac-md5" | "hmac-md5.sig-alg.reg.int" => Ok(Self::HmacMd5),
            "hmac-sha1" => Ok(Self::HmacSha1),
            "hmac-sha224" => Ok(Self::HmacSha224),
            "hmac-sha256" => Ok(Self::HmacSha256),
            "hmac-sha384" => Ok(Self::HmacSha384),
            "hmac-sha512" => Ok(Self::HmacSha512),
            _ => anyhow::bail!(
                "Unsupported TSIG algorithm '{s}'. Supported algorithms: hmac-md5, hmac-sha1, \
                 hmac-sha224, hmac-sha256, hmac-sha384, hmac-sha512"
            ),
        }
    }
}

impl fmt::Display for TsigAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base64-encoded TSIG shared secret.
#[derive(Clone, PartialEq, Eq)]
pub struct TsigSecret(String);

impl TsigSecret {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The encoded secret. Only for building provider requests and signers.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for TsigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TsigSecret(<redacted>)")
    }
}

/// TSIG key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsigKey {
    /// Key name
    pub name: String,
    /// HMAC algorithm
    pub algorithm: TsigAlgorithm,
    /// Shared secret
    pub secret: TsigSecret,
}

/// A TSIG key that exists in the target provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsigKeyRef {
    /// Target-side identifier (OCI OCID)
    pub id: String,
    /// Key name, unique within the compartment
    pub name: String,
    /// Compartment holding the key
    pub compartment: String,
}

/// Create a hickory TSIG signer from key material.
///
/// # Errors
///
/// Returns an error if the secret is not valid base64 or the key name is not a valid DNS name.
pub fn create_tsig_signer(key: &TsigKey) -> Result<TSigner> {
    let algorithm = match key.algorithm {
        TsigAlgorithm::HmacMd5 => HickoryTsigAlgorithm::HmacMd5,
        TsigAlgorithm::HmacSha1 => HickoryTsigAlgorithm::HmacSha1,
        TsigAlgorithm::HmacSha224 => HickoryTsigAlgorithm::HmacSha224,
        TsigAlgorithm::HmacSha256 => HickoryTsigAlgorithm::HmacSha256,
        TsigAlgorithm::HmacSha384 => HickoryTsigAlgorithm::HmacSha384,
        TsigAlgorithm::HmacSha512 => HickoryTsigAlgorithm::HmacSha512,
    };

    let key_bytes = BASE64
        .decode(key.secret.expose().trim())
        .context("Failed to decode TSIG key")?;

    let signer = TSigner::new(
        key_bytes,
        algorithm,
        Name::from_str(&key.name).context("Invalid TSIG key name")?,
        u16::try_from(TSIG_FUDGE_TIME_SECS).unwrap_or(300),
    )
    .context("Failed to create TSIG signer")?;

    Ok(signer)
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! OCI HTTP request signing.
//!
//! OCI authenticates API calls with draft-cavage HTTP signatures using
//! RSA-SHA256. The signing string is built from these headers, in order:
//!
//! | Request       | Signed headers                                                            |
//! |---------------|---------------------------------------------------------------------------|
//! | without body  | `date (request-target) host`                                              |
//! | with body     | `date (request-target) host content-length content-type x-content-sha256` |
//!
//! The signature goes into the `authorization` header:
//!
//! ```text
//! Signature version="1",keyId="<tenancy>/<user>/<fingerprint>",algorithm="rsa-sha256",
//!           headers="date (request-target) host",signature="<base64>"
//! ```

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use sha2::{Digest, Sha256};
use url::Url;

/// Content type of every OCI request body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Signs OCI API requests with an API signing key.
pub struct OciSigner {
    key_id: String,
    key: RsaKeyPair,
    rng: SystemRandom,
}

impl std::fmt::Debug for OciSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OciSigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl OciSigner {
    /// Load an unencrypted RSA private key in PEM form.
    ///
    /// Both PKCS#8 (`BEGIN PRIVATE KEY`) and PKCS#1 (`BEGIN RSA PRIVATE KEY`)
    /// encodings are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM is encrypted, malformed, or not an RSA key.
    pub fn from_pem(key_id: impl Into<String>, pem: &str) -> Result<Self> {
        let encrypted = pem.lines().map(str::trim).any(|line| {
            line.starts_with("-----BEGIN ENCRYPTED") || line.starts_with("Proc-Type: 4,ENCRYPTED")
        });
        if encrypted {
            bail!(
                "Encrypted private keys are not supported; decrypt the key first \
                 (openssl rsa -in key.pem -out key-decrypted.pem)"
            );
        }

        let (label, der) = decode_pem(pem)?;
        let key = match label.as_str() {
            "PRIVATE KEY" => RsaKeyPair::from_pkcs8(&der)
                .map_err(|e| anyhow::anyhow!("Invalid PKCS#8 RSA private key: {e}"))?,
            "RSA PRIVATE KEY" => RsaKeyPair::from_der(&der)
                .map_err(|e| anyhow::anyhow!("Invalid PKCS#1 RSA private key: {e}"))?,
            other => bail!("Unsupported PEM block '{other}', expected an RSA private key"),
        };

        Ok(Self {
            key_id: key_id.into(),
            key,
            rng: SystemRandom::new(),
        })
    }

    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Headers to add to a request, including `authorization`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL has no host or signing fails.
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        body: Option<&[u8]>,
        now: DateTime<Utc>,
    ) -> Result<Vec<(&'static str, String)>> {
        let mut headers: Vec<(&'static str, String)> = vec![
            ("date", now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()),
            ("(request-target)", request_target(method, url)),
            ("host", host_header(url)?),
        ];
        if let Some(body) = body {
            headers.push(("content-length", body.len().to_string()));
            headers.push(("content-type", JSON_CONTENT_TYPE.to_string()));
            headers.push(("x-content-sha256", BASE64.encode(Sha256::digest(body))));
        }

        let signing_string = signing_string(&headers);
        let mut signature = vec![0; self.key.public().modulus_len()];
        self.key
            .sign(
                &RSA_PKCS1_SHA256,
                &self.rng,
                signing_string.as_bytes(),
                &mut signature,
            )
            .map_err(|e| anyhow::anyhow!("Failed to sign request: {e}"))?;

        let names: Vec<&str> = headers.iter().map(|(name, _)| *name).collect();
        let authorization = format!(
            "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
            self.key_id,
            names.join(" "),
            BASE64.encode(&signature)
        );

        headers.retain(|(name, _)| *name != "(request-target)");
        headers.push(("authorization", authorization));
        Ok(headers)
    }

    /// DER-encoded public key, for verifying signatures.
    #[must_use]
    pub fn public_key_der(&self) -> &[u8] {
        self.key.public().as_ref()
    }
}

/// `"<method> <path>[?<query>]"` with the method lowercased.
#[must_use]
pub fn request_target(method: &str, url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{} {}?{query}", method.to_ascii_lowercase(), url.path()),
        None => format!("{} {}", method.to_ascii_lowercase(), url.path()),
    }
}

/// Value of the `host` header, with the port when it is not the scheme default.
///
/// # Errors
///
/// Returns an error if the URL has no host.
pub fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .with_context(|| format!("URL '{url}' has no host"))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Newline-joined `name: value` lines.
#[must_use]
pub fn signing_string(headers: &[(&str, String)]) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_pem(pem: &str) -> Result<(String, Vec<u8>)> {
    let mut label = None;
    let mut body = String::new();

    for line in pem.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("-----BEGIN ") {
            label = Some(rest.trim_end_matches('-').to_string());
        } else if line.starts_with("-----END ") {
            break;
        } else if label.is_some() {
            body.push_str(line);
        }
    }

    let label = label.context("No PEM block found in private key file")?;
    let der = BASE64
        .decode(body)
        .context("Private key PEM body is not valid base64")?;
    Ok((label, der))
}

#[cfg(test)]
#[path = "signer_tests.rs"]
mod signer_tests;

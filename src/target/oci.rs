// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! OCI DNS API client.
//!
//! Implements [`TargetProvider`] against the OCI DNS `20180115` REST API.
//! Every request is signed with [`OciSigner`]; transient failures are retried
//! by [`send_with_retry`]. Zone and TSIG key creation are asynchronous on the
//! OCI side, so the client polls the resource until it becomes ACTIVE.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use super::signer::OciSigner;
use super::{ExternalMaster, LifecycleState, TargetProvider, TargetTsigKey, TargetZone, ZoneSpec};
use crate::constants::{
    OCI_DNS_API_VERSION, OCI_MAX_POLL_ATTEMPTS, OCI_POLL_INTERVAL_SECS, OCI_REQUEST_ID_HEADER,
};
use crate::migration_errors::ProviderError;
use crate::records::RecordSet;
use crate::retry::{send_with_retry, BackoffSettings};
use crate::tsig::TsigKey;

/// OCI error body.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Public OCI DNS endpoint of a region.
#[must_use]
pub fn regional_endpoint(region: &str) -> String {
    format!("https://dns.{region}.oraclecloud.com/{OCI_DNS_API_VERSION}")
}

/// Signed client for the OCI DNS API.
pub struct OciDnsClient {
    http: HttpClient,
    base_url: String,
    signer: OciSigner,
    backoff: BackoffSettings,
    poll_interval: Duration,
    max_polls: u32,
}

impl OciDnsClient {
    /// Create a client for `base_url` (e.g. the value of [`regional_endpoint`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, signer: OciSigner) -> Result<Self, ProviderError> {
        let http = HttpClient::builder()
            .build()
            .map_err(|e| ProviderError::transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
            backoff: BackoffSettings::http(),
            poll_interval: Duration::from_secs(OCI_POLL_INTERVAL_SECS),
            max_polls: OCI_MAX_POLL_ATTEMPTS,
        })
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffSettings) -> Self {
        self.backoff = backoff;
        self
    }

    /// Interval and attempt bound of lifecycle polling.
    #[must_use]
    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| ProviderError::transport(format!("Invalid OCI DNS URL: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<T, ProviderError> {
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ProviderError::transport(format!("Failed to encode request: {e}")))?;

        let headers = self
            .signer
            .sign(method.as_str(), &url, payload.as_deref(), Utc::now())
            .map_err(|e| ProviderError::transport(format!("{e:#}")))?;

        debug!(method = %method, url = %url, "OCI DNS API request");

        let response = send_with_retry(self.backoff.for_method(&method), url.path(), || {
            let mut request = self.http.request(method.clone(), url.clone());
            for (name, value) in &headers {
                request = request.header(*name, value);
            }
            if let Some(payload) = &payload {
                request = request.body(payload.clone());
            }
            request.send()
        })
        .await
        .map_err(|e| ProviderError::transport(format!("Failed to send request to {url}: {e}")))?;

        let status = response.status();
        let request_id = response
            .headers()
            .get(OCI_REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response.text().await.map_err(|e| {
            ProviderError::transport(format!("Failed to read OCI DNS response: {e}"))
        })?;

        if !status.is_success() {
            return Err(api_error(&method, &url, status, request_id, &text));
        }

        let body = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(body).map_err(|e| {
            ProviderError {
                status: Some(status.as_u16()),
                request_id,
                code: None,
                message: format!("Failed to decode OCI DNS response: {e}"),
            }
        })
    }

    /// Poll `path` until the resource is ACTIVE.
    async fn wait_until_active<T, F>(&self, path: &str, what: &str, state: F) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> LifecycleState,
    {
        for attempt in 1..=self.max_polls {
            let resource: T = self.send(Method::GET, self.url(path, &[])?, None).await?;
            match state(&resource) {
                LifecycleState::Active => {
                    debug!(resource = %what, attempt = attempt, "Resource is ACTIVE");
                    return Ok(resource);
                }
                LifecycleState::Creating | LifecycleState::Updating => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                other => {
                    return Err(ProviderError::transport(format!(
                        "Unexpected lifecycle state {other} for {what}"
                    )));
                }
            }
        }

        Err(ProviderError::transport(format!(
            "Timed out waiting for {what} to become ACTIVE after {} polls",
            self.max_polls
        )))
    }
}

fn api_error(
    method: &Method,
    url: &Url,
    status: StatusCode,
    request_id: Option<String>,
    text: &str,
) -> ProviderError {
    let parsed: Option<ApiError> = serde_json::from_str(text).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| text.to_string());

    error!(
        method = %method,
        url = %url,
        status = %status,
        request_id = ?request_id,
        error = %message,
        "OCI DNS API request failed"
    );

    let err = ProviderError::http(status.as_u16(), request_id, message);
    match parsed.and_then(|e| e.code) {
        Some(code) => err.with_code(code),
        None => err,
    }
}

fn is_live(state: LifecycleState) -> bool {
    !matches!(state, LifecycleState::Deleted | LifecycleState::Deleting)
}

#[async_trait]
impl TargetProvider for OciDnsClient {
    async fn find_zone(
        &self,
        name: &str,
        compartment: &str,
    ) -> Result<Option<TargetZone>, ProviderError> {
        let url = self.url("/zones", &[("compartmentId", compartment), ("name", name)])?;
        let zones: Vec<TargetZone> = self.send(Method::GET, url, None).await?;

        let Some(summary) = zones
            .into_iter()
            .find(|z| z.name.eq_ignore_ascii_case(name) && is_live(z.lifecycle_state))
        else {
            return Ok(None);
        };

        // Summaries omit externalMasters.
        let zone = self
            .send(Method::GET, self.url(&format!("/zones/{}", summary.id), &[])?, None)
            .await?;
        Ok(Some(zone))
    }

    async fn create_zone(&self, spec: &ZoneSpec) -> Result<TargetZone, ProviderError> {
        let url = self.url("/zones", &[("compartmentId", spec.compartment.as_str())])?;
        let body = json!({
            "name": spec.name,
            "zoneType": spec.zone_type,
            "compartmentId": spec.compartment,
            "externalMasters": spec.external_masters,
        });
        let created: TargetZone = self.send(Method::POST, url, Some(&body)).await?;

        info!(
            zone = %spec.name,
            zone_id = %created.id,
            "Zone creation accepted, waiting for it to become ACTIVE"
        );
        self.wait_until_active(
            &format!("/zones/{}", created.id),
            &format!("zone '{}'", spec.name),
            |z: &TargetZone| z.lifecycle_state,
        )
        .await
    }

    async fn update_external_masters(
        &self,
        zone_id: &str,
        masters: &[ExternalMaster],
    ) -> Result<(), ProviderError> {
        let path = format!("/zones/{zone_id}");
        let body = json!({ "externalMasters": masters });
        let _: TargetZone = self.send(Method::PUT, self.url(&path, &[])?, Some(&body)).await?;
        self.wait_until_active(&path, &format!("zone {zone_id}"), |z: &TargetZone| {
            z.lifecycle_state
        })
        .await?;
        Ok(())
    }

    async fn replace_record_set(&self, zone_id: &str, set: &RecordSet) -> Result<(), ProviderError> {
        let mut url = self.url(&format!("/zones/{zone_id}/records"), &[])?;
        url.path_segments_mut()
            .map_err(|()| ProviderError::transport("OCI DNS URL cannot have path segments"))?
            .push(&set.owner)
            .push(&set.rtype);

        let items: Vec<Value> = set
            .rdata
            .iter()
            .map(|rdata| {
                json!({
                    "domain": set.owner,
                    "rtype": set.rtype,
                    "rdata": rdata,
                    "ttl": set.ttl,
                })
            })
            .collect();

        debug!(owner = %set.owner, rtype = %set.rtype, items = items.len(), "Replacing record set");
        let _: Value = self
            .send(Method::PUT, url, Some(&json!({ "items": items })))
            .await?;
        Ok(())
    }

    async fn find_tsig_key(
        &self,
        name: &str,
        compartment: &str,
    ) -> Result<Option<TargetTsigKey>, ProviderError> {
        let url = self.url("/tsigKeys", &[("compartmentId", compartment), ("name", name)])?;
        let keys: Vec<TargetTsigKey> = self.send(Method::GET, url, None).await?;
        Ok(keys
            .into_iter()
            .find(|k| k.name == name && is_live(k.lifecycle_state)))
    }

    async fn create_tsig_key(
        &self,
        key: &TsigKey,
        compartment: &str,
    ) -> Result<TargetTsigKey, ProviderError> {
        let body = json!({
            "name": key.name,
            "algorithm": key.algorithm.as_str(),
            "secret": key.secret.expose(),
            "compartmentId": compartment,
        });
        let created: TargetTsigKey = self
            .send(Method::POST, self.url("/tsigKeys", &[])?, Some(&body))
            .await?;

        info!(
            key = %key.name,
            key_id = %created.id,
            "TSIG key creation accepted, waiting for it to become ACTIVE"
        );
        self.wait_until_active(
            &format!("/tsigKeys/{}", created.id),
            &format!("TSIG key '{}'", key.name),
            |k: &TargetTsigKey| k.lifecycle_state,
        )
        .await
    }
}

#[cfg(test)]
#[path = "oci_tests.rs"]
mod oci_tests;

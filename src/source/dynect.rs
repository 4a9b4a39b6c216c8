// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Dyn Managed DNS source provider.
//!
//! [`DynectClient`] speaks the Dyn REST API: session login and logout,
//! authenticated GETs and job polling. [`DynectSource`] builds the
//! [`SourceProvider`] operations on top of it, plus AXFR through
//! [`ZoneTransferClient`] for primary zones.
//!
//! Every Dyn response uses the same envelope:
//!
//! ```json
//! { "status": "success", "data": { ... }, "job_id": 123,
//!   "msgs": [{ "INFO": "...", "SOURCE": "BLL", "ERR_CD": null, "LVL": "INFO" }] }
//! ```
//!
//! A `status` of `incomplete` means the request was queued as a job and must
//! be polled at `/REST/Job/{job_id}/`.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::xfr::ZoneTransferClient;
use super::SourceProvider;
use crate::constants::{
    DYNECT_API_URL, DYNECT_AUTH_HEADER, DYNECT_JOB_POLL_INTERVAL_SECS, DYNECT_MAX_JOB_POLLS,
};
use crate::migration_errors::{ProviderError, RetrievalError};
use crate::records::{unsupported_reason, RawRecord, RecordData};
use crate::retry::{send_with_retry, BackoffSettings};
use crate::tsig::{TsigAlgorithm, TsigKey, TsigSecret};
use crate::zone::{SecondaryConfig, ZoneRole};

/// Dyn response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    job_id: Option<u64>,
    #[serde(default)]
    msgs: Vec<EnvelopeMessage>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeMessage {
    #[serde(rename = "INFO", default)]
    info: Option<String>,
    #[serde(rename = "ERR_CD", default)]
    err_cd: Option<String>,
}

impl Envelope {
    fn message(&self) -> String {
        let infos: Vec<&str> = self
            .msgs
            .iter()
            .filter_map(|m| m.info.as_deref())
            .collect();
        if infos.is_empty() {
            format!("Dyn API returned status '{}'", self.status)
        } else {
            infos.join("; ")
        }
    }

    fn error_code(&self) -> Option<&str> {
        self.msgs.iter().find_map(|m| m.err_cd.as_deref())
    }
}

/// Authenticated client for the Dyn REST API.
pub struct DynectClient {
    http: HttpClient,
    base_url: String,
    token: Option<String>,
    backoff: BackoffSettings,
    job_poll_interval: Duration,
}

impl DynectClient {
    /// Create a client for `base_url` (defaults to the public Dyn API when `None`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Option<&str>) -> Result<Self, ProviderError> {
        let http = HttpClient::builder()
            .build()
            .map_err(|e| ProviderError::transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or(DYNECT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            token: None,
            backoff: BackoffSettings::http(),
            job_poll_interval: Duration::from_secs(DYNECT_JOB_POLL_INTERVAL_SECS),
        })
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffSettings) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_job_poll_interval(mut self, interval: Duration) -> Self {
        self.job_poll_interval = interval;
        self
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Open an API session.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the API is unreachable.
    pub async fn login(
        &mut self,
        customer: &str,
        username: &str,
        password: &str,
    ) -> Result<(), ProviderError> {
        info!(customer = %customer, user = %username, "Opening Dyn API session");

        let body = json!({
            "customer_name": customer,
            "user_name": username,
            "password": password,
        });
        let data = self.request(Method::POST, "/REST/Session/", Some(&body)).await?;

        let token = data
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::transport("Dyn session response carried no token"))?;

        self.token = Some(token.to_string());
        Ok(())
    }

    /// Close the API session. A no-op when not logged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the logout.
    pub async fn logout(&self) -> Result<(), ProviderError> {
        if self.token.is_none() {
            return Ok(());
        }
        self.request(Method::DELETE, "/REST/Session/", None).await?;
        info!("Closed Dyn API session");
        Ok(())
    }

    /// Authenticated GET of `path`, decoding the envelope's `data`.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure, a `failure` envelope, or undecodable data.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProviderError> {
        let data = self.request(Method::GET, path, None).await?;
        serde_json::from_value(data)
            .map_err(|e| ProviderError::transport(format!("Failed to decode Dyn response for {path}: {e}")))
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ProviderError> {
        let envelope = self.send_once(method.clone(), path, body).await?;

        match (envelope.status.as_str(), envelope.job_id) {
            ("incomplete", Some(job_id)) => self.poll_job(job_id).await,
            _ => Ok(envelope.data),
        }
    }

    async fn poll_job(&self, job_id: u64) -> Result<Value, ProviderError> {
        let path = format!("/REST/Job/{job_id}/");
        for attempt in 1..=DYNECT_MAX_JOB_POLLS {
            tokio::time::sleep(self.job_poll_interval).await;
            let envelope = self.send_once(Method::GET, &path, None).await?;
            if envelope.status != "incomplete" {
                debug!(job_id = job_id, attempt = attempt, "Dyn job completed");
                return Ok(envelope.data);
            }
        }

        Err(ProviderError::transport(format!(
            "Dyn job {job_id} did not complete after {DYNECT_MAX_JOB_POLLS} polls"
        )))
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Envelope, ProviderError> {
        let url = format!("{}{path}", self.base_url);
        debug!(method = %method, url = %url, "Dyn API request");

        let response = send_with_retry(self.backoff.for_method(&method), path, || {
            let mut request = self.http.request(method.clone(), &url);
            if let Some(token) = &self.token {
                request = request.header(DYNECT_AUTH_HEADER, token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            request.send()
        })
        .await
        .map_err(|e| ProviderError::transport(format!("Failed to send request to {url}: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::transport(format!("Failed to read Dyn response: {e}")))?;

        let envelope: Option<Envelope> = serde_json::from_str(&text).ok();

        if !status.is_success() || envelope.as_ref().is_some_and(|e| e.status == "failure") {
            let (message, code) = match &envelope {
                Some(envelope) => (envelope.message(), envelope.error_code().map(str::to_string)),
                None => (text.clone(), None),
            };
            error!(
                method = %method,
                url = %url,
                status = %status,
                error = %message,
                "Dyn API request failed"
            );
            let err = ProviderError::http(status.as_u16(), None, message);
            return Err(match code {
                Some(code) => err.with_code(code),
                None => err,
            });
        }

        envelope.ok_or_else(|| {
            ProviderError::http(status.as_u16(), None, format!("Undecodable Dyn response: {text}"))
        })
    }
}

/// `data` of `/REST/Zone/{zone}/`.
#[derive(Debug, Deserialize)]
struct ZoneInfo {
    zone_type: String,
}

/// `data` of `/REST/Secondary/{zone}/`.
#[derive(Debug, Deserialize)]
struct SecondaryInfo {
    #[serde(default)]
    masters: Vec<String>,
    #[serde(default)]
    tsig_key_name: Option<String>,
}

/// `data` of `/REST/TSIGKey/{name}/`.
#[derive(Debug, Deserialize)]
struct TsigKeyInfo {
    name: String,
    algorithm: String,
    #[serde(default)]
    secret: String,
}

/// One entry of `/REST/AllRecord/{zone}/?detail=Y`.
#[derive(Debug, Deserialize)]
struct DynRecord {
    fqdn: String,
    record_type: String,
    #[serde(default)]
    ttl: Value,
    #[serde(default)]
    rdata: Map<String, Value>,
    #[serde(default)]
    service_class: Option<String>,
}

/// [`SourceProvider`] backed by Dyn Managed DNS.
#[derive(Clone)]
pub struct DynectSource {
    api: Arc<DynectClient>,
    xfr: ZoneTransferClient,
}

impl DynectSource {
    #[must_use]
    pub fn new(api: Arc<DynectClient>, xfr: ZoneTransferClient) -> Self {
        Self { api, xfr }
    }

    /// Fetch the TSIG key that signs zone transfers.
    ///
    /// The Dyn session is closed unless the key was found, so a caller that
    /// aborts on `Err` or `None` leaves no session open.
    ///
    /// # Errors
    ///
    /// Returns the retrieval error of the key lookup.
    pub async fn transfer_tsig_key(&self, name: &str) -> Result<Option<TsigKey>, RetrievalError> {
        let result = self.tsig_key(name).await;
        if !matches!(result, Ok(Some(_))) {
            if let Err(e) = self.api.logout().await {
                warn!(error = %e, "Failed to close Dyn session");
            }
        }
        result
    }
}

#[async_trait]
impl SourceProvider for DynectSource {
    async fn zone_role(&self, zone: &str) -> Result<ZoneRole, RetrievalError> {
        let info: ZoneInfo = self
            .api
            .get(&format!("/REST/Zone/{zone}/"))
            .await
            .map_err(|e| retrieval_error(zone, "ZoneGet", e))?;

        if !info.zone_type.eq_ignore_ascii_case("secondary") {
            return Ok(ZoneRole::Primary);
        }

        let secondary: SecondaryInfo = self
            .api
            .get(&format!("/REST/Secondary/{zone}/"))
            .await
            .map_err(|e| retrieval_error(zone, "SecondaryGet", e))?;

        Ok(ZoneRole::Secondary(SecondaryConfig {
            masters: secondary.masters,
            tsig_key_name: secondary
                .tsig_key_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
        }))
    }

    async fn transfer_zone(&self, zone: &str) -> Result<Vec<RawRecord>, RetrievalError> {
        self.xfr.transfer(zone).await
    }

    async fn list_records(&self, zone: &str) -> Result<Vec<RawRecord>, RetrievalError> {
        let listing: BTreeMap<String, Vec<DynRecord>> = self
            .api
            .get(&format!("/REST/AllRecord/{zone}/?detail=Y"))
            .await
            .map_err(|e| retrieval_error(zone, "RecordGet", e))?;

        listing
            .values()
            .flatten()
            .map(|record| convert_record(zone, record))
            .collect()
    }

    async fn tsig_key(&self, name: &str) -> Result<Option<TsigKey>, RetrievalError> {
        let info: TsigKeyInfo = match self.api.get(&format!("/REST/TSIGKey/{name}/")).await {
            Ok(info) => info,
            Err(e) if e.is_not_found() => {
                warn!(key = %name, "TSIG key not found in Dyn");
                return Ok(None);
            }
            Err(e) => return Err(retrieval_error(name, "TSIGGet", e)),
        };

        let algorithm = TsigAlgorithm::from_str(&info.algorithm).map_err(|e| RetrievalError::Api {
            zone: name.to_string(),
            source: ProviderError::transport(e.to_string()),
        })?;

        Ok(Some(TsigKey {
            name: info.name,
            algorithm,
            secret: TsigSecret::new(info.secret),
        }))
    }
}

/// Map a Dyn API failure onto the retrieval taxonomy.
fn retrieval_error(zone: &str, permission: &str, err: ProviderError) -> RetrievalError {
    if err.is_permission_denied() {
        RetrievalError::PermissionDenied {
            zone: zone.to_string(),
            permission: permission.to_string(),
            reason: err.to_string(),
        }
    } else if err.is_unauthorized() {
        RetrievalError::AuthenticationFailed {
            zone: zone.to_string(),
            reason: err.to_string(),
        }
    } else if err.is_not_found() {
        RetrievalError::ZoneNotFound {
            zone: zone.to_string(),
        }
    } else {
        RetrievalError::Api {
            zone: zone.to_string(),
            source: err,
        }
    }
}

/// Typed access to the `rdata` object of a Dyn record.
struct Rdata<'a> {
    zone: &'a str,
    record: &'a DynRecord,
    rtype: &'a str,
}

impl Rdata<'_> {
    fn malformed(&self, reason: String) -> RetrievalError {
        RetrievalError::MalformedRecord {
            zone: self.zone.to_string(),
            owner: self.record.fqdn.clone(),
            rtype: self.rtype.to_string(),
            reason,
        }
    }

    /// Dyn returns numeric fields as either JSON numbers or strings.
    fn text(&self, name: &str) -> Result<String, RetrievalError> {
        match self.record.rdata.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(self.malformed(format!("missing rdata field '{name}'"))),
        }
    }

    fn parse<T: FromStr>(&self, name: &str) -> Result<T, RetrievalError> {
        let value = self.text(name)?;
        value
            .trim()
            .parse::<T>()
            .map_err(|_| self.malformed(format!("invalid value '{value}' for rdata field '{name}'")))
    }

    fn hex(&self, name: &str) -> Result<String, RetrievalError> {
        Ok(self.text(name)?.replace(' ', "").to_ascii_uppercase())
    }
}

fn record_ttl(ttl: &Value) -> Option<u32> {
    match ttl {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
    .filter(|ttl| *ttl != 0)
}

fn convert_record(zone: &str, record: &DynRecord) -> Result<RawRecord, RetrievalError> {
    let rtype = record.record_type.trim().to_ascii_uppercase();
    let unsupported = |reason: String| RawRecord {
        owner: record.fqdn.clone(),
        ttl: record_ttl(&record.ttl),
        data: RecordData::Unsupported {
            rtype: rtype.clone(),
            reason,
        },
    };

    if let Some(service) = record
        .service_class
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return Ok(unsupported(format!("managed by Dyn {service} service")));
    }
    if let Some(reason) = unsupported_reason(&rtype) {
        return Ok(unsupported(reason.to_string()));
    }

    let rd = Rdata {
        zone,
        record,
        rtype: &rtype,
    };

    let data = match rtype.as_str() {
        "A" => RecordData::A(rd.parse("address")?),
        "AAAA" => RecordData::Aaaa(rd.parse("address")?),
        "CAA" => RecordData::Caa {
            flags: rd.parse("flags")?,
            tag: rd.text("tag")?.to_ascii_lowercase(),
            value: rd.text("value")?.into_bytes(),
        },
        "CNAME" => RecordData::Cname(rd.text("cname")?),
        "DS" => RecordData::Ds {
            key_tag: rd.parse("keytag")?,
            algorithm: rd.parse("algorithm")?,
            digest_type: rd.parse("digtype")?,
            digest: rd.hex("digest")?,
        },
        "MX" => RecordData::Mx {
            preference: rd.parse("preference")?,
            exchange: rd.text("exchange")?,
        },
        "NAPTR" => RecordData::Naptr {
            order: rd.parse("order")?,
            preference: rd.parse("preference")?,
            flags: rd.text("flags")?.into_bytes(),
            services: rd.text("services")?.into_bytes(),
            regexp: rd.text("regexp")?.into_bytes(),
            replacement: rd.text("replacement")?,
        },
        "NS" => RecordData::Ns(rd.text("nsdname")?),
        "PTR" => RecordData::Ptr(rd.text("ptrdname")?),
        "SOA" => RecordData::Soa {
            mname: rd.text("mname")?,
            rname: rd.text("rname")?,
            serial: rd.parse("serial")?,
            refresh: rd.parse("refresh")?,
            retry: rd.parse("retry")?,
            expire: rd.parse("expire")?,
            minimum: rd.parse("minimum")?,
        },
        "SPF" => RecordData::Spf(vec![rd.text("txtdata")?.into_bytes()]),
        "SRV" => RecordData::Srv {
            priority: rd.parse("priority")?,
            weight: rd.parse("weight")?,
            port: rd.parse("port")?,
            target: rd.text("target")?,
        },
        "SSHFP" => RecordData::Sshfp {
            algorithm: rd.parse("algorithm")?,
            fp_type: rd.parse("fptype")?,
            fingerprint: rd.hex("fingerprint")?,
        },
        "TLSA" => RecordData::Tlsa {
            cert_usage: rd.parse("cert_usage")?,
            selector: rd.parse("selector")?,
            matching_type: rd.parse("match_type")?,
            cert_data: rd.hex("certificate")?,
        },
        "TXT" => RecordData::Txt(vec![rd.text("txtdata")?.into_bytes()]),
        _ => return Ok(unsupported(
            "record type has no equivalent in the target provider".to_string(),
        )),
    };

    Ok(RawRecord {
        owner: record.fqdn.clone(),
        ttl: record_ttl(&record.ttl),
        data,
    })
}

#[cfg(test)]
#[path = "dynect_tests.rs"]
mod dynect_tests;

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry logic with exponential backoff for provider HTTP calls.
//!
//! Transient responses (429, 5xx) and connection failures are retried with
//! jittered exponential backoff. Everything else is returned to the caller
//! on the first attempt. Engine stages never retry on their own; this is the
//! only place a request is repeated. POST requests create resources and are
//! never repeated.

use rand::Rng;
use reqwest::{Method, Response, StatusCode};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// HTTP retry initial interval (50ms)
const HTTP_INITIAL_INTERVAL_MILLIS: u64 = 50;

/// HTTP retry maximum interval (10 seconds)
const HTTP_MAX_INTERVAL_SECS: u64 = 10;

/// HTTP retry maximum elapsed time (2 minutes)
const HTTP_MAX_ELAPSED_TIME_SECS: u64 = 120;

/// Backoff multiplier (exponential growth factor)
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Randomization factor to prevent thundering herd (±10%)
const RANDOMIZATION_FACTOR: f64 = 0.1;

/// Parameters of an exponential backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffSettings {
    /// First retry interval
    pub initial_interval: Duration,
    /// Upper bound for a single interval
    pub max_interval: Duration,
    /// Total time budget; `None` retries forever
    pub max_elapsed_time: Option<Duration>,
    /// Growth factor between intervals
    pub multiplier: f64,
    /// Jitter applied to each interval (0.1 = ±10%)
    pub randomization_factor: f64,
}

impl BackoffSettings {
    /// Default schedule for provider HTTP APIs.
    ///
    /// Retries occur at approximately 50ms, 100ms, 200ms, ... capped at 10s,
    /// until 2 minutes have elapsed.
    #[must_use]
    pub fn http() -> Self {
        Self {
            initial_interval: Duration::from_millis(HTTP_INITIAL_INTERVAL_MILLIS),
            max_interval: Duration::from_secs(HTTP_MAX_INTERVAL_SECS),
            max_elapsed_time: Some(Duration::from_secs(HTTP_MAX_ELAPSED_TIME_SECS)),
            multiplier: BACKOFF_MULTIPLIER,
            randomization_factor: RANDOMIZATION_FACTOR,
        }
    }

    /// A schedule that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            max_elapsed_time: Some(Duration::ZERO),
            multiplier: 1.0,
            randomization_factor: 0.0,
        }
    }

    /// The schedule to use for a request with `method`.
    ///
    /// A POST that timed out may still have been applied, so it is sent once.
    #[must_use]
    pub fn for_method(self, method: &Method) -> Self {
        if *method == Method::POST {
            Self::disabled()
        } else {
            self
        }
    }
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self::http()
    }
}

/// Simple exponential backoff implementation.
///
/// Provides exponential backoff with randomization (jitter) to prevent thundering herd.
pub struct ExponentialBackoff {
    /// Current interval duration
    pub current_interval: Duration,
    settings: BackoffSettings,
    start_time: Instant,
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new(settings: BackoffSettings) -> Self {
        Self {
            current_interval: settings.initial_interval,
            settings,
            start_time: Instant::now(),
        }
    }

    /// Get the next backoff interval, or None if max elapsed time exceeded.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if let Some(max_elapsed) = self.settings.max_elapsed_time {
            if self.start_time.elapsed() >= max_elapsed {
                return None;
            }
        }

        let interval = self.current_interval;
        let jittered = self.apply_jitter(interval);

        let next = interval.as_secs_f64() * self.settings.multiplier;
        self.current_interval = Duration::from_secs_f64(next).min(self.settings.max_interval);

        Some(jittered)
    }

    /// Apply randomization (jitter) to an interval.
    fn apply_jitter(&self, interval: Duration) -> Duration {
        if self.settings.randomization_factor == 0.0 || interval.is_zero() {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let delta = secs * self.settings.randomization_factor;
        let min = secs - delta;
        let max = secs + delta;

        let mut rng = rand::thread_rng();
        let jittered = rng.gen_range(min..=max);

        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Determine if an HTTP status code is retryable.
///
/// # Retryable Status Codes
///
/// - **429** (Too Many Requests) - Rate limiting
/// - **500** (Internal Server Error) - Server error
/// - **502** (Bad Gateway) - Proxy/gateway error
/// - **503** (Service Unavailable) - Temporary unavailability
/// - **504** (Gateway Timeout) - Gateway timeout
#[must_use]
pub fn is_retryable_http_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Send an HTTP request, retrying transient failures.
///
/// `send` is called once per attempt and must build a fresh request. The last
/// response is returned even when its status is an error; callers decide how
/// to interpret it.
///
/// # Errors
///
/// Returns the transport error of the last attempt if no response was received.
pub async fn send_with_retry<F, Fut>(
    settings: BackoffSettings,
    operation_name: &str,
    mut send: F,
) -> Result<Response, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut backoff = ExponentialBackoff::new(settings);
    let start_time = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;

        let result = send().await;
        let retry_reason = match &result {
            Ok(response) if is_retryable_http_status(response.status()) => {
                format!("HTTP {}", response.status())
            }
            Ok(_) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        "HTTP API call succeeded after retries"
                    );
                }
                return result;
            }
            Err(e) if e.is_connect() || e.is_timeout() => e.to_string(),
            Err(e) => {
                error!(
                    operation = operation_name,
                    error = %e,
                    "Non-retryable HTTP API error, failing immediately"
                );
                return result;
            }
        };

        match backoff.next_backoff() {
            Some(duration) => {
                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    retry_after = ?duration,
                    reason = %retry_reason,
                    "Retryable HTTP API error, will retry"
                );
                tokio::time::sleep(duration).await;
            }
            None => {
                if settings.max_elapsed_time != Some(Duration::ZERO) {
                    error!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        reason = %retry_reason,
                        "Backoff exhausted, giving up"
                    );
                }
                return result;
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;

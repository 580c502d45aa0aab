// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests.
//
// Key functionality:
// - Makes HTTP HEAD requests (lightweight, no body download)
// - Falls back to GET when the server refuses HEAD (405 / 501)
// - Enforces a per-probe timeout and sends an identifying User-Agent
// - Classifies the result as Ok, Broken(status) or Failed(error)
// - Optionally retries network failures with exponential backoff
//
// The actual network call sits behind the ProbeTransport trait so the
// classification logic can be exercised without a network.
// =============================================================================

use super::CheckTarget;
use crate::config::{BrokenPolicy, CheckConfig};
use crate::error::{CheckError, Result, TransportError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

// Terminal state of a probe
//
// Every URL goes Pending -> Checking -> one of these, and never leaves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Reachable, or an error status the broken policy ignores
    Ok,
    /// The server answered with a status the broken policy counts as broken
    Broken { status: u16 },
    /// The check itself could not complete (timeout, DNS, connection, TLS)
    Failed { error: String },
}

/// The result of checking a single link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub source_page: String,
    pub url: String,
    pub raw_href: String,
    pub anchor_text: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeMethod {
    Head,
    Get,
}

/// One request handed to a transport
#[derive(Debug)]
pub struct ProbeRequest<'a> {
    pub url: &'a str,
    pub method: ProbeMethod,
    pub timeout: Duration,
    pub headers: &'a HeaderMap,
}

/// Performs a reachability check and reports the HTTP status.
///
/// Non-2xx statuses are returned as `Ok(status)`; only failures to get any
/// response at all are errors.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn send(&self, request: ProbeRequest<'_>) -> std::result::Result<u16, TransportError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &CheckConfig) -> Result<Self> {
        // One client for every probe (connection pooling)
        let client = Client::builder()
            .timeout(config.probe_timeout())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ProbeTransport for HttpTransport {
    async fn send(&self, request: ProbeRequest<'_>) -> std::result::Result<u16, TransportError> {
        let builder = match request.method {
            ProbeMethod::Head => self.client.head(request.url),
            ProbeMethod::Get => self.client.get(request.url),
        };

        // The body of a GET fallback is never read; dropping the response
        // closes the stream.
        let response = builder
            .headers(request.headers.clone())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        Ok(response.status().as_u16())
    }
}

/// Probes URLs and classifies the outcome according to the configured policy
pub struct Prober {
    transport: Arc<dyn ProbeTransport>,
    headers: HeaderMap,
    timeout: Duration,
    broken_policy: BrokenPolicy,
    retries: u32,
    retry_backoff: Duration,
}

impl Prober {
    pub fn new(transport: Arc<dyn ProbeTransport>, config: &CheckConfig) -> Result<Self> {
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| CheckError::Config(format!("invalid user agent: {}", e)))?;
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);

        Ok(Self {
            transport,
            headers,
            timeout: config.probe_timeout(),
            broken_policy: config.broken_policy.clone(),
            retries: config.retries,
            retry_backoff: config.retry_backoff(),
        })
    }

    /// Checks one target. Never fails: every problem becomes an Outcome.
    pub async fn check(&self, target: CheckTarget) -> CheckResult {
        let outcome = self.probe_url(&target.url).await;

        match &outcome {
            Outcome::Ok => debug!(url = %target.url, "link ok"),
            Outcome::Broken { status } => warn!(
                url = %target.url,
                page = %target.candidate.source_page,
                status,
                "broken link"
            ),
            Outcome::Failed { error } => warn!(
                url = %target.url,
                page = %target.candidate.source_page,
                %error,
                "request failed"
            ),
        }

        CheckResult {
            source_page: target.candidate.source_page,
            url: target.url,
            raw_href: target.candidate.raw_href,
            anchor_text: target.candidate.anchor_text,
            outcome,
        }
    }

    pub async fn probe_url(&self, url: &str) -> Outcome {
        let mut attempt: u32 = 0;
        loop {
            match self.attempt(url).await {
                Ok(status) => return self.classify(url, status),
                Err(error) if attempt < self.retries => {
                    let wait = self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt));
                    debug!(
                        url,
                        %error,
                        attempt = attempt + 1,
                        "probe failed, retrying in {:?}",
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Outcome::Failed {
                        error: error.to_string(),
                    }
                }
            }
        }
    }

    // HEAD first; some servers reject it outright, so retry those with GET
    async fn attempt(&self, url: &str) -> std::result::Result<u16, TransportError> {
        let status = self.send(url, ProbeMethod::Head).await?;
        if status == 405 || status == 501 {
            debug!(url, status, "HEAD not supported, falling back to GET");
            return self.send(url, ProbeMethod::Get).await;
        }
        Ok(status)
    }

    async fn send(
        &self,
        url: &str,
        method: ProbeMethod,
    ) -> std::result::Result<u16, TransportError> {
        let request = ProbeRequest {
            url,
            method,
            timeout: self.timeout,
            headers: &self.headers,
        };

        // The transport should honour request.timeout itself; this outer
        // timeout bounds transports that don't.
        match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    // HTTP status codes:
    // - 100-399: success / redirect (redirects are followed by the client)
    // - 400-599: broken only if the policy says so
    fn classify(&self, url: &str, status: u16) -> Outcome {
        if status < 400 {
            Outcome::Ok
        } else if self.broken_policy.is_broken(status) {
            Outcome::Broken { status }
        } else {
            debug!(url, status, "error status ignored by broken policy");
            Outcome::Ok
        }
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is a 403 or 503 not broken by default?
//    - Bot protection and rate limiting produce them for perfectly good pages
//    - Switch the policy to `any-error` to report them anyway
//
// 2. Why Arc<dyn ProbeTransport>?
//    - The prober is shared by every worker in the pool
//    - Tests swap in an in-memory transport
//
// 3. Why two timeouts?
//    - reqwest's timeout covers the real transport
//    - tokio::time::timeout guarantees the bound for any transport
// -----------------------------------------------------------------------------

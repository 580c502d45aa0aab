// src/error.rs
// =============================================================================
// Error types for the link checking pipeline.
//
// Two layers:
// - CheckError: session-level problems (no seeds, bad config, a page that
//   could not be loaded). Only SourceUnavailable and Config stop a session.
// - TransportError: a single probe could not complete. These never escape
//   the prober; they become `Failed` entries in the report.
// =============================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("seed source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("failed to load page {url}: {reason}")]
    PageLoad { url: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CheckError>;

/// Why a probe could not produce an HTTP status.
///
/// The `Display` text is what ends up on the `Error:` line of the report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("could not resolve hostname: {0}")]
    Dns(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Sorts a reqwest error into one of the failure buckets.
    ///
    /// reqwest does not expose DNS or TLS failures as distinct kinds, so
    /// those are recognised from the error chain text.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        let chain = error_chain(error);
        let lower = chain.to_lowercase();

        if error.is_timeout() {
            TransportError::Timeout
        } else if error.is_redirect() {
            TransportError::TooManyRedirects
        } else if lower.contains("dns") || lower.contains("failed to lookup address") {
            TransportError::Dns(chain)
        } else if lower.contains("certificate") || lower.contains("tls") || lower.contains("ssl") {
            TransportError::Tls(chain)
        } else if error.is_connect() {
            TransportError::Connect(chain)
        } else {
            TransportError::Other(chain)
        }
    }
}

// reqwest's top-level message is usually just "error sending request";
// the useful part lives further down the source chain.
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

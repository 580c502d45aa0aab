// src/config.rs
// =============================================================================
// Runtime configuration for a link checking session.
//
// Values are layered:
// 1. Built-in defaults (CheckConfig::default)
// 2. An optional JSON config file (--config checks.json)
// 3. Command-line flags, applied last in main.rs
//
// Every policy question that different sites answer differently is a knob
// here instead of a constant: which statuses count as broken, whether failed
// requests fail the run, whether dedup spans the session or a single page.
// =============================================================================

use crate::error::{CheckError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// URL substrings that are never worth probing (matched case-insensitively).
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "#",
    "mailto:",
    "tel:",
    "javascript:",
    "data:",
    ".pdf",
    ".jpg",
    ".jpeg",
    ".png",
    ".gif",
    ".svg",
    ".webp",
    ".mp4",
    ".webm",
    ".mp3",
    ".wav",
    "localhost",
    "chrome-extension://",
    "about:",
];

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; LinkSentinel/0.1)";

/// How long the dedup registry remembers a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DedupScope {
    /// One registry for the whole crawl; a URL is probed at most once
    Session,
    /// A fresh registry per seed page; shared links are re-probed on each page
    Page,
}

/// Which HTTP statuses turn a probe into a `Broken` finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BrokenPolicy {
    /// Only 404 Not Found
    NotFound,
    /// Every 4xx and 5xx status
    AnyError,
    /// An explicit list of status codes
    Listed { codes: Vec<u16> },
}

impl BrokenPolicy {
    pub fn is_broken(&self, status: u16) -> bool {
        match self {
            BrokenPolicy::NotFound => status == 404,
            BrokenPolicy::AnyError => status >= 400,
            BrokenPolicy::Listed { codes } => codes.contains(&status),
        }
    }
}

/// Whether failed requests alone make the verdict fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerdictPolicy {
    /// Clean only when there are no broken links and no failed requests
    Strict,
    /// Failed requests are reported but do not fail the verdict
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Upper bound on links probed per seed page (0 = no limit)
    pub max_links_per_page: usize,
    pub probe_timeout_secs: u64,
    pub session_timeout_secs: u64,
    /// Pause after each probe, per worker
    pub delay_ms: u64,
    /// Number of probes allowed in flight at once (1 = sequential)
    pub concurrency: usize,
    /// Probe links that leave the target site's host
    pub include_external: bool,
    /// Host considered "the site"; defaults to each seed page's host
    pub site_host: Option<String>,
    pub exclude_patterns: Vec<String>,
    pub dedup_scope: DedupScope,
    pub broken_policy: BrokenPolicy,
    pub verdict_policy: VerdictPolicy,
    /// A seed page that fails to load (or isn't HTML/Markdown) fails the run
    pub fail_on_page_errors: bool,
    /// Extra attempts for probes that fail at the network level
    pub retries: u32,
    pub retry_backoff_ms: u64,
    /// Fixes the sampling RNG so runs are reproducible
    pub seed: Option<u64>,
    pub user_agent: String,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            max_links_per_page: 30,
            probe_timeout_secs: 15,
            session_timeout_secs: 120,
            delay_ms: 200,
            concurrency: 1,
            include_external: false,
            site_host: None,
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            dedup_scope: DedupScope::Session,
            broken_policy: BrokenPolicy::NotFound,
            verdict_policy: VerdictPolicy::Strict,
            fail_on_page_errors: false,
            retries: 0,
            retry_backoff_ms: 500,
            seed: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CheckConfig {
    /// Loads a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: CheckConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(CheckError::Config("concurrency must be at least 1".to_string()));
        }
        if self.probe_timeout_secs == 0 {
            return Err(CheckError::Config("probe timeout must be greater than zero".to_string()));
        }
        if self.session_timeout_secs == 0 {
            return Err(CheckError::Config("session timeout must be greater than zero".to_string()));
        }
        if let BrokenPolicy::Listed { codes } = &self.broken_policy {
            if codes.is_empty() {
                return Err(CheckError::Config(
                    "listed broken policy needs at least one status code".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_behavior() {
        let config = CheckConfig::default();
        assert_eq!(config.max_links_per_page, 30);
        assert_eq!(config.dedup_scope, DedupScope::Session);
        assert_eq!(config.broken_policy, BrokenPolicy::NotFound);
        assert_eq!(config.verdict_policy, VerdictPolicy::Strict);
        assert!(!config.include_external);
        assert_eq!(config.retries, 0);
        assert!(!config.fail_on_page_errors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_broken_policies() {
        assert!(BrokenPolicy::NotFound.is_broken(404));
        assert!(!BrokenPolicy::NotFound.is_broken(403));
        assert!(!BrokenPolicy::NotFound.is_broken(500));

        assert!(BrokenPolicy::AnyError.is_broken(403));
        assert!(BrokenPolicy::AnyError.is_broken(503));
        assert!(!BrokenPolicy::AnyError.is_broken(301));

        let listed = BrokenPolicy::Listed { codes: vec![404, 410] };
        assert!(listed.is_broken(410));
        assert!(!listed.is_broken(500));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "concurrency": 4,
            "broken_policy": { "kind": "listed", "codes": [404, 410] },
            "verdict_policy": "lenient",
            "dedup_scope": "page",
            "fail_on_page_errors": true
        }"#;
        let config: CheckConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.verdict_policy, VerdictPolicy::Lenient);
        assert_eq!(config.dedup_scope, DedupScope::Page);
        assert!(config.fail_on_page_errors);
        assert!(config.broken_policy.is_broken(410));
        assert_eq!(config.max_links_per_page, 30);
        assert!(config.exclude_patterns.iter().any(|p| p == "mailto:"));
    }

    #[test]
    fn test_example_config_file_matches_defaults() {
        let config: CheckConfig =
            serde_json::from_str(include_str!("../link-sentinel.example.json")).unwrap();
        assert_eq!(config, CheckConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = CheckConfig { concurrency: 0, ..CheckConfig::default() };
        assert!(config.validate().is_err());

        let config = CheckConfig {
            broken_policy: BrokenPolicy::Listed { codes: vec![] },
            ..CheckConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

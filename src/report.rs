// src/report.rs
// =============================================================================
// Collects probe results and turns them into the final report.
//
// - Aggregator: mutable, lives for one crawl session, fed by the workers
// - CrawlReport: immutable snapshot built once at the end of the session,
//   rendered as text (one block per finding) or JSON
//
// The verdict is computed here: a crawl is clean when there are no broken
// links, and (under the strict policy) no failed requests either. When page
// errors are fatal (the sitemap default), every seed page must also load.
// =============================================================================

use crate::checker::{CheckResult, Outcome};
use crate::config::VerdictPolicy;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenLink {
    pub page: String,
    /// The href as written on the page
    pub link: String,
    /// The normalized URL that was probed
    pub url: String,
    pub text: String,
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRequest {
    pub page: String,
    pub link: String,
    pub url: String,
    pub text: String,
    pub error: String,
}

/// A seed page whose links could not be extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    pub page: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct Aggregator {
    broken: Vec<BrokenLink>,
    failed: Vec<FailedRequest>,
    page_failures: Vec<PageFailure>,
    pages_visited: usize,
    links_discovered: usize,
    links_scheduled: usize,
    links_checked: usize,
    page_errors_fatal: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes any page that fails to load fail the verdict
    pub fn page_errors_fatal(mut self, fatal: bool) -> Self {
        self.page_errors_fatal = fatal;
        self
    }

    /// A page loaded and yielded `discovered` raw anchors
    pub fn page_visited(&mut self, discovered: usize) {
        self.pages_visited += 1;
        self.links_discovered += discovered;
    }

    pub fn page_failed(&mut self, page: &str, error: String) {
        self.page_failures.push(PageFailure {
            page: page.to_string(),
            error,
        });
    }

    /// `count` links were queued for probing
    pub fn scheduled(&mut self, count: usize) {
        self.links_scheduled += count;
    }

    pub fn record(&mut self, result: CheckResult) {
        self.links_checked += 1;
        match result.outcome {
            Outcome::Ok => {}
            Outcome::Broken { status } => self.broken.push(BrokenLink {
                page: result.source_page,
                link: result.raw_href,
                url: result.url,
                text: result.anchor_text,
                status,
            }),
            Outcome::Failed { error } => self.failed.push(FailedRequest {
                page: result.source_page,
                link: result.raw_href,
                url: result.url,
                text: result.anchor_text,
                error,
            }),
        }
    }

    pub fn finish(self, policy: VerdictPolicy, timed_out: bool) -> CrawlReport {
        let links_clean = match policy {
            VerdictPolicy::Strict => self.broken.is_empty() && self.failed.is_empty(),
            VerdictPolicy::Lenient => self.broken.is_empty(),
        };
        let pages_clean = !self.page_errors_fatal || self.page_failures.is_empty();
        let clean = links_clean && pages_clean;

        CrawlReport {
            pages_visited: self.pages_visited,
            pages_failed: self.page_failures.len(),
            links_discovered: self.links_discovered,
            links_checked: self.links_checked,
            // Scheduled but cancelled by the session timeout
            links_unchecked: self.links_scheduled.saturating_sub(self.links_checked),
            broken_count: self.broken.len(),
            failed_count: self.failed.len(),
            timed_out,
            verdict_policy: policy,
            fail_on_page_errors: self.page_errors_fatal,
            clean,
            broken_links: self.broken,
            failed_requests: self.failed,
            page_failures: self.page_failures,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub pages_visited: usize,
    pub pages_failed: usize,
    pub links_discovered: usize,
    pub links_checked: usize,
    pub links_unchecked: usize,
    pub broken_count: usize,
    pub failed_count: usize,
    pub timed_out: bool,
    pub verdict_policy: VerdictPolicy,
    pub fail_on_page_errors: bool,
    pub clean: bool,
    pub broken_links: Vec<BrokenLink>,
    pub failed_requests: Vec<FailedRequest>,
    pub page_failures: Vec<PageFailure>,
}

impl CrawlReport {
    pub fn is_clean(&self) -> bool {
        self.clean
    }

    /// Full human-readable report
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "=== Link Check Results ===");
        let _ = writeln!(
            out,
            "Pages checked: {} ({} failed to load)",
            self.pages_visited, self.pages_failed
        );
        let _ = writeln!(
            out,
            "Links discovered: {}, checked: {}",
            self.links_discovered, self.links_checked
        );
        let _ = writeln!(out, "Broken links: {}", self.broken_count);
        let _ = writeln!(out, "Failed requests: {}", self.failed_count);
        if self.timed_out {
            let _ = writeln!(
                out,
                "Session timed out: results are partial ({} scheduled links not checked)",
                self.links_unchecked
            );
        }

        if !self.broken_links.is_empty() {
            let _ = writeln!(out, "\nBroken Links Found:");
            for broken in &self.broken_links {
                let _ = writeln!(out, "\n{}", render_broken(broken));
            }
        }

        if !self.failed_requests.is_empty() {
            let _ = writeln!(out, "\nFailed Requests:");
            for failed in &self.failed_requests {
                let _ = writeln!(out, "\n{}", render_failed(failed));
            }
        }

        if !self.page_failures.is_empty() {
            let _ = writeln!(out, "\nPages Not Loaded:");
            for failure in &self.page_failures {
                let _ = writeln!(out, "- {} ({})", failure.page, failure.error);
            }
        }

        let verdict = if self.clean { "PASS" } else { "FAIL" };
        let _ = write!(out, "\nVerdict: {}", verdict);
        out
    }

    /// One-paragraph summary, suitable as an assertion message
    pub fn summary_message(&self) -> String {
        if self.broken_links.is_empty() {
            return "No broken links (404s) should be found".to_string();
        }

        let mut message = format!("Found {} broken links:", self.broken_links.len());
        for broken in &self.broken_links {
            let _ = write!(
                message,
                "\n  - {} ({}) on page: {}",
                broken.url, broken.status, broken.page
            );
        }
        message
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn render_broken(broken: &BrokenLink) -> String {
    format!(
        "- Page: {}\n  Link: {}\n  Text: {}\n  Status: {}",
        broken.page, broken.link, broken.text, broken.status
    )
}

pub fn render_failed(failed: &FailedRequest) -> String {
    format!(
        "- Page: {}\n  Link: {}\n  Text: {}\n  Error: {}",
        failed.page, failed.link, failed.text, failed.error
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, outcome: Outcome) -> CheckResult {
        CheckResult {
            source_page: "https://x/".to_string(),
            url: url.to_string(),
            raw_href: "/y".to_string(),
            anchor_text: "Y".to_string(),
            outcome,
        }
    }

    #[test]
    fn test_broken_block_format() {
        let broken = BrokenLink {
            page: "https://x/".to_string(),
            link: "/y".to_string(),
            url: "https://x/y".to_string(),
            text: "Y".to_string(),
            status: 404,
        };
        assert_eq!(
            render_broken(&broken),
            "- Page: https://x/\n  Link: /y\n  Text: Y\n  Status: 404"
        );
    }

    #[test]
    fn test_failed_block_format() {
        let failed = FailedRequest {
            page: "https://x/".to_string(),
            link: "/y".to_string(),
            url: "https://x/y".to_string(),
            text: "Y".to_string(),
            error: "request timed out".to_string(),
        };
        let block = render_failed(&failed);
        assert_eq!(block.lines().last(), Some("  Error: request timed out"));
        assert_eq!(block.lines().count(), 4);
    }

    #[test]
    fn test_outcomes_land_in_the_right_bucket() {
        let mut aggregator = Aggregator::new();
        aggregator.scheduled(3);
        aggregator.record(result("https://x/ok", Outcome::Ok));
        aggregator.record(result("https://x/y", Outcome::Broken { status: 404 }));
        aggregator.record(result(
            "https://x/slow",
            Outcome::Failed {
                error: "request timed out".to_string(),
            },
        ));

        let report = aggregator.finish(VerdictPolicy::Strict, false);
        assert_eq!(report.links_checked, 3);
        assert_eq!(report.broken_count, 1);
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.links_unchecked, 0);
        assert_eq!(report.broken_links[0].link, "/y");
        assert_eq!(report.broken_links[0].url, "https://x/y");
        assert!(!report.is_clean());
    }

    #[test]
    fn test_ok_result_adds_no_findings() {
        let mut aggregator = Aggregator::new();
        aggregator.record(result("https://x/ok", Outcome::Ok));
        let report = aggregator.finish(VerdictPolicy::Strict, false);
        assert_eq!(report.broken_count, 0);
        assert_eq!(report.failed_count, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_verdict_policies() {
        let failed_only = || {
            let mut aggregator = Aggregator::new();
            aggregator.record(result(
                "https://x/slow",
                Outcome::Failed {
                    error: "request timed out".to_string(),
                },
            ));
            aggregator
        };

        assert!(!failed_only().finish(VerdictPolicy::Strict, false).is_clean());
        assert!(failed_only().finish(VerdictPolicy::Lenient, false).is_clean());

        let mut broken = Aggregator::new();
        broken.record(result("https://x/y", Outcome::Broken { status: 404 }));
        assert!(!broken.finish(VerdictPolicy::Lenient, false).is_clean());
    }

    #[test]
    fn test_page_failures_only_count_when_fatal() {
        let unreachable_site = |fatal: bool| {
            let mut aggregator = Aggregator::new().page_errors_fatal(fatal);
            aggregator.page_failed("https://x/", "HTTP 503".to_string());
            aggregator.page_failed("https://x/pricing/", "HTTP 503".to_string());
            aggregator.finish(VerdictPolicy::Lenient, false)
        };

        let report = unreachable_site(false);
        assert_eq!(report.pages_failed, 2);
        assert!(report.is_clean());

        let report = unreachable_site(true);
        assert!(report.fail_on_page_errors);
        assert!(!report.is_clean());
        assert!(report.render_text().ends_with("Verdict: FAIL"));

        let loaded = Aggregator::new().page_errors_fatal(true);
        assert!(loaded.finish(VerdictPolicy::Strict, false).is_clean());
    }

    #[test]
    fn test_render_text_lists_findings() {
        let mut aggregator = Aggregator::new();
        aggregator.page_visited(5);
        aggregator.page_failed("https://x/down", "HTTP 500".to_string());
        aggregator.scheduled(3);
        aggregator.record(result("https://x/y", Outcome::Broken { status: 404 }));

        let text = aggregator.finish(VerdictPolicy::Strict, true).render_text();
        assert!(text.contains("Broken links: 1"));
        assert!(text.contains("- Page: https://x/\n  Link: /y\n  Text: Y\n  Status: 404"));
        assert!(text.contains("2 scheduled links not checked"));
        assert!(text.contains("- https://x/down (HTTP 500)"));
        assert!(text.ends_with("Verdict: FAIL"));
    }

    #[test]
    fn test_summary_message() {
        let clean = Aggregator::new().finish(VerdictPolicy::Strict, false);
        assert_eq!(clean.summary_message(), "No broken links (404s) should be found");

        let mut aggregator = Aggregator::new();
        aggregator.record(result("https://x/y", Outcome::Broken { status: 404 }));
        let report = aggregator.finish(VerdictPolicy::Strict, false);
        assert_eq!(
            report.summary_message(),
            "Found 1 broken links:\n  - https://x/y (404) on page: https://x/"
        );
    }

    #[test]
    fn test_json_output() {
        let mut aggregator = Aggregator::new();
        aggregator.record(result("https://x/y", Outcome::Broken { status: 404 }));
        let json = aggregator.finish(VerdictPolicy::Lenient, false).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["broken_count"], 1);
        assert_eq!(value["verdict_policy"], "lenient");
        assert_eq!(value["broken_links"][0]["status"], 404);
        assert_eq!(value["clean"], false);
    }
}

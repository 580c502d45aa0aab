// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands, one per seed source:
//   link-sentinel pages https://example.com/ https://example.com/pricing/
//   link-sentinel sitemap https://example.com/sitemap.xml --sample 10
//
// Both share the same checking options (CheckOptions). Options left unset
// keep the value from the config file, or the built-in default. The sitemap
// command also fails the run when a listed page can't be loaded, unless
// --allow-page-errors is given.
// =============================================================================

use clap::{Args, Parser, Subcommand, ValueEnum};
use link_sentinel::config::{BrokenPolicy, CheckConfig, DedupScope, VerdictPolicy};
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "link-sentinel",
    version,
    about = "Checks the links on a site's key pages and reports broken links",
    long_about = "link-sentinel loads a set of seed pages, samples the links on each one, \
                  and probes them with rate-limited HEAD requests. It exits non-zero when \
                  broken links (or, in strict mode, failed requests) are found, which makes \
                  it easy to drop into a CI pipeline."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the links on a fixed list of pages
    ///
    /// Example: link-sentinel pages https://example.com/ https://example.com/blog/
    Pages {
        /// Seed page URLs, checked in the order given
        #[arg(required = true)]
        urls: Vec<String>,

        #[command(flatten)]
        options: CheckOptions,
    },

    /// Check the links on the pages listed in a sitemap.xml
    ///
    /// Example: link-sentinel sitemap https://example.com/sitemap.xml --sample 10
    Sitemap {
        /// URL of the sitemap (a <urlset> or a <sitemapindex>)
        sitemap_url: String,

        /// Only crawl a random sample of this many sitemap pages (at least 1)
        #[arg(long)]
        sample: Option<NonZeroUsize>,

        /// Report sitemap pages that fail to load without failing the run
        #[arg(long)]
        allow_page_errors: bool,

        #[command(flatten)]
        options: CheckOptions,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokenStatus {
    /// Only 404 counts as broken
    NotFound,
    /// Any 4xx or 5xx counts as broken
    AnyError,
}

#[derive(Args, Debug, Default)]
pub struct CheckOptions {
    /// Output the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// JSON config file; flags given on the command line override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum links probed per page (0 = all)
    #[arg(long)]
    pub max_links_per_page: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Whole-session timeout in seconds; partial results are still reported
    #[arg(long)]
    pub session_timeout_secs: Option<u64>,

    /// Pause after each probe, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Number of probes in flight at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Also probe links to other hosts
    #[arg(long)]
    pub include_external: bool,

    /// Host treated as "the site" (defaults to each seed page's host)
    #[arg(long)]
    pub site_host: Option<String>,

    /// Extra URL substring to skip (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Drop the built-in exclusion list, keeping only --exclude patterns
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Whether a URL seen on one page is skipped on later pages
    #[arg(long, value_enum)]
    pub dedup_scope: Option<DedupScope>,

    /// Which statuses count as broken
    #[arg(long, value_enum, conflicts_with = "broken_code")]
    pub broken_status: Option<BrokenStatus>,

    /// Exact status code that counts as broken (repeatable)
    #[arg(long = "broken-code", value_name = "CODE")]
    pub broken_code: Vec<u16>,

    /// Failed requests are reported but don't fail the run
    #[arg(long)]
    pub lenient: bool,

    /// Fail the run when a seed page can't be loaded or isn't HTML/Markdown
    #[arg(long)]
    pub fail_on_page_errors: bool,

    /// Extra attempts for requests that fail at the network level
    #[arg(long)]
    pub retries: Option<u32>,

    /// First retry delay in milliseconds, doubled on each attempt
    #[arg(long)]
    pub retry_backoff_ms: Option<u64>,

    /// Seed for link sampling, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long)]
    pub user_agent: Option<String>,
}

impl CheckOptions {
    /// Applies the flags that were actually given on top of `config`
    pub fn apply(&self, config: &mut CheckConfig) {
        if let Some(max) = self.max_links_per_page {
            config.max_links_per_page = max;
        }
        if let Some(secs) = self.timeout_secs {
            config.probe_timeout_secs = secs;
        }
        if let Some(secs) = self.session_timeout_secs {
            config.session_timeout_secs = secs;
        }
        if let Some(ms) = self.delay_ms {
            config.delay_ms = ms;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if self.include_external {
            config.include_external = true;
        }
        if let Some(host) = &self.site_host {
            config.site_host = Some(host.clone());
        }
        if self.no_default_excludes {
            config.exclude_patterns.clear();
        }
        config.exclude_patterns.extend(self.exclude.iter().cloned());
        if let Some(scope) = self.dedup_scope {
            config.dedup_scope = scope;
        }
        match self.broken_status {
            Some(BrokenStatus::NotFound) => config.broken_policy = BrokenPolicy::NotFound,
            Some(BrokenStatus::AnyError) => config.broken_policy = BrokenPolicy::AnyError,
            None => {}
        }
        if !self.broken_code.is_empty() {
            config.broken_policy = BrokenPolicy::Listed {
                codes: self.broken_code.clone(),
            };
        }
        if self.lenient {
            config.verdict_policy = VerdictPolicy::Lenient;
        }
        if self.fail_on_page_errors {
            config.fail_on_page_errors = true;
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(ms) = self.retry_backoff_ms {
            config.retry_backoff_ms = ms;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(agent) = &self.user_agent {
            config.user_agent = agent.clone();
        }
    }
}

// src/crawl/session.rs
// =============================================================================
// One link checking run, from seed pages to report.
//
// How it works:
// 1. Ask the seed source for the pages to start from (fatal if it can't)
// 2. For each seed page, in order:
//    a. load the page and get its raw anchors (LinkSource)
//    b. normalize -> filter -> dedup each href
//    c. sample down to max_links_per_page
//    d. probe the survivors through a bounded worker pool, pausing after
//       each probe, recording every result into the aggregator
// 3. Build the report
//
// The whole of step 2 runs under the session timeout. If it expires, the
// in-flight probes are dropped and the report is built from whatever the
// aggregator already holds.
// =============================================================================

use super::registry::DedupRegistry;
use super::sampler::Sampler;
use super::source::{LinkSource, SeedSource};
use crate::checker::{
    normalize_url, CheckTarget, ExclusionFilter, LinkCandidate, ProbeTransport, Prober, RawLink,
};
use crate::config::{CheckConfig, DedupScope};
use crate::error::Result;
use crate::report::{Aggregator, CrawlReport};
use futures::stream::{self, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};
use url::Url;

pub struct CrawlSession {
    config: CheckConfig,
    seeds: Box<dyn SeedSource>,
    links: Box<dyn LinkSource>,
    prober: Prober,
    filter: ExclusionFilter,
}

impl CrawlSession {
    pub fn new(
        config: CheckConfig,
        seeds: Box<dyn SeedSource>,
        links: Box<dyn LinkSource>,
        transport: Arc<dyn ProbeTransport>,
    ) -> Result<Self> {
        config.validate()?;
        let prober = Prober::new(transport, &config)?;
        let filter = ExclusionFilter::new(&config.exclude_patterns, config.include_external);

        Ok(Self {
            config,
            seeds,
            links,
            prober,
            filter,
        })
    }

    /// Runs the whole session. Only a missing seed source is an error;
    /// everything that goes wrong per page or per link ends up in the report.
    pub async fn run(&self) -> Result<CrawlReport> {
        let pages = self.seeds.seeds().await?;
        info!(pages = pages.len(), "starting link check session");

        let aggregator =
            Mutex::new(Aggregator::new().page_errors_fatal(self.config.fail_on_page_errors));
        let mut sampler = Sampler::new(self.config.seed);

        let crawl = self.check_pages(&pages, &aggregator, &mut sampler);
        let timed_out = match tokio::time::timeout(self.config.session_timeout(), crawl).await {
            Ok(()) => false,
            Err(_) => {
                warn!(
                    timeout_secs = self.config.session_timeout_secs,
                    "session timed out, reporting partial results"
                );
                true
            }
        };

        let aggregator = aggregator.into_inner().unwrap_or_else(PoisonError::into_inner);
        let report = aggregator.finish(self.config.verdict_policy, timed_out);
        info!(
            checked = report.links_checked,
            broken = report.broken_count,
            failed = report.failed_count,
            clean = report.clean,
            "link check session finished"
        );
        Ok(report)
    }

    async fn check_pages(
        &self,
        pages: &[Url],
        aggregator: &Mutex<Aggregator>,
        sampler: &mut Sampler,
    ) {
        let session_registry = DedupRegistry::new();

        for page in pages {
            let page_registry;
            let registry = match self.config.dedup_scope {
                DedupScope::Session => &session_registry,
                DedupScope::Page => {
                    page_registry = DedupRegistry::new();
                    &page_registry
                }
            };
            self.check_page(page, registry, aggregator, sampler).await;
        }
    }

    async fn check_page(
        &self,
        page: &Url,
        registry: &DedupRegistry,
        aggregator: &Mutex<Aggregator>,
        sampler: &mut Sampler,
    ) {
        let raw_links = match self.links.links(page).await {
            Ok(links) => links,
            Err(e) => {
                warn!(page = %page, error = %e, "failed to process page");
                lock(aggregator).page_failed(page.as_str(), e.to_string());
                return;
            }
        };

        let discovered = raw_links.len();
        let site_host = self
            .config
            .site_host
            .clone()
            .or_else(|| page.host_str().map(str::to_string))
            .unwrap_or_default();

        let unique = select_targets(page, raw_links, &self.filter, &site_host, registry);
        let unique_count = unique.len();
        let targets = sampler.sample(unique, self.config.max_links_per_page);

        {
            let mut aggregator = lock(aggregator);
            aggregator.page_visited(discovered);
            aggregator.scheduled(targets.len());
        }
        info!(
            page = %page,
            discovered,
            unique = unique_count,
            checking = targets.len(),
            "checking links"
        );

        let delay = self.config.delay();
        let prober = &self.prober;

        // Bounded worker pool; the await is the completion barrier for the page
        stream::iter(targets)
            .for_each_concurrent(self.config.concurrency, |target| async move {
                let result = prober.check(target).await;
                lock(aggregator).record(result);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            })
            .await;
    }
}

/// normalize -> filter -> dedup for one page's anchors
///
/// URLs are registered as they are selected, so a URL that appears on a
/// later page (or twice on this one) is not scheduled again.
pub fn select_targets(
    page: &Url,
    links: Vec<RawLink>,
    filter: &ExclusionFilter,
    site_host: &str,
    registry: &DedupRegistry,
) -> Vec<CheckTarget> {
    let mut targets = Vec::new();

    for link in links {
        let Some(url) = normalize_url(&link.href, page.as_str()) else {
            continue;
        };
        if !filter.is_checkable(&url, site_host) {
            continue;
        }
        if !registry.insert(&url) {
            continue;
        }

        targets.push(CheckTarget {
            url,
            candidate: LinkCandidate {
                source_page: page.to_string(),
                raw_href: link.href,
                anchor_text: link.text,
            },
        });
    }

    targets
}

fn lock(aggregator: &Mutex<Aggregator>) -> MutexGuard<'_, Aggregator> {
    aggregator.lock().unwrap_or_else(PoisonError::into_inner)
}

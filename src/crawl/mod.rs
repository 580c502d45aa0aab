// src/crawl/mod.rs
// =============================================================================
// This module runs a link checking session across a set of seed pages.
//
// Features:
// - Seed pages from a fixed list or a sitemap.xml
// - Session-wide (or per-page) deduplication of URLs
// - Per-page sampling to bound run time
// - Polite, rate-limited probing through a bounded worker pool
// - A whole-session timeout that keeps partial results
// =============================================================================

mod registry;
mod sampler;
mod session;
mod source;

pub use registry::DedupRegistry;
pub use sampler::Sampler;
pub use session::{select_targets, CrawlSession};
pub use source::{
    build_client, parse_sitemap, FixedSeeds, HttpLinkSource, LinkSource, ParsedSitemap,
    SeedSource, SitemapKind, SitemapSeeds,
};

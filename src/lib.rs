// src/lib.rs
// =============================================================================
// link-sentinel as a library.
//
// The CLI in main.rs is one harness; test suites can drive a CrawlSession
// directly and assert on `report.is_clean()`.
//
// Modules:
// - checker: per-link logic (extract, normalize, filter, probe)
// - crawl:   the session (seeds, dedup, sampling, worker pool, timeouts)
// - report:  aggregation, rendering and the verdict
// - config:  every tunable knob, loadable from JSON
// - error:   the crate's error types
// =============================================================================

pub mod checker;
pub mod config;
pub mod crawl;
pub mod error;
pub mod report;

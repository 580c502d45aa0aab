// src/checker/mod.rs
// =============================================================================
// This module contains the per-link logic of the pipeline.
//
// Submodules:
// - html / markdown: pull raw (href, text) pairs out of a loaded page
// - normalize: raw href -> canonical absolute URL (or nothing)
// - filter: is this URL worth probing?
// - http: probe a URL and classify the outcome
//
// This file (mod.rs) is the module root. It also holds the small value
// types that flow between the submodules.
// =============================================================================

mod filter;
mod html;
mod http;
mod markdown;
mod normalize;

pub use filter::ExclusionFilter;
pub use html::extract_html_links;
pub use http::{
    CheckResult, HttpTransport, Outcome, ProbeMethod, ProbeRequest, ProbeTransport, Prober,
};
pub use markdown::extract_markdown_links;
pub use normalize::normalize_url;

/// An anchor exactly as it appears on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    pub href: String,
    pub text: String,
}

/// Where a link was found and how the author wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub source_page: String,
    pub raw_href: String,
    pub anchor_text: String,
}

/// A candidate that survived normalization, filtering and dedup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTarget {
    pub url: String,
    pub candidate: LinkCandidate,
}

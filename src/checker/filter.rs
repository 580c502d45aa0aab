// src/checker/filter.rs
// =============================================================================
// Decides whether a normalized URL is worth probing.
//
// Two independent rules:
// - pattern exclusion: case-insensitive substring match against a configured
//   list (fragments, mailto:, binary assets, localhost, ...)
// - host scope: unless external links are enabled, only URLs on the site's
//   own host are probed. Third-party sites are slow and flaky, and their
//   breakage is rarely actionable for the site owner.
// =============================================================================

use url::Url;

#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    // Stored lowercased so matching is a plain substring test
    patterns: Vec<String>,
    include_external: bool,
}

impl ExclusionFilter {
    pub fn new<I, S>(patterns: I, include_external: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            patterns,
            include_external,
        }
    }

    /// True when the URL matches one of the exclusion patterns
    pub fn is_excluded(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        self.patterns.iter().any(|pattern| lower.contains(pattern.as_str()))
    }

    /// True when the URL is on `site_host` (or external links are allowed)
    pub fn in_scope(&self, url: &str, site_host: &str) -> bool {
        if self.include_external {
            return true;
        }
        match Url::parse(url) {
            Ok(parsed) => parsed
                .host_str()
                .map_or(false, |host| same_site(host, site_host)),
            Err(_) => false,
        }
    }

    /// The full decision: not excluded and in scope
    pub fn is_checkable(&self, url: &str, site_host: &str) -> bool {
        !self.is_excluded(url) && self.in_scope(url, site_host)
    }
}

// "www.example.com" and "example.com" are the same site, and so is any
// subdomain of the site host ("docs.example.com").
fn same_site(host: &str, site_host: &str) -> bool {
    let host = host.to_lowercase();
    let site = site_host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let site = site.strip_prefix("www.").unwrap_or(&site);

    host == site || host.ends_with(&format!(".{}", site))
}

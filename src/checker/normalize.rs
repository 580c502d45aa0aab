// src/checker/normalize.rs
// =============================================================================
// Turns a raw href into a canonical absolute URL.
//
// Only two href shapes are accepted:
// - root-relative paths ("/docs"), joined onto the page's scheme + host
// - absolute http(s) URLs ("https://example.com/docs")
//
// Everything else (protocol-relative "//cdn...", "?q=1", "#top", "mailto:",
// "tel:", "javascript:", "data:", plain relative paths, garbage) yields None.
// Normalization never fails loudly: an href we can't use is simply dropped.
// =============================================================================

use url::Url;

// Resolves an href found on `base_url` to a canonical absolute URL
//
// Examples:
//   base = "https://example.com/page"
//   href = "/docs"                -> Some("https://example.com/docs")
//   href = "https://other.com"    -> Some("https://other.com/")
//   href = "//cdn.example.com/x"  -> None
//   href = "mailto:a@b.com"       -> None
pub fn normalize_url(href: &str, base_url: &str) -> Option<String> {
    let href = href.trim();

    if href.starts_with('/') {
        if href.starts_with("//") {
            return None;
        }
        let base = Url::parse(base_url).ok()?;
        if !is_web_scheme(base.scheme()) {
            return None;
        }
        let joined = base.join(href).ok()?;
        // "/\host" and "/<tab>/host" parse as an authority, not a path
        if joined.host_str() != base.host_str()
            || joined.port_or_known_default() != base.port_or_known_default()
        {
            return None;
        }
        return Some(joined.to_string());
    }

    if has_http_prefix(href) {
        let url = Url::parse(href).ok()?;
        // "http://" on its own parses with an empty host on some inputs
        if url.host_str().map_or(true, str::is_empty) {
            return None;
        }
        return Some(url.to_string());
    }

    None
}

fn has_http_prefix(href: &str) -> bool {
    let lower = href.get(..8).unwrap_or(href).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn is_web_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}

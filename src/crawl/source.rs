// src/crawl/source.rs
// =============================================================================
// Where seed pages and their links come from.
//
// The crawl session only depends on two capabilities:
// - SeedSource: "give me the pages to start from"
// - LinkSource: "give me the (href, text) pairs on this page"
//
// This file provides the concrete implementations used by the CLI:
// - FixedSeeds: a list of URLs from the command line / config
// - SitemapSeeds: the <loc> entries of a sitemap.xml (optionally sampled)
// - HttpLinkSource: fetches a page with reqwest and extracts anchors from
//   HTML (scraper) or Markdown (pulldown-cmark)
// =============================================================================

use super::sampler::Sampler;
use crate::checker::{extract_html_links, extract_markdown_links, RawLink};
use crate::config::CheckConfig;
use crate::error::{CheckError, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

#[async_trait]
pub trait SeedSource: Send + Sync {
    /// Seed pages in crawl order. An error here ends the session.
    async fn seeds(&self) -> Result<Vec<Url>>;
}

#[async_trait]
pub trait LinkSource: Send + Sync {
    /// All anchors on `page`, hrefs as written
    async fn links(&self, page: &Url) -> Result<Vec<RawLink>>;
}

// Client shared by page loads and sitemap fetches
pub fn build_client(config: &CheckConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.probe_timeout())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;
    Ok(client)
}

/// A fixed, ordered list of seed URLs
#[derive(Debug, Clone)]
pub struct FixedSeeds {
    urls: Vec<String>,
}

impl FixedSeeds {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }
}

#[async_trait]
impl SeedSource for FixedSeeds {
    async fn seeds(&self) -> Result<Vec<Url>> {
        if self.urls.is_empty() {
            return Err(CheckError::SourceUnavailable("no seed URLs configured".to_string()));
        }

        self.urls
            .iter()
            .map(|raw| {
                Url::parse(raw).map_err(|e| {
                    CheckError::SourceUnavailable(format!("invalid seed URL '{}': {}", raw, e))
                })
            })
            .collect()
    }
}

/// Seeds read from a sitemap.xml
///
/// A sitemap index is followed one level: each child sitemap is fetched and
/// its pages are collected. Child sitemaps that fail are skipped.
pub struct SitemapSeeds {
    client: Client,
    sitemap_url: String,
    sample: Option<usize>,
    rng_seed: Option<u64>,
}

impl SitemapSeeds {
    pub fn new(client: Client, sitemap_url: impl Into<String>) -> Self {
        Self {
            client,
            sitemap_url: sitemap_url.into(),
            sample: None,
            rng_seed: None,
        }
    }

    /// Only crawl a random `size` pages of the sitemap (0 keeps them all)
    pub fn with_sample(mut self, size: usize, rng_seed: Option<u64>) -> Self {
        self.sample = Some(size);
        self.rng_seed = rng_seed;
        self
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CheckError::SourceUnavailable(format!("failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(CheckError::SourceUnavailable(format!(
                "failed to fetch {}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| CheckError::SourceUnavailable(format!("failed to read {}: {}", url, e)))
    }
}

#[async_trait]
impl SeedSource for SitemapSeeds {
    async fn seeds(&self) -> Result<Vec<Url>> {
        let xml = self.fetch(&self.sitemap_url).await?;
        let sitemap = parse_sitemap(&xml)?;

        let locs = match sitemap.kind {
            SitemapKind::UrlSet => sitemap.locs,
            SitemapKind::Index => {
                let mut pages = Vec::new();
                for child in &sitemap.locs {
                    match self.fetch(child).await.and_then(|xml| parse_sitemap(&xml)) {
                        Ok(parsed) if parsed.kind == SitemapKind::UrlSet => {
                            pages.extend(parsed.locs)
                        }
                        Ok(_) => warn!(sitemap = %child, "nested sitemap index skipped"),
                        Err(e) => warn!(sitemap = %child, error = %e, "child sitemap skipped"),
                    }
                }
                pages
            }
        };

        let mut seeds = Vec::with_capacity(locs.len());
        for loc in locs {
            match Url::parse(&loc) {
                Ok(url) => seeds.push(url),
                Err(e) => warn!(loc = %loc, error = %e, "ignoring invalid sitemap entry"),
            }
        }

        if seeds.is_empty() {
            return Err(CheckError::SourceUnavailable(format!(
                "sitemap {} lists no pages",
                self.sitemap_url
            )));
        }

        info!(sitemap = %self.sitemap_url, pages = seeds.len(), "sitemap loaded");

        match self.sample {
            Some(size) => Ok(Sampler::new(self.rng_seed).sample(seeds, size)),
            None => Ok(seeds),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    UrlSet,
    Index,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSitemap {
    pub kind: SitemapKind,
    pub locs: Vec<String>,
}

/// Reads the <loc> values of a `<urlset>` or `<sitemapindex>` document
pub fn parse_sitemap(xml: &str) -> Result<ParsedSitemap> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut kind = None;
    let mut in_loc = false;
    let mut locs = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"urlset" => kind = Some(SitemapKind::UrlSet),
                b"sitemapindex" => kind = Some(SitemapKind::Index),
                b"loc" => in_loc = true,
                _ => {}
            },
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                }
            }
            Ok(Event::Text(text)) if in_loc => {
                let loc = text.unescape().map_err(|e| {
                    CheckError::SourceUnavailable(format!("invalid sitemap XML: {}", e))
                })?;
                locs.push(loc.trim().to_string());
            }
            Ok(Event::CData(data)) if in_loc => {
                locs.push(String::from_utf8_lossy(&data.into_inner()).trim().to_string());
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CheckError::SourceUnavailable(format!(
                    "invalid sitemap XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    let kind = kind.ok_or_else(|| {
        CheckError::SourceUnavailable(
            "document is not a sitemap (no <urlset> or <sitemapindex>)".to_string(),
        )
    })?;
    locs.retain(|loc| !loc.is_empty());

    Ok(ParsedSitemap { kind, locs })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageFormat {
    Html,
    Markdown,
}

impl PageFormat {
    // A missing Content-Type is read as HTML; a `.md` path wins over text/plain
    fn detect(content_type: Option<&str>, path: &str) -> Option<Self> {
        match content_type {
            Some(ct) if ct.contains("markdown") => Some(PageFormat::Markdown),
            _ if path.ends_with(".md") => Some(PageFormat::Markdown),
            Some(ct) if ct.contains("html") => Some(PageFormat::Html),
            None => Some(PageFormat::Html),
            Some(_) => None,
        }
    }
}

/// Loads pages over HTTP and extracts their anchors
pub struct HttpLinkSource {
    client: Client,
}

impl HttpLinkSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LinkSource for HttpLinkSource {
    async fn links(&self, page: &Url) -> Result<Vec<RawLink>> {
        let page_load = |reason: String| CheckError::PageLoad {
            url: page.to_string(),
            reason,
        };

        let response = self
            .client
            .get(page.clone())
            .send()
            .await
            .map_err(|e| page_load(e.to_string()))?;

        if !response.status().is_success() {
            return Err(page_load(format!("HTTP {}", response.status())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);
        let format = PageFormat::detect(content_type.as_deref(), page.path()).ok_or_else(|| {
            page_load(format!(
                "unsupported content type {}",
                content_type.as_deref().unwrap_or_default()
            ))
        })?;

        let body = response.text().await.map_err(|e| page_load(e.to_string()))?;

        let links = match format {
            PageFormat::Html => extract_html_links(&body),
            PageFormat::Markdown => extract_markdown_links(&body),
        };
        debug!(page = %page, links = links.len(), ?format, "page loaded");

        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc><lastmod>2024-01-01</lastmod></url>
  <url><loc> https://example.com/pricing/ </loc></url>
  <url><loc>https://example.com/blog/?a=1&amp;b=2</loc></url>
</urlset>"#;

    #[test]
    fn test_parse_urlset() {
        let sitemap = parse_sitemap(URLSET).unwrap();
        assert_eq!(sitemap.kind, SitemapKind::UrlSet);
        assert_eq!(
            sitemap.locs,
            vec![
                "https://example.com/",
                "https://example.com/pricing/",
                "https://example.com/blog/?a=1&b=2",
            ]
        );
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sitemap><loc>https://example.com/sitemap-1.xml</loc></sitemap>
        </sitemapindex>"#;
        let sitemap = parse_sitemap(xml).unwrap();
        assert_eq!(sitemap.kind, SitemapKind::Index);
        assert_eq!(sitemap.locs, vec!["https://example.com/sitemap-1.xml"]);
    }

    #[test]
    fn test_non_sitemap_is_source_unavailable() {
        let result = parse_sitemap("<html><body>Not found</body></html>");
        assert!(matches!(result, Err(CheckError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_fixed_seeds() {
        let seeds = FixedSeeds::new(vec!["https://example.com/".to_string()]);
        let urls = seeds.seeds().await.unwrap();
        assert_eq!(urls[0].as_str(), "https://example.com/");

        let empty = FixedSeeds::new(vec![]);
        assert!(matches!(empty.seeds().await, Err(CheckError::SourceUnavailable(_))));

        let invalid = FixedSeeds::new(vec!["not a url".to_string()]);
        assert!(matches!(invalid.seeds().await, Err(CheckError::SourceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_sitemap_seeds_follow_index() {
        let mock_server = MockServer::start().await;
        let index = format!(
            concat!(
                "<sitemapindex>",
                "<sitemap><loc>{0}/pages.xml</loc></sitemap>",
                "<sitemap><loc>{0}/missing.xml</loc></sitemap>",
                "</sitemapindex>"
            ),
            mock_server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pages.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(URLSET))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing.xml"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = build_client(&CheckConfig::default()).unwrap();
        let source = SitemapSeeds::new(client, format!("{}/sitemap.xml", mock_server.uri()));
        let seeds = source.seeds().await.unwrap();
        assert_eq!(seeds.len(), 3);
    }

    #[tokio::test]
    async fn test_sitemap_sample() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(URLSET))
            .mount(&mock_server)
            .await;

        let client = build_client(&CheckConfig::default()).unwrap();
        let source = SitemapSeeds::new(client, format!("{}/sitemap.xml", mock_server.uri()))
            .with_sample(2, Some(9));
        assert_eq!(source.seeds().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_sitemap_is_source_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = build_client(&CheckConfig::default()).unwrap();
        let source = SitemapSeeds::new(client, format!("{}/sitemap.xml", mock_server.uri()));
        assert!(matches!(
            source.seeds().await,
            Err(CheckError::SourceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_http_link_source_html_and_markdown() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<a href="/about">About us</a><a href="mailto:a@b.com">Mail</a>"#,
                "text/html; charset=utf-8",
            ))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/README.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("See [docs](/docs/)"))
            .mount(&mock_server)
            .await;

        let source = HttpLinkSource::new(build_client(&CheckConfig::default()).unwrap());

        let page = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
        let links = source.links(&page).await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "/about");
        assert_eq!(links[0].text, "About us");

        let readme = Url::parse(&format!("{}/README.md", mock_server.uri())).unwrap();
        let links = source.links(&readme).await.unwrap();
        assert_eq!(links[0].href, "/docs/");
    }

    #[tokio::test]
    async fn test_http_link_source_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let source = HttpLinkSource::new(build_client(&CheckConfig::default()).unwrap());
        let page = Url::parse(&format!("{}/down", mock_server.uri())).unwrap();
        assert!(matches!(
            source.links(&page).await,
            Err(CheckError::PageLoad { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_link_source_rejects_non_html_pages() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/report"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"links": ["/about"]}"#,
                "application/json",
            ))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/notes.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/x\">x</a>"))
            .mount(&mock_server)
            .await;

        let source = HttpLinkSource::new(build_client(&CheckConfig::default()).unwrap());
        for page in ["/report", "/notes.txt"] {
            let url = Url::parse(&format!("{}{}", mock_server.uri(), page)).unwrap();
            match source.links(&url).await {
                Err(CheckError::PageLoad { reason, .. }) => {
                    assert!(reason.contains("unsupported content type"), "{reason}")
                }
                other => panic!("expected a page load error for {page}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_page_format_detection() {
        assert_eq!(PageFormat::detect(Some("text/html"), "/"), Some(PageFormat::Html));
        assert_eq!(
            PageFormat::detect(Some("application/xhtml+xml"), "/"),
            Some(PageFormat::Html)
        );
        assert_eq!(PageFormat::detect(None, "/"), Some(PageFormat::Html));
        assert_eq!(
            PageFormat::detect(Some("text/markdown; charset=utf-8"), "/guide"),
            Some(PageFormat::Markdown)
        );
        assert_eq!(
            PageFormat::detect(Some("text/plain"), "/README.md"),
            Some(PageFormat::Markdown)
        );
        assert_eq!(PageFormat::detect(Some("application/pdf"), "/a"), None);
    }
}

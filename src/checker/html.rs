// src/checker/html.rs
// =============================================================================
// This module extracts anchors from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Hrefs are returned exactly as written in the page. Resolving them is the
// normalizer's job, so that the report can show the link the author wrote.
// =============================================================================

use super::RawLink;
use scraper::{ElementRef, Html, Selector};

// Extracts every <a href> on the page together with its visible text
//
// Example:
//   html = "<a href='/docs'>Read the <b>docs</b></a>"
//   result = [RawLink { href: "/docs", text: "Read the docs" }]
pub fn extract_html_links(html: &str) -> Vec<RawLink> {
    let document = Html::parse_document(html);

    // "a[href]" is a constant, known-valid selector
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            Some(RawLink {
                href: href.to_string(),
                text: anchor_text(&element),
            })
        })
        .collect()
}

// Visible text of an anchor, whitespace collapsed. Image-only links fall back
// to the image's alt text, then to the title attribute.
fn anchor_text(element: &ElementRef) -> String {
    let text = collapse_whitespace(&element.text().collect::<String>());
    if !text.is_empty() {
        return text;
    }

    if let Ok(img) = Selector::parse("img[alt]") {
        if let Some(alt) = element
            .select(&img)
            .filter_map(|i| i.value().attr("alt"))
            .map(collapse_whitespace)
            .find(|alt| !alt.is_empty())
        {
            return alt;
        }
    }

    element
        .value()
        .attr("title")
        .map(collapse_whitespace)
        .unwrap_or_default()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why return the raw href instead of an absolute URL?
//    - The report prints "Link: <href>" as the page author wrote it
//    - Normalization rules (root-relative + absolute http(s) only) live in
//      normalize.rs so every link source shares them
//
// 2. What does element.text() return?
//    - An iterator over every text node below the element
//    - "<a>Read <b>more</b></a>" yields "Read ", "more"
// -----------------------------------------------------------------------------

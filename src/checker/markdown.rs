// src/checker/markdown.rs
// =============================================================================
// This module extracts links from Markdown text.
//
// Seed pages are usually HTML, but documentation sites often serve raw
// `.md` files too. We use the `pulldown-cmark` crate which:
// - Parses Markdown into events (heading, paragraph, link, etc.)
// - Handles the CommonMark syntax, including inline and reference links
// - Is a streaming parser, so we never build a full tree
//
// Like the HTML extractor, hrefs come back raw; normalize.rs decides which
// ones are usable.
// =============================================================================

use super::RawLink;
use pulldown_cmark::{Event, Parser, Tag};

// Extracts every [text](href) link from Markdown text
//
// Example input:
//   "Check out [Rust](https://www.rust-lang.org)!"
//
// Example output:
//   [RawLink { href: "https://www.rust-lang.org", text: "Rust" }]
pub fn extract_markdown_links(markdown: &str) -> Vec<RawLink> {
    let mut links = Vec::new();

    // Markdown produces several events per link:
    // 1. Start(Link) - link begins, carries the destination
    // 2. Text / Code - the link text (possibly several pieces)
    // 3. End(Link) - link ends
    let mut current: Option<RawLink> = None;

    for event in Parser::new(markdown) {
        match event {
            // In pulldown-cmark 0.9, Link is Tag::Link(link_type, dest_url, title)
            Event::Start(Tag::Link(_link_type, dest_url, _title)) => {
                current = Some(RawLink {
                    href: dest_url.to_string(),
                    text: String::new(),
                });
            }

            Event::Text(text) | Event::Code(text) => {
                if let Some(link) = current.as_mut() {
                    link.text.push_str(&text);
                }
            }

            Event::SoftBreak | Event::HardBreak => {
                if let Some(link) = current.as_mut() {
                    link.text.push(' ');
                }
            }

            Event::End(Tag::Link(..)) => {
                if let Some(mut link) = current.take() {
                    link.text = link.text.split_whitespace().collect::<Vec<_>>().join(" ");
                    links.push(link);
                }
            }

            _ => {}
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_link() {
        let markdown = "Check out [Rust](https://www.rust-lang.org)!";
        let links = extract_markdown_links(markdown);
        assert_eq!(
            links,
            vec![RawLink {
                href: "https://www.rust-lang.org".to_string(),
                text: "Rust".to_string(),
            }]
        );
    }

    #[test]
    fn test_extract_multiple_links() {
        let markdown = r#"
# Resources

- [Rust](https://www.rust-lang.org)
- [Cargo](https://doc.rust-lang.org/cargo/)
- [Docs](/docs/)
        "#;
        let links = extract_markdown_links(markdown);
        assert_eq!(links.len(), 3);
        assert_eq!(links[2].href, "/docs/");
        assert_eq!(links[1].text, "Cargo");
    }

    #[test]
    fn test_code_in_link_text() {
        let markdown = "See [the `cargo` book](https://doc.rust-lang.org/cargo/)";
        let links = extract_markdown_links(markdown);
        assert_eq!(links[0].text, "the cargo book");
    }

    #[test]
    fn test_non_http_hrefs_are_kept_raw() {
        let markdown = "Email me at [email](mailto:test@example.com)";
        let links = extract_markdown_links(markdown);
        assert_eq!(links[0].href, "mailto:test@example.com");
    }
}

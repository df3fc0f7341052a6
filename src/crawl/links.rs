// src/crawl/links.rs
// =============================================================================
// This module extracts links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
//
// Each LinkType maps to a set of (selector, attribute) pairs:
// - hyperlink:   <a href>, <area href>, <frame src>, <iframe src>
// - image:       <img src>
// - code:        <script src>, <embed src>, <object data>
// - header-link: <link href>
//
// Relative links are resolved against <base href> when the page has one,
// otherwise against the page URL. Fragments are dropped, and only http/https
// links are returned.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

use super::LinkType;

fn sources(kind: LinkType) -> &'static [(&'static str, &'static str)] {
    match kind {
        LinkType::Hyperlink => &[
            ("a[href]", "href"),
            ("area[href]", "href"),
            ("frame[src]", "src"),
            ("iframe[src]", "src"),
        ],
        LinkType::Image => &[("img[src]", "src")],
        LinkType::Code => &[
            ("script[src]", "src"),
            ("embed[src]", "src"),
            ("object[data]", "data"),
        ],
        LinkType::HeaderLink => &[("link[href]", "href")],
    }
}

// Extracts all links of the requested kinds from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   page_url: the URL the page was fetched from
//   kinds: which link types to look for
//
// Returns: (absolute url, link type) pairs in document order per kind,
// duplicates included (the engine de-duplicates)
pub fn extract_links(html: &str, page_url: &Url, kinds: &[LinkType]) -> Vec<(Url, LinkType)> {
    let mut links = Vec::new();

    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);

    for &kind in kinds {
        for (css, attr) in sources(kind) {
            // The selectors are constants, so parsing can't fail
            let selector = Selector::parse(css).unwrap();

            for element in document.select(&selector) {
                if let Some(value) = element.value().attr(attr) {
                    if let Some(url) = resolve_url(&base, value) {
                        links.push((url, kind));
                    }
                }
            }
        }
    }

    links
}

// Honours <base href="..."> if present and valid
fn document_base(document: &Html, page_url: &Url) -> Url {
    let selector = Selector::parse("base[href]").unwrap();

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

// Resolves a possibly-relative URL to an absolute http(s) URL without fragment
//
// Examples:
//   base = "https://example.com/page"
//   href = "/docs" -> Some("https://example.com/docs")
//   href = "#top" -> Some("https://example.com/page")
//   href = "mailto:a@b.c" -> None
fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.starts_with("javascript:") {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://example.com/docs/page.html").unwrap()
    }

    fn urls(links: &[(Url, LinkType)]) -> Vec<&str> {
        links.iter().map(|(url, _)| url.as_str()).collect()
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<a href="https://www.rust-lang.org">Rust</a>"#;
        let links = extract_links(html, &page(), &[LinkType::Hyperlink]);
        assert_eq!(urls(&links), vec!["https://www.rust-lang.org/"]);
    }

    #[test]
    fn test_resolve_relative_link() {
        let html = r#"<a href="../about.html">About</a>"#;
        let links = extract_links(html, &page(), &[LinkType::Hyperlink]);
        assert_eq!(urls(&links), vec!["https://example.com/about.html"]);
    }

    #[test]
    fn test_skip_mailto_and_javascript() {
        let html = r#"
            <a href="mailto:test@example.com">Email</a>
            <a href="javascript:void(0)">Nothing</a>
        "#;
        let links = extract_links(html, &page(), &[LinkType::Hyperlink]);
        assert!(links.is_empty());
    }

    #[test]
    fn test_fragment_is_dropped() {
        let html = r##"<a href="other.html#section">Other</a>"##;
        let links = extract_links(html, &page(), &[LinkType::Hyperlink]);
        assert_eq!(urls(&links), vec!["https://example.com/docs/other.html"]);
    }

    #[test]
    fn test_only_requested_kinds() {
        let html = r#"
            <link rel="stylesheet" href="style.css">
            <script src="app.js"></script>
            <img src="logo.png">
            <a href="next.html">Next</a>
        "#;

        let images = extract_links(html, &page(), &[LinkType::Image]);
        assert_eq!(urls(&images), vec!["https://example.com/docs/logo.png"]);
        assert_eq!(images[0].1, LinkType::Image);

        let all = extract_links(html, &page(), &LinkType::DEFAULT);
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_base_href_is_used() {
        let html = r#"
            <head><base href="https://cdn.example.com/assets/"></head>
            <img src="logo.png">
        "#;
        let links = extract_links(html, &page(), &[LinkType::Image]);
        assert_eq!(urls(&links), vec!["https://cdn.example.com/assets/logo.png"]);
    }
}

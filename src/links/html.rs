// src/links/html.rs
// =============================================================================
// Extracts same-site outbound links from a rendered page's HTML.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Each href is resolved against the page it was found on (or the page's
// <base href>, when it declares one), then canonicalized against the site
// base and run through the exclusion filter. Only links that survive all
// three steps are returned.
// =============================================================================

use super::canonical::{CanonicalUrl, SiteBase};
use super::filter::UrlFilter;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

// Extracts the same-site links of a page
//
// Parameters:
//   html: the rendered HTML of the page
//   page_url: the URL the page actually landed on (for relative links)
//   base: the site being crawled
//   filter: exclusion patterns
//
// Returns: canonical URLs in document order, without duplicates
//
// Example:
//   html = "<a href='team'>Team</a><a href='https://other.com'>X</a>"
//   page_url = "https://example.com/about/"
//   result = ["https://example.com/about/team/"]
pub fn extract_site_links(
    html: &str,
    page_url: &str,
    base: &SiteBase,
    filter: &UrlFilter,
) -> Vec<CanonicalUrl> {
    let document = Html::parse_document(html);

    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let page = match Url::parse(page_url) {
        Ok(url) => url,
        Err(_) => {
            tracing::debug!(page_url, "cannot resolve links against unparsable page URL");
            return Vec::new();
        }
    };
    let resolve_base = document_base(&document, &page).unwrap_or(page);

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if is_non_navigational(href) {
            continue;
        }

        let Ok(absolute) = resolve_base.join(href.trim()) else {
            continue;
        };
        let Some(canonical) = base.canonicalize(absolute.as_str()) else {
            continue;
        };
        if filter.is_excluded(canonical.as_str()) {
            continue;
        }
        if seen.insert(canonical.clone()) {
            links.push(canonical);
        }
    }

    links
}

// The <base href> of the document, resolved against the page URL
fn document_base(document: &Html, page: &Url) -> Option<Url> {
    let selector = Selector::parse("base[href]").ok()?;
    let href = document.select(&selector).next()?.value().attr("href")?;
    page.join(href.trim()).ok()
}

// Skip anchors and special protocols
fn is_non_navigational(href: &str) -> bool {
    let href = href.trim();
    href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
        || href.starts_with("data:")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SiteBase {
        SiteBase::from_seed("https://example.com").unwrap()
    }

    fn extract(html: &str, page_url: &str) -> Vec<String> {
        extract_site_links(html, page_url, &base(), &UrlFilter::default())
            .into_iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[test]
    fn test_relative_link_resolves_against_page() {
        let links = extract(r#"<a href="team">Team</a>"#, "https://example.com/about/");
        assert_eq!(links, vec!["https://example.com/about/team/"]);
    }

    #[test]
    fn test_skips_foreign_and_special_links() {
        let html = r##"
            <a href="https://other.com/x">Other</a>
            <a href="mailto:test@example.com">Email</a>
            <a href="#section">Anchor</a>
            <a href="javascript:void(0)">JS</a>
            <a href="/contact">Contact</a>
        "##;
        let links = extract(html, "https://example.com/");
        assert_eq!(links, vec!["https://example.com/contact/"]);
    }

    #[test]
    fn test_duplicates_collapse_after_canonicalization() {
        let html = r#"
            <a href="/docs">Docs</a>
            <a href="/docs/">Docs again</a>
            <a href="https://www.example.com/docs#intro">Docs intro</a>
        "#;
        let links = extract(html, "https://example.com/");
        assert_eq!(links, vec!["https://example.com/docs/"]);
    }

    #[test]
    fn test_exclusion_filter_applied() {
        let filter = UrlFilter::new(vec!["/cart".to_string()], vec![], vec![]);
        let html = r#"<a href="/cart">Cart</a><a href="/shop">Shop</a>"#;
        let links: Vec<String> = extract_site_links(html, "https://example.com/", &base(), &filter)
            .into_iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(links, vec!["https://example.com/shop/"]);
    }

    #[test]
    fn test_base_href_respected() {
        let html = r#"<head><base href="/blog/"></head><a href="post-1">Post</a>"#;
        let links = extract(html, "https://example.com/");
        assert_eq!(links, vec!["https://example.com/blog/post-1/"]);
    }
}

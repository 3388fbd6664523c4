// src/links/filter.rs
// =============================================================================
// Pattern-based URL filtering and classification.
//
// Three independent lists come from the configuration:
// - exclude patterns: any match and the URL is never crawled
// - product / category patterns: only label the page, never filter it
// - blocked resource types and domains: not used here at all; the rendering
//   agent applies them to sub-resource requests (see fetch/agent.rs)
//
// All matching is plain case-sensitive substring matching, which is what
// people write in config files ("/cart", "?sort=", ".pdf").
// =============================================================================

use crate::config::CrawlConfig;
use serde::Serialize;

// What kind of page a URL looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlKind {
    Product,
    Category,
    Page,
}

#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    exclude: Vec<String>,
    product: Vec<String>,
    category: Vec<String>,
}

impl UrlFilter {
    pub fn new(exclude: Vec<String>, product: Vec<String>, category: Vec<String>) -> Self {
        // An empty pattern would match every URL
        let clean = |patterns: Vec<String>| -> Vec<String> {
            patterns.into_iter().filter(|p| !p.is_empty()).collect()
        };
        Self {
            exclude: clean(exclude),
            product: clean(product),
            category: clean(category),
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(
            config.exclude_patterns.clone(),
            config.product_patterns.clone(),
            config.category_patterns.clone(),
        )
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        matches_any(url, &self.exclude)
    }

    // Product patterns win over category patterns when both match
    pub fn classify(&self, url: &str) -> UrlKind {
        if matches_any(url, &self.product) {
            UrlKind::Product
        } else if matches_any(url, &self.category) {
            UrlKind::Category
        } else {
            UrlKind::Page
        }
    }
}

fn matches_any(url: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| url.contains(pattern.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> UrlFilter {
        UrlFilter::new(
            vec!["/cart".to_string(), ".pdf".to_string(), String::new()],
            vec!["/product/".to_string()],
            vec!["/category/".to_string()],
        )
    }

    #[test]
    fn test_exclusion_is_substring_match() {
        let filter = filter();
        assert!(filter.is_excluded("https://example.com/cart/"));
        assert!(filter.is_excluded("https://example.com/files/menu.pdf"));
        assert!(!filter.is_excluded("https://example.com/about/"));
    }

    #[test]
    fn test_exclusion_is_case_sensitive() {
        assert!(!filter().is_excluded("https://example.com/CART/"));
    }

    #[test]
    fn test_empty_pattern_ignored() {
        // the empty string in the exclude list must not exclude everything
        assert!(!filter().is_excluded("https://example.com/"));
    }

    #[test]
    fn test_classify() {
        let filter = filter();
        assert_eq!(
            filter.classify("https://example.com/product/red-shoe/"),
            UrlKind::Product
        );
        assert_eq!(
            filter.classify("https://example.com/category/shoes/"),
            UrlKind::Category
        );
        assert_eq!(filter.classify("https://example.com/blog/"), UrlKind::Page);
    }

    #[test]
    fn test_classification_does_not_filter() {
        let filter = filter();
        assert!(!filter.is_excluded("https://example.com/product/red-shoe/"));
    }
}

// src/error.rs
// =============================================================================
// Error types for the crawl engine.
//
// Almost every failure in a crawl is contained where it happens: a page that
// times out, a redirect that leaves the site, a broken sitemap. Those are
// values (FetchError, SitemapError) that get recorded and logged, never
// propagated past the scheduler.
//
// Only CrawlError ends a crawl, and the only runtime cause is the rendering
// agent failing to start.
// =============================================================================

use std::time::Duration;
use thiserror::Error;

// Seed URL could not be turned into a site base
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

// Per-page failure returned by the page fetcher
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("redirect left the site, landed on {landed}")]
    DomainMismatch { landed: String },
    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),
    #[error("navigation failed: {0}")]
    Navigation(String),
}

impl FetchError {
    // Short machine-readable name used in the report's failure ledger
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl(_) => "invalid_url",
            FetchError::DomainMismatch { .. } => "domain_mismatch",
            FetchError::NavigationTimeout(_) => "navigation_timeout",
            FetchError::Navigation(_) => "navigation_error",
        }
    }
}

// Per-sitemap failure; only the failing branch is dropped
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SitemapError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("malformed sitemap {url}: {reason}")]
    Malformed { url: String, reason: String },
    #[error("failed to decompress {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl SitemapError {
    pub fn kind(&self) -> &'static str {
        match self {
            SitemapError::Fetch { .. } => "sitemap_fetch_error",
            SitemapError::Malformed { .. } => "malformed_sitemap",
            SitemapError::Decode { .. } => "sitemap_decode_error",
        }
    }

    pub fn url(&self) -> &str {
        match self {
            SitemapError::Fetch { url, .. }
            | SitemapError::Malformed { url, .. }
            | SitemapError::Decode { url, .. } => url,
        }
    }
}

// Crawl-level failure: no report is produced
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("rendering agent failed to start: {0}")]
    RenderingAgentFatal(String),
    #[error(transparent)]
    InvalidSeed(#[from] UrlError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_kinds() {
        let err = FetchError::DomainMismatch {
            landed: "https://other.com/".to_string(),
        };
        assert_eq!(err.kind(), "domain_mismatch");
        assert!(err.to_string().contains("other.com"));

        let err = FetchError::NavigationTimeout(Duration::from_secs(30));
        assert_eq!(err.kind(), "navigation_timeout");
    }

    #[test]
    fn test_sitemap_error_url() {
        let err = SitemapError::Malformed {
            url: "https://example.com/sitemap.xml".to_string(),
            reason: "unexpected end".to_string(),
        };
        assert_eq!(err.url(), "https://example.com/sitemap.xml");
        assert_eq!(err.kind(), "malformed_sitemap");
    }
}

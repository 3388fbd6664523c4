// src/crawl/report.rs
// =============================================================================
// The crawl report: what the crawl found, page by page.
//
// Pages are listed in the order they were merged (batch order, completion
// order inside a batch). Each page carries its cleaned text, the
// entity-free topic text, its entities and its keywords.
//
// Failed pages and sitemaps are listed too, so a partial crawl explains
// itself. A report with zero pages is still a valid report.
// =============================================================================

use crate::error::{FetchError, SitemapError};
use crate::links::{CanonicalUrl, UrlKind};
use crate::snippets::HeaderFooterSnippets;
use crate::text::ExtractedEntities;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub seed_url: String,
    /// Canonical site root the crawl was confined to
    pub site: String,
    pub timestamp: DateTime<Utc>,
    pub pages: Vec<PageAnalysis>,
    pub crawled_page_count: usize,
    pub sitemap_stats: SitemapStats,
    pub duration_seconds: f64,
    pub header_footer: HeaderFooterSnippets,
    pub failures: Vec<FailedUnit>,
}

impl CrawlReport {
    pub fn page(&self, url: &str) -> Option<&PageAnalysis> {
        self.pages.iter().find(|page| page.url.as_str() == url)
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageAnalysis {
    pub url: CanonicalUrl,
    pub kind: UrlKind,
    pub cleaned_text: String,
    pub topic_text: String,
    pub raw_text_length: usize,
    pub outbound_link_count: usize,
    pub entities: ExtractedEntities,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SitemapStats {
    /// Page URLs listed by the site's sitemaps, before any filtering
    pub urls_discovered: usize,
    /// Of those, how many ended up as successfully analysed pages
    pub pages_processed: usize,
    pub sitemaps_visited: usize,
}

// A page or sitemap the crawl could not use
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUnit {
    pub url: String,
    pub kind: String,
    pub message: String,
}

impl FailedUnit {
    pub fn page(url: &CanonicalUrl, err: &FetchError) -> Self {
        Self {
            url: url.to_string(),
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    pub fn sitemap(err: &SitemapError) -> Self {
        Self {
            url: err.url().to_string(),
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

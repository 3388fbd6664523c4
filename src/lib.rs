// src/lib.rs
// =============================================================================
// sitescout: crawl a site, read its rendered pages, mine them for keywords
// and contact/price/date entities.
//
// Module map (leaf modules first):
// - error: error types
// - config: crawl configuration
// - links: URL canonicalization, exclusion/classification, link extraction
// - sitemap: robots.txt + sitemap discovery and parsing
// - text: normalization, entity extraction, keyword ranking
// - snippets: the header/footer identifier seam
// - fetch: rendering agent and page fetcher
// - crawl: session, scheduler and report
//
// The CLI in main.rs is a thin layer over `crawl::Crawler`.
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod fetch;
pub mod links;
pub mod sitemap;
pub mod snippets;
pub mod text;

pub use config::CrawlConfig;
pub use crawl::{CrawlReport, Crawler};
pub use error::{CrawlError, FetchError, SitemapError, UrlError};

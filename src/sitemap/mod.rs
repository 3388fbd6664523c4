// src/sitemap/mod.rs
// =============================================================================
// Sitemap discovery and parsing.
//
// Submodules:
// - discover: robots.txt, fallback paths, HEAD probes
// - resolve: walks sitemap trees with a bounded worker pool
// - parse: one XML document -> SitemapNode
// =============================================================================

mod discover;
mod parse;
mod resolve;

pub use discover::{parse_robots_sitemaps, sitemap_candidates, SitemapDiscoverer};
pub use parse::{decode_body, parse_sitemap, SitemapNode};
pub use resolve::{fetch_sitemap, resolve_sitemaps, SitemapParseResult};

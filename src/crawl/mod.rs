// src/crawl/mod.rs
// =============================================================================
// Crawl scheduling and the crawl report.
//
// Submodules:
// - session: per-crawl state (visited, discovered, frontier, pages, limits)
// - scheduler: the batch loop that drives fetches and builds the report
// - report: what a finished crawl hands back
// =============================================================================

mod report;
mod scheduler;
mod session;

pub use report::{CrawlReport, FailedUnit, PageAnalysis, SitemapStats};
pub use scheduler::Crawler;
pub use session::CrawlSession;

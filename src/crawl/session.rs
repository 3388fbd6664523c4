// src/crawl/session.rs
// =============================================================================
// The state of one crawl.
//
// A CrawlSession is created when a crawl starts, is only ever touched by the
// scheduling loop between awaits, and is consumed into the report at the
// end. No locks: fetches in flight never see it.
//
// Two limits, counted independently:
// - max_links: how many distinct URLs may ever be discovered (enqueued).
//   Once reached, new links are ignored but the frontier keeps draining.
// - max_pages: how many pages may end up in the report. Only successful
//   fetches count, so a dead link does not use up the budget.
//
// Every URL that gets fetched went through `discover` first, so the crawl
// can never fetch more than max_links URLs and always terminates.
// =============================================================================

use super::report::FailedUnit;
use crate::error::FetchError;
use crate::fetch::{FetchResult, PageRecord};
use crate::links::CanonicalUrl;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct CrawlSession {
    max_pages: usize,
    max_links: usize,
    // dispatched, plus every URL a page landed on
    visited: HashSet<CanonicalUrl>,
    discovered: HashSet<CanonicalUrl>,
    frontier: VecDeque<CanonicalUrl>,
    from_sitemaps: HashSet<CanonicalUrl>,
    pages: Vec<PageRecord>,
    page_urls: HashSet<CanonicalUrl>,
    failures: Vec<FailedUnit>,
    link_cap_logged: bool,
}

impl CrawlSession {
    pub fn new(max_pages: usize, max_links: usize) -> Self {
        Self {
            max_pages,
            max_links,
            visited: HashSet::new(),
            discovered: HashSet::new(),
            frontier: VecDeque::new(),
            from_sitemaps: HashSet::new(),
            pages: Vec::new(),
            page_urls: HashSet::new(),
            failures: Vec::new(),
            link_cap_logged: false,
        }
    }

    // Puts the seed first, then the sitemap pages in sitemap order
    pub fn seed_frontier(
        &mut self,
        seed: CanonicalUrl,
        sitemap_pages: impl IntoIterator<Item = CanonicalUrl>,
    ) {
        self.discover(seed);
        for url in sitemap_pages {
            if self.discover(url.clone()) {
                self.from_sitemaps.insert(url);
            }
        }
    }

    // Adds a URL to the frontier unless it is known or the link cap is hit
    pub fn discover(&mut self, url: CanonicalUrl) -> bool {
        if self.discovered.contains(&url) || self.visited.contains(&url) {
            return false;
        }
        if self.discovered.len() >= self.max_links {
            if !self.link_cap_logged {
                debug!(max_links = self.max_links, "link limit reached, no new URLs enqueued");
                self.link_cap_logged = true;
            }
            return false;
        }
        self.discovered.insert(url.clone());
        self.frontier.push_back(url);
        true
    }

    // True once the page budget is spent or there is nothing left to fetch
    pub fn is_done(&self) -> bool {
        self.remaining_pages() == 0 || self.frontier.is_empty()
    }

    pub fn remaining_pages(&self) -> usize {
        self.max_pages.saturating_sub(self.pages.len())
    }

    // Takes the next URLs to fetch and marks them visited
    //
    // Never hands out more URLs than there are pages left in the budget, so
    // a batch of successes cannot overshoot max_pages.
    pub fn next_batch(&mut self, batch_size: usize) -> Vec<CanonicalUrl> {
        let size = batch_size.min(self.remaining_pages());
        let mut batch = Vec::with_capacity(size);
        while batch.len() < size {
            let Some(url) = self.frontier.pop_front() else {
                break;
            };
            if self.visited.insert(url.clone()) {
                batch.push(url);
            }
        }
        batch
    }

    // Folds one fetch outcome back into the session
    pub fn merge(&mut self, requested: &CanonicalUrl, result: FetchResult) {
        match result {
            Ok(record) => self.merge_page(record),
            Err(err) => self.record_failure(requested, err),
        }
    }

    pub fn merge_batch(&mut self, results: Vec<(CanonicalUrl, FetchResult)>) {
        for (requested, result) in results {
            self.merge(&requested, result);
        }
    }

    fn merge_page(&mut self, record: PageRecord) {
        self.visited.insert(record.url.clone());

        // a redirect can land on a page we already have
        if !self.page_urls.insert(record.url.clone()) {
            debug!(requested = %record.requested, landed = %record.url, "duplicate page after redirect, skipped");
            return;
        }
        if self.pages.len() >= self.max_pages {
            debug!(url = %record.url, "page limit reached, page dropped");
            return;
        }

        for link in &record.outbound_links {
            self.discover(link.clone());
        }
        self.pages.push(record);
    }

    fn record_failure(&mut self, requested: &CanonicalUrl, err: FetchError) {
        warn!(url = %requested, kind = err.kind(), error = %err, "page failed");
        self.failures.push(FailedUnit::page(requested, &err));
    }

    pub fn add_failures(&mut self, failures: impl IntoIterator<Item = FailedUnit>) {
        self.failures.extend(failures);
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered.len()
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    // Successful pages that were first found in a sitemap
    pub fn sitemap_pages_processed(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| self.from_sitemaps.contains(&page.requested))
            .count()
    }

    pub fn into_parts(self) -> (Vec<PageRecord>, Vec<FailedUnit>) {
        (self.pages, self.failures)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why no Mutex around the session?
//    - Fetches run concurrently, but they never touch the session
//    - The scheduler merges their results one by one after the batch is done
//    - &mut self on merge() lets the compiler check that nobody else holds it
//
// 2. Why both `visited` and `discovered`?
//    - discovered = ever put in the frontier (this is what max_links counts)
//    - visited = already dispatched, or landed on through a redirect
//    - A URL can be discovered but not yet visited while it waits its turn
//
// 3. What is saturating_sub?
//    - Subtraction that stops at 0 instead of underflowing
//    - usize can't go negative, so 3 - 5 would panic in debug builds
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::{SiteBase, UrlKind};

    fn base() -> SiteBase {
        SiteBase::from_seed("https://example.com").unwrap()
    }

    fn url(path: &str) -> CanonicalUrl {
        base().canonicalize(path).unwrap()
    }

    fn record(path: &str, links: &[&str]) -> PageRecord {
        PageRecord {
            requested: url(path),
            url: url(path),
            kind: UrlKind::Page,
            raw_text: "text".to_string(),
            cleaned_text: "text".to_string(),
            raw_text_length: 4,
            outbound_links: links.iter().map(|l| url(l)).collect(),
        }
    }

    #[test]
    fn test_seed_first_then_sitemap_order() {
        let mut session = CrawlSession::new(10, 10);
        session.seed_frontier(url("/"), vec![url("/b"), url("/a"), url("/")]);
        assert_eq!(session.next_batch(10), vec![url("/"), url("/b"), url("/a")]);
    }

    #[test]
    fn test_link_cap_bounds_discovery() {
        let mut session = CrawlSession::new(100, 3);
        session.seed_frontier(url("/"), vec![]);
        let batch = session.next_batch(1);
        session.merge(&batch[0], Ok(record("/", &["/a", "/b", "/c", "/d"])));

        assert_eq!(session.discovered_count(), 3);
        assert_eq!(session.frontier_len(), 2);
    }

    #[test]
    fn test_batch_never_exceeds_page_budget() {
        let mut session = CrawlSession::new(2, 100);
        session.seed_frontier(url("/"), vec![url("/a"), url("/b"), url("/c")]);
        assert_eq!(session.next_batch(8).len(), 2);
    }

    #[test]
    fn test_failures_do_not_use_page_budget() {
        let mut session = CrawlSession::new(1, 100);
        session.seed_frontier(url("/"), vec![url("/a")]);

        let batch = session.next_batch(8);
        assert_eq!(batch, vec![url("/")]);
        session.merge(
            &batch[0],
            Err(FetchError::NavigationTimeout(std::time::Duration::from_secs(1))),
        );
        assert!(!session.is_done());

        let batch = session.next_batch(8);
        session.merge(&batch[0], Ok(record("/a", &[])));
        assert!(session.is_done());

        let (pages, failures) = session.into_parts();
        assert_eq!(pages.len(), 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, "navigation_timeout");
    }

    #[test]
    fn test_redirect_onto_known_page_is_not_duplicated() {
        let mut session = CrawlSession::new(10, 10);
        session.seed_frontier(url("/"), vec![url("/old")]);
        let batch = session.next_batch(8);

        let mut redirected = record("/", &[]);
        redirected.requested = url("/old");
        session.merge_batch(vec![
            (batch[0].clone(), Ok(record("/", &[]))),
            (batch[1].clone(), Ok(redirected)),
        ]);

        assert_eq!(session.pages().len(), 1);
    }

    #[test]
    fn test_visited_urls_are_not_rediscovered() {
        let mut session = CrawlSession::new(10, 10);
        session.seed_frontier(url("/"), vec![]);
        let batch = session.next_batch(1);
        session.merge(&batch[0], Ok(record("/", &["/", "/a", "/a"])));
        assert_eq!(session.next_batch(8), vec![url("/a")]);
        assert!(session.is_done());
    }
}

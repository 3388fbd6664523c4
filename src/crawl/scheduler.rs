// src/crawl/scheduler.rs
// =============================================================================
// The crawl loop.
//
// How a crawl runs:
// 1. Turn the seed into a site base ("example.com" -> "https://example.com/")
// 2. Ask the sitemaps for page URLs (optional, never fatal)
// 3. Fetch the seed page on its own, hand its text to the header/footer
//    identifier, then clean the seed again with the snippets it returned
// 4. Work through the frontier in batches: up to `batch_size` fetches run
//    at once, the whole batch is merged, then a random pause, then the next
// 5. Stop when the page budget is spent or the frontier is empty
// 6. Run entity and keyword extraction over every page and build the report
//
// The session is only touched between batches, so dedup decisions do not
// depend on how fetches inside a batch interleave. Reaching a limit never
// cancels the batch in flight; it only stops the next one from starting.
// =============================================================================

use super::report::{CrawlReport, FailedUnit, PageAnalysis, SitemapStats};
use super::session::CrawlSession;
use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::fetch::{FetchResult, PageFetcher, RenderingAgent};
use crate::links::{CanonicalUrl, SiteBase, UrlFilter};
use crate::sitemap::SitemapDiscoverer;
use crate::snippets::{HeaderFooterIdentifier, HeaderFooterSnippets};
use crate::text::{Extractor, TextNormalizer};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct Crawler {
    config: CrawlConfig,
    agent: Arc<dyn RenderingAgent>,
    identifier: Arc<dyn HeaderFooterIdentifier>,
    extractor: Extractor,
}

// Pages the sitemaps contributed, already canonicalized and filtered
struct SitemapSeeds {
    pages: Vec<CanonicalUrl>,
    stats: SitemapStats,
    failures: Vec<FailedUnit>,
}

impl Crawler {
    pub fn new(
        config: CrawlConfig,
        agent: Arc<dyn RenderingAgent>,
        identifier: Arc<dyn HeaderFooterIdentifier>,
    ) -> Result<Self, CrawlError> {
        config.validate()?;
        let extractor = Extractor::from_config(&config);
        Ok(Self {
            config,
            agent,
            identifier,
            extractor,
        })
    }

    // Crawls a site and builds its report
    //
    // Only an unusable seed or an HTTP client that cannot be built end up
    // as Err here; page and sitemap failures are listed in the report.
    pub async fn run(&self, seed: &str) -> Result<CrawlReport, CrawlError> {
        let started = Instant::now();
        let timestamp = Utc::now();
        let base = SiteBase::from_seed(seed)?;
        let filter = UrlFilter::from_config(&self.config);

        info!(
            site = base.as_str(),
            max_pages = self.config.max_pages_to_analyze,
            max_links = self.config.max_links_to_discover,
            "starting crawl"
        );

        let sitemaps = self.sitemap_seeds(&base, &filter).await?;

        let mut session = CrawlSession::new(
            self.config.max_pages_to_analyze,
            self.config.max_links_to_discover,
        );
        session.seed_frontier(base.root(), sitemaps.pages);
        session.add_failures(sitemaps.failures);

        let mut fetcher = PageFetcher::new(
            Arc::clone(&self.agent),
            base.clone(),
            filter,
            TextNormalizer::from_config(&self.config),
        );

        let header_footer = self.crawl_seed(&mut session, &mut fetcher).await;

        let mut batch_number = 1;
        while !session.is_done() {
            self.politeness_delay().await;

            let batch = session.next_batch(self.config.batch_size);
            if batch.is_empty() {
                break;
            }
            batch_number += 1;
            debug!(batch = batch_number, size = batch.len(), "dispatching batch");

            let results = fetch_batch(&fetcher, batch).await;
            session.merge_batch(results);

            info!(
                batch = batch_number,
                pages = session.pages().len(),
                discovered = session.discovered_count(),
                frontier = session.frontier_len(),
                "batch merged"
            );
        }

        let sitemap_stats = SitemapStats {
            pages_processed: session.sitemap_pages_processed(),
            ..sitemaps.stats
        };
        let (records, failures) = session.into_parts();

        let pages: Vec<PageAnalysis> = records
            .into_iter()
            .map(|record| {
                let extraction = self.extractor.extract(&record.cleaned_text);
                PageAnalysis {
                    url: record.url,
                    kind: record.kind,
                    cleaned_text: record.cleaned_text,
                    topic_text: extraction.topic_text,
                    raw_text_length: record.raw_text_length,
                    outbound_link_count: record.outbound_links.len(),
                    entities: extraction.entities,
                    keywords: extraction.keywords,
                }
            })
            .collect();

        let duration_seconds = started.elapsed().as_secs_f64();
        info!(
            site = base.as_str(),
            pages = pages.len(),
            failures = failures.len(),
            seconds = duration_seconds,
            "crawl finished"
        );

        Ok(CrawlReport {
            seed_url: seed.to_string(),
            site: base.as_str().to_string(),
            timestamp,
            crawled_page_count: pages.len(),
            pages,
            sitemap_stats,
            duration_seconds,
            header_footer,
            failures,
        })
    }

    async fn sitemap_seeds(
        &self,
        base: &SiteBase,
        filter: &UrlFilter,
    ) -> Result<SitemapSeeds, CrawlError> {
        if !self.config.use_sitemaps {
            return Ok(SitemapSeeds {
                pages: Vec::new(),
                stats: SitemapStats::default(),
                failures: Vec::new(),
            });
        }

        let discoverer = SitemapDiscoverer::new(&self.config)?;
        let result = discoverer.discover(base).await;

        // sitemaps may list other hosts or excluded paths; those are dropped
        let pages: Vec<CanonicalUrl> = result
            .page_urls
            .iter()
            .filter_map(|raw| base.canonicalize(raw))
            .filter(|url| !filter.is_excluded(url.as_str()))
            .collect();

        debug!(
            listed = result.page_urls.len(),
            usable = pages.len(),
            "sitemap pages canonicalized"
        );

        Ok(SitemapSeeds {
            pages,
            stats: SitemapStats {
                urls_discovered: result.page_urls.len(),
                pages_processed: 0,
                sitemaps_visited: result.visited_sitemaps.len(),
            },
            failures: result.failures.iter().map(FailedUnit::sitemap).collect(),
        })
    }

    // Fetches the seed alone and learns the site's header/footer from it
    //
    // The seed is cleaned twice: first without snippets (that text is what
    // the identifier sees), then again from its raw text once the snippets
    // are known, so it ends up cleaned exactly like every later page.
    async fn crawl_seed(
        &self,
        session: &mut CrawlSession,
        fetcher: &mut PageFetcher,
    ) -> HeaderFooterSnippets {
        let Some(seed) = session.next_batch(1).into_iter().next() else {
            return HeaderFooterSnippets::default();
        };

        match fetcher.fetch(&seed).await {
            Ok(mut record) => {
                let snippets = self.identifier.identify(&record.cleaned_text).await;
                if !snippets.is_empty() {
                    info!(
                        header = snippets.header.len(),
                        footer = snippets.footer.len(),
                        "header/footer snippets identified"
                    );
                    fetcher.set_snippets(snippets.combined());
                    record.cleaned_text = fetcher.clean(&record.raw_text);
                }
                session.merge(&seed, Ok(record));
                snippets
            }
            Err(err) => {
                warn!(url = %seed, error = %err, "seed page failed, crawling without header/footer snippets");
                session.merge(&seed, Err(err));
                HeaderFooterSnippets::default()
            }
        }
    }

    async fn politeness_delay(&self) {
        let min = self.config.crawl_delay_min_ms;
        let max = self.config.crawl_delay_max_ms.max(min);
        if max == 0 {
            return;
        }
        let millis = rand::thread_rng().gen_range(min..=max);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

// Runs one batch concurrently; results come back in completion order
async fn fetch_batch(
    fetcher: &PageFetcher,
    batch: Vec<CanonicalUrl>,
) -> Vec<(CanonicalUrl, FetchResult)> {
    let concurrency = batch.len().max(1);
    stream::iter(batch)
        .map(|url| async move {
            let result = fetcher.fetch(&url).await;
            (url, result)
        })
        .buffer_unordered(concurrency)
        .collect()
        .await
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Arc<dyn RenderingAgent>?
//    - dyn Trait = "any type implementing the trait", chosen at runtime
//    - The CLI passes a real browser, tests pass an in-memory fake
//    - Arc lets the crawler and the fetcher share the same agent
//
// 2. buffer_unordered vs join_all:
//    - Both run a batch of futures concurrently
//    - buffer_unordered yields results as they finish, which is the merge
//      order we want inside a batch
//
// 3. Why is the seed fetched on its own?
//    - Header/footer snippets come from the seed's text
//    - Every later page needs those snippets, so they must exist before the
//      first real batch starts
// -----------------------------------------------------------------------------

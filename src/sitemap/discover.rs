// src/sitemap/discover.rs
// =============================================================================
// Finds a site's sitemaps and turns them into page URLs.
//
// Strategy:
// 1. Read robots.txt (best effort) and collect its `Sitemap:` lines
// 2. Add the usual suspects: /sitemap.xml, /sitemap_index.xml and their
//    .gz variants
// 3. HEAD every candidate concurrently and keep the ones answering 200
// 4. Hand the survivors to the resolver, which walks the sitemap trees
//
// Nothing in here can fail the crawl. A missing robots.txt, a dead candidate
// or a broken sitemap only means fewer seed URLs.
// =============================================================================

use super::resolve::{resolve_sitemaps, SitemapParseResult};
use crate::config::CrawlConfig;
use crate::error::SitemapError;
use crate::links::SiteBase;
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

// Paths tried on every site, after whatever robots.txt declares
const FALLBACK_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap.xml.gz",
    "/sitemap_index.xml.gz",
];

// How many HEAD probes run at once (the candidate list is short)
const PROBE_CONCURRENCY: usize = 8;

pub struct SitemapDiscoverer {
    client: Client,
    workers: usize,
    robots_timeout: Duration,
    probe_timeout: Duration,
    sitemap_timeout: Duration,
}

impl SitemapDiscoverer {
    // Builds a discoverer with its own HTTP client
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &CrawlConfig) -> Self {
        Self {
            client,
            workers: config.sitemap_workers,
            robots_timeout: config.robots_timeout(),
            probe_timeout: config.probe_timeout(),
            sitemap_timeout: config.sitemap_timeout(),
        }
    }

    // Runs the whole discovery pipeline for a site
    pub async fn discover(&self, base: &SiteBase) -> SitemapParseResult {
        let (declared, robots_failure) = match self.robots_sitemaps(base).await {
            Ok(declared) => (declared, None),
            Err(err) => {
                warn!(error = %err, "robots.txt unavailable, using fallback sitemap paths");
                (Vec::new(), Some(err))
            }
        };

        let candidates = sitemap_candidates(base, &declared);
        let live = self.probe(candidates).await;
        info!(site = base.as_str(), sitemaps = live.len(), "sitemap candidates answering 200");

        let mut result =
            resolve_sitemaps(&self.client, live, self.workers, self.sitemap_timeout).await;
        if let Some(err) = robots_failure {
            result.failures.insert(0, err);
        }

        info!(
            site = base.as_str(),
            pages = result.page_urls.len(),
            sitemaps = result.visited_sitemaps.len(),
            failures = result.failures.len(),
            "sitemap discovery finished"
        );
        result
    }

    // Fetches robots.txt and returns the sitemap URLs it declares
    pub async fn robots_sitemaps(&self, base: &SiteBase) -> Result<Vec<String>, SitemapError> {
        let robots_url = format!("{}robots.txt", base.as_str());
        let fetch_error = |reason: String| SitemapError::Fetch {
            url: robots_url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&robots_url)
            .timeout(self.robots_timeout)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_error(format!("HTTP {}", response.status().as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        Ok(parse_robots_sitemaps(base, &body))
    }

    // HEADs every candidate concurrently, keeping those that answer 200
    //
    // .buffered() (not buffer_unordered) keeps robots.txt entries ahead of
    // the fallback paths in the output.
    pub async fn probe(&self, candidates: Vec<String>) -> Vec<String> {
        let probes = candidates.into_iter().map(|url| {
            let client = self.client.clone();
            let timeout = self.probe_timeout;
            async move {
                match client.head(&url).timeout(timeout).send().await {
                    Ok(response) if response.status() == StatusCode::OK => Some(url),
                    Ok(response) => {
                        debug!(sitemap = %url, status = response.status().as_u16(), "sitemap candidate rejected");
                        None
                    }
                    Err(e) => {
                        debug!(sitemap = %url, error = %e, "sitemap candidate unreachable");
                        None
                    }
                }
            }
        });

        stream::iter(probes)
            .buffered(PROBE_CONCURRENCY)
            .filter_map(|live| async move { live })
            .collect()
            .await
    }
}

// Extracts `Sitemap:` lines from robots.txt
//
// The directive name is case-insensitive and relative values are resolved
// against the site root.
pub fn parse_robots_sitemaps(base: &SiteBase, robots_txt: &str) -> Vec<String> {
    let root = base.root();
    robots_txt
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let directive = line.get(..8)?;
            if !directive.eq_ignore_ascii_case("sitemap:") {
                return None;
            }
            let value = line.get(8..)?.trim();
            if value.is_empty() {
                return None;
            }
            root.as_url().join(value).ok().map(|url| url.to_string())
        })
        .collect()
}

// robots.txt entries first, then the fallback paths, without duplicates
pub fn sitemap_candidates(base: &SiteBase, declared: &[String]) -> Vec<String> {
    let root = base.root();
    let fallbacks = FALLBACK_PATHS
        .iter()
        .filter_map(|path| root.as_url().join(path).ok().map(|url| url.to_string()));

    let mut seen = HashSet::new();
    declared
        .iter()
        .cloned()
        .chain(fallbacks)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_robots_sitemaps() {
        let base = SiteBase::from_seed("https://example.com").unwrap();
        let robots = "User-agent: *\nDisallow: /admin\nSitemap: https://example.com/a.xml\nsitemap:/b.xml\nSITEMAP:   \n";
        assert_eq!(
            parse_robots_sitemaps(&base, robots),
            vec![
                "https://example.com/a.xml".to_string(),
                "https://example.com/b.xml".to_string(),
            ]
        );
    }

    #[test]
    fn test_robots_with_multibyte_lines() {
        let base = SiteBase::from_seed("https://example.com").unwrap();
        // must not panic slicing a non-ASCII line
        assert!(parse_robots_sitemaps(&base, "# çğışöü açıklama\n").is_empty());
    }

    #[test]
    fn test_candidates_dedup_and_order() {
        let base = SiteBase::from_seed("https://example.com").unwrap();
        let declared = vec![
            "https://example.com/custom.xml".to_string(),
            "https://example.com/sitemap.xml".to_string(),
        ];
        let candidates = sitemap_candidates(&base, &declared);
        assert_eq!(
            candidates,
            vec![
                "https://example.com/custom.xml",
                "https://example.com/sitemap.xml",
                "https://example.com/sitemap_index.xml",
                "https://example.com/sitemap.xml.gz",
                "https://example.com/sitemap_index.xml.gz",
            ]
        );
    }

    #[tokio::test]
    async fn test_discover_end_to_end() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("User-agent: *\nSitemap: {}/custom.xml\n", uri)),
            )
            .mount(&server)
            .await;
        // answers both HEAD and GET
        Mock::given(path("/custom.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<urlset><url><loc>{0}/one</loc></url><url><loc>{0}/two</loc></url></urlset>",
                uri
            )))
            .mount(&server)
            .await;

        let base = SiteBase::from_seed(&uri).unwrap();
        let discoverer = SitemapDiscoverer::new(&CrawlConfig::default()).unwrap();
        let result = discoverer.discover(&base).await;

        assert_eq!(
            result.page_urls,
            vec![format!("{}/one", uri), format!("{}/two", uri)]
        );
        assert_eq!(result.visited_sitemaps.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_robots_falls_back() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<urlset><url><loc>{}/only</loc></url></urlset>",
                uri
            )))
            .mount(&server)
            .await;

        let base = SiteBase::from_seed(&uri).unwrap();
        let discoverer = SitemapDiscoverer::new(&CrawlConfig::default()).unwrap();
        let result = discoverer.discover(&base).await;

        assert_eq!(result.page_urls, vec![format!("{}/only", uri)]);
        // the robots.txt 404 is recorded, not fatal
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].kind(), "sitemap_fetch_error");
    }

    #[tokio::test]
    async fn test_probe_keeps_only_200() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("HEAD"))
            .and(path("/ok.xml"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/gone.xml"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let discoverer = SitemapDiscoverer::new(&CrawlConfig::default()).unwrap();
        let live = discoverer
            .probe(vec![
                format!("{}/ok.xml", uri),
                format!("{}/gone.xml", uri),
                format!("{}/unknown.xml", uri),
            ])
            .await;

        assert_eq!(live, vec![format!("{}/ok.xml", uri)]);
    }
}

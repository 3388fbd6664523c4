// src/sitemap/resolve.rs
// =============================================================================
// Resolves sitemap trees into a flat list of page URLs.
//
// A sitemap index can point at more indexes, which can point at urlsets, and
// real sites happily create cycles (index A lists B, B lists A). Instead of
// recursing, we keep an explicit worklist:
//
//   1. the root sitemaps go into the queue and the visited set
//   2. up to `workers` fetch+parse operations run at once
//   3. each finished document adds its unseen child sitemaps to the queue and
//      its pages to the result
//   4. stop when the queue is empty and nothing is in flight
//
// A URL enters the queue at most once, so cycles end by themselves and the
// concurrency bound holds however wide or deep the tree is. A failing branch
// (HTTP error, bad gzip, broken XML) is logged and recorded; its siblings are
// unaffected.
// =============================================================================

use super::parse::{decode_body, parse_sitemap, SitemapNode};
use crate::error::SitemapError;
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing::{debug, warn};

// Everything learned from resolving a set of sitemap trees
#[derive(Debug, Default)]
pub struct SitemapParseResult {
    /// Page URLs in first-seen order, without duplicates (not canonicalized)
    pub page_urls: Vec<String>,
    /// Every sitemap URL that was queued, including failed ones
    pub visited_sitemaps: HashSet<String>,
    /// Branches that could not be fetched or parsed
    pub failures: Vec<SitemapError>,
}

// Fetches and parses every sitemap reachable from `roots`
//
// Parameters:
//   client: shared HTTP client
//   roots: sitemap URLs to start from
//   workers: maximum fetch/parse operations in flight
//   timeout: per-sitemap request timeout
pub async fn resolve_sitemaps(
    client: &Client,
    roots: Vec<String>,
    workers: usize,
    timeout: Duration,
) -> SitemapParseResult {
    let workers = workers.max(1);
    let mut result = SitemapParseResult::default();
    let mut seen_pages: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();

    for root in roots {
        if result.visited_sitemaps.insert(root.clone()) {
            queue.push_back(root);
        }
    }

    let mut in_flight = FuturesUnordered::new();

    loop {
        while in_flight.len() < workers {
            let Some(url) = queue.pop_front() else {
                break;
            };
            in_flight.push(fetch_and_parse(client, url, timeout));
        }

        let Some((url, outcome)) = in_flight.next().await else {
            break;
        };

        match outcome {
            Ok(node) => {
                debug!(
                    sitemap = %url,
                    children = node.child_sitemaps().len(),
                    pages = node.page_urls().len(),
                    "parsed sitemap"
                );
                for child in node.child_sitemaps() {
                    if result.visited_sitemaps.insert(child.clone()) {
                        queue.push_back(child.clone());
                    }
                }
                for page in node.page_urls() {
                    if seen_pages.insert(page.clone()) {
                        result.page_urls.push(page.clone());
                    }
                }
            }
            Err(err) => {
                warn!(sitemap = %url, error = %err, "skipping sitemap branch");
                result.failures.push(err);
            }
        }
    }

    result
}

async fn fetch_and_parse(
    client: &Client,
    url: String,
    timeout: Duration,
) -> (String, Result<SitemapNode, SitemapError>) {
    let outcome = match fetch_sitemap(client, &url, timeout).await {
        Ok(body) => parse_sitemap(&url, &body),
        Err(err) => Err(err),
    };
    (url, outcome)
}

// Downloads one sitemap and returns its (decompressed) text
pub async fn fetch_sitemap(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<String, SitemapError> {
    let fetch_error = |reason: String| SitemapError::Fetch {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("HTTP {}", status.as_u16())));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    decode_body(url, &body)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is FuturesUnordered?
//    - A set of futures you can keep adding to while it runs
//    - .next().await returns whichever future finishes first
//    - Perfect for a worker pool where finished work creates new work
//
// 2. Why `let Some(x) = ... else { break; }`?
//    - let-else binds the value or runs the else block, which must leave
//      the current scope (break, continue, return)
//    - It keeps the happy path unindented
//
// 3. Why insert into visited_sitemaps when queuing, not when fetching?
//    - Two indexes can list the same child before either is fetched
//    - Marking at queue time means it is only ever queued once
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn urlset(urls: &[String]) -> String {
        let entries: String = urls
            .iter()
            .map(|u| format!("<url><loc>{}</loc></url>", u))
            .collect();
        format!("<urlset>{}</urlset>", entries)
    }

    fn index(children: &[String]) -> String {
        let entries: String = children
            .iter()
            .map(|u| format!("<sitemap><loc>{}</loc></sitemap>", u))
            .collect();
        format!("<sitemapindex>{}</sitemapindex>", entries)
    }

    async fn mount_xml(server: &MockServer, at: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_index_with_two_children_yields_union() {
        let server = MockServer::start().await;
        let uri = server.uri();

        let first: Vec<String> = (1..=3).map(|i| format!("{}/a/{}", uri, i)).collect();
        let second: Vec<String> = (1..=3).map(|i| format!("{}/b/{}", uri, i)).collect();

        mount_xml(
            &server,
            "/sitemap_index.xml",
            index(&[format!("{}/a.xml", uri), format!("{}/b.xml", uri)]),
        )
        .await;
        mount_xml(&server, "/a.xml", urlset(&first)).await;
        mount_xml(&server, "/b.xml", urlset(&second)).await;

        let client = Client::new();
        let result = resolve_sitemaps(
            &client,
            vec![format!("{}/sitemap_index.xml", uri)],
            10,
            Duration::from_secs(5),
        )
        .await;

        let mut pages = result.page_urls.clone();
        pages.sort();
        let mut expected: Vec<String> = first.into_iter().chain(second).collect();
        expected.sort();

        assert_eq!(pages, expected);
        assert_eq!(result.visited_sitemaps.len(), 3);
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn test_cycle_terminates() {
        let server = MockServer::start().await;
        let uri = server.uri();

        mount_xml(&server, "/a.xml", index(&[format!("{}/b.xml", uri)])).await;
        mount_xml(
            &server,
            "/b.xml",
            index(&[format!("{}/a.xml", uri), format!("{}/b.xml", uri)]),
        )
        .await;

        let client = Client::new();
        let result = resolve_sitemaps(
            &client,
            vec![format!("{}/a.xml", uri)],
            2,
            Duration::from_secs(5),
        )
        .await;

        assert!(result.page_urls.is_empty());
        assert_eq!(result.visited_sitemaps.len(), 2);
    }

    #[tokio::test]
    async fn test_broken_branch_does_not_affect_siblings() {
        let server = MockServer::start().await;
        let uri = server.uri();

        mount_xml(
            &server,
            "/index.xml",
            index(&[
                format!("{}/good.xml", uri),
                format!("{}/broken.xml", uri),
                format!("{}/missing.xml", uri),
            ]),
        )
        .await;
        mount_xml(&server, "/good.xml", urlset(&[format!("{}/page", uri)])).await;
        mount_xml(&server, "/broken.xml", "<urlset><url><loc>x".to_string()).await;

        let client = Client::new();
        let result = resolve_sitemaps(
            &client,
            vec![format!("{}/index.xml", uri)],
            1,
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(result.page_urls, vec![format!("{}/page", uri)]);
        assert_eq!(result.failures.len(), 2);
        let mut kinds: Vec<&str> = result.failures.iter().map(|f| f.kind()).collect();
        kinds.sort();
        assert_eq!(kinds, vec!["malformed_sitemap", "sitemap_fetch_error"]);
    }

    #[tokio::test]
    async fn test_duplicate_pages_across_sitemaps_collapse() {
        let server = MockServer::start().await;
        let uri = server.uri();
        let shared = format!("{}/shared", uri);

        mount_xml(&server, "/one.xml", urlset(&[shared.clone()])).await;
        mount_xml(&server, "/two.xml", urlset(&[shared.clone()])).await;

        let client = Client::new();
        let result = resolve_sitemaps(
            &client,
            vec![format!("{}/one.xml", uri), format!("{}/two.xml", uri)],
            4,
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(result.page_urls, vec![shared]);
    }
}

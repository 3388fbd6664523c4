// src/fetch/page.rs
// =============================================================================
// Fetches one page and turns it into a PageRecord.
//
// For every URL:
// 1. Ask the rendering agent to load it (bounded by the page timeout)
// 2. Canonicalize where the browser actually landed; a redirect off the
//    site turns the whole fetch into a DomainMismatch
// 3. Pull same-site links out of the rendered HTML
// 4. Normalize the visible text, stripping header/footer snippets when the
//    fetcher has them
//
// Failures come back as FetchError values. Nothing here panics or aborts the
// crawl, so one bad page never takes its batch down with it.
// =============================================================================

use super::agent::RenderingAgent;
use crate::error::FetchError;
use crate::links::{extract_site_links, CanonicalUrl, SiteBase, UrlFilter, UrlKind};
use crate::text::TextNormalizer;
use std::sync::Arc;
use tracing::debug;
use url::Url;

// A successfully fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// The URL that was asked for
    pub requested: CanonicalUrl,
    /// The canonical URL the page landed on (same as `requested` unless the
    /// site redirected internally)
    pub url: CanonicalUrl,
    pub kind: UrlKind,
    /// Visible text exactly as rendered, kept so the page can be cleaned
    /// again once header/footer snippets are known
    pub raw_text: String,
    pub cleaned_text: String,
    pub raw_text_length: usize,
    pub outbound_links: Vec<CanonicalUrl>,
}

pub type FetchResult = Result<PageRecord, FetchError>;

pub struct PageFetcher {
    agent: Arc<dyn RenderingAgent>,
    base: SiteBase,
    filter: UrlFilter,
    normalizer: TextNormalizer,
    snippets: Vec<String>,
}

impl PageFetcher {
    pub fn new(
        agent: Arc<dyn RenderingAgent>,
        base: SiteBase,
        filter: UrlFilter,
        normalizer: TextNormalizer,
    ) -> Self {
        Self {
            agent,
            base,
            filter,
            normalizer,
            snippets: Vec::new(),
        }
    }

    // Header/footer snippets stripped from every page fetched from now on
    pub fn set_snippets(&mut self, snippets: Vec<String>) {
        self.snippets = snippets;
    }

    // Runs the full normalization (with the current snippets) on raw text
    pub fn clean(&self, raw_text: &str) -> String {
        self.normalizer.normalize_with_snippets(raw_text, &self.snippets)
    }

    pub async fn fetch(&self, url: &CanonicalUrl) -> FetchResult {
        let rendered = self.agent.render(url.as_str()).await?;

        let landed = self.landed_url(&rendered.landed_url)?;
        if landed != *url {
            debug!(requested = %url, landed = %landed, "followed same-site redirect");
        }

        let outbound_links =
            extract_site_links(&rendered.html, landed.as_str(), &self.base, &self.filter);
        let cleaned_text = self.clean(&rendered.text);

        Ok(PageRecord {
            requested: url.clone(),
            kind: self.filter.classify(landed.as_str()),
            url: landed,
            raw_text_length: rendered.text.chars().count(),
            raw_text: rendered.text,
            cleaned_text,
            outbound_links,
        })
    }

    fn landed_url(&self, landed: &str) -> Result<CanonicalUrl, FetchError> {
        if let Some(canonical) = self.base.canonicalize(landed) {
            return Ok(canonical);
        }
        // An http(s) URL that fails canonicalization is on another host;
        // anything else (chrome-error://, about:blank) is a failed load
        match Url::parse(landed) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                Err(FetchError::DomainMismatch {
                    landed: landed.to_string(),
                })
            }
            _ => Err(FetchError::Navigation(format!(
                "page did not load, browser shows {}",
                landed
            ))),
        }
    }
}

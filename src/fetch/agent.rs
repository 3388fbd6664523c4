// src/fetch/agent.rs
// =============================================================================
// The rendering agent: something that loads a URL like a browser would and
// hands back what ended up on screen.
//
// The crawler only talks to the `RenderingAgent` trait, so tests can swap the
// real browser for an in-memory fake. `ChromeAgent` is the real thing: one
// headless Chrome shared by the whole crawl, one fresh tab per fetch.
//
// Images, fonts, stylesheets, media and tracker domains are blocked on every
// tab. That only makes pages load faster; the visible text is the same.
// =============================================================================

use crate::config::CrawlConfig;
use crate::error::{CrawlError, FetchError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, SetBlockedUrLsParams};
use chromiumoxide::handler::viewport::Viewport as PageViewport;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// What a rendered page looks like to the rest of the crawler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    /// Where the browser ended up after redirects
    pub landed_url: String,
    /// The page's visible text (innerText of <body>)
    pub text: String,
    /// The rendered DOM, serialized, for link extraction
    pub html: String,
}

#[async_trait]
pub trait RenderingAgent: Send + Sync {
    /// Loads one URL. Every failure is a FetchError; the agent itself stays
    /// usable for the next URL.
    async fn render(&self, url: &str) -> Result<RenderedPage, FetchError>;
}

// Sub-resource requests the browser should never make
//
// Resource types are turned into file-extension patterns and domains into
// substring patterns, the two forms Chrome's URL blocklist understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceBlocklist {
    pub resource_types: Vec<String>,
    pub domains: Vec<String>,
}

impl ResourceBlocklist {
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            resource_types: config.blocked_resource_types.clone(),
            domains: config.blocked_domains.clone(),
        }
    }

    pub fn url_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = Vec::new();

        for kind in &self.resource_types {
            let extensions: &[&str] = match kind.to_ascii_lowercase().as_str() {
                "image" => &["png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "avif"],
                "font" => &["woff", "woff2", "ttf", "otf", "eot"],
                "stylesheet" => &["css"],
                "media" => &["mp4", "webm", "mp3", "ogg", "wav", "m4a"],
                other => {
                    debug!(resource_type = other, "unknown resource type, not blocked");
                    &[]
                }
            };
            patterns.extend(extensions.iter().map(|ext| format!("*.{}", ext)));
        }

        patterns.extend(
            self.domains
                .iter()
                .map(|d| d.trim())
                .filter(|d| !d.is_empty())
                .map(|d| format!("*{}*", d)),
        );

        patterns.dedup();
        patterns
    }
}

// Headless Chrome as a rendering agent
pub struct ChromeAgent {
    browser: Browser,
    handler: JoinHandle<()>,
    page_timeout: Duration,
    blocked_patterns: Vec<String>,
}

impl ChromeAgent {
    // Starts the browser. Failing here is the one thing that aborts a crawl.
    pub async fn launch(config: &CrawlConfig) -> Result<Self, CrawlError> {
        let browser_config = BrowserConfig::builder()
            .window_size(config.viewport.width, config.viewport.height)
            .viewport(page_viewport(config))
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", config.user_agent))
            .build()
            .map_err(CrawlError::RenderingAgentFatal)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CrawlError::RenderingAgentFatal(e.to_string()))?;

        // The handler drives the CDP connection and must be polled for the
        // browser's whole lifetime
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        info!(
            width = config.viewport.width,
            height = config.viewport.height,
            "headless browser started"
        );

        Ok(Self {
            browser,
            handler,
            page_timeout: config.page_timeout(),
            blocked_patterns: ResourceBlocklist::from_config(config).url_patterns(),
        })
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser did not close cleanly");
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }

    async fn open_tab(&self) -> Result<Page, FetchError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Navigation(format!("cannot open tab: {}", e)))?;

        if !self.blocked_patterns.is_empty() {
            // blocking is an optimization; a tab without it still renders
            if let Err(e) = page.execute(EnableParams::default()).await {
                debug!(error = %e, "network domain unavailable, resources not blocked");
            } else if let Err(e) = page
                .execute(SetBlockedUrLsParams::new(self.blocked_patterns.clone()))
                .await
            {
                debug!(error = %e, "could not install URL blocklist");
            }
        }
        Ok(page)
    }

    async fn read_page(page: &Page, requested: &str) -> Result<RenderedPage, FetchError> {
        let text = page
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .map_err(|e| FetchError::Navigation(format!("cannot read page text: {}", e)))?
            .into_value::<Option<String>>();
        let text = page_text(text)?;

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Navigation(format!("cannot read page HTML: {}", e)))?;

        let landed_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| requested.to_string());

        Ok(RenderedPage {
            landed_url,
            text,
            html,
        })
    }
}

// A body without text is an empty page; a value that is not text at all
// means the page never rendered properly.
fn page_text<E: std::fmt::Display>(
    value: Result<Option<String>, E>,
) -> Result<String, FetchError> {
    value
        .map(Option::unwrap_or_default)
        .map_err(|e| FetchError::Navigation(format!("page text is not a string: {}", e)))
}

// The emulated screen every tab renders at. Without it chromiumoxide
// emulates 800x600 whatever the window size is.
fn page_viewport(config: &CrawlConfig) -> PageViewport {
    PageViewport {
        width: config.viewport.width,
        height: config.viewport.height,
        ..PageViewport::default()
    }
}

#[async_trait]
impl RenderingAgent for ChromeAgent {
    async fn render(&self, url: &str) -> Result<RenderedPage, FetchError> {
        let page = self.open_tab().await?;

        let outcome = match tokio::time::timeout(self.page_timeout, page.goto(url)).await {
            Err(_) => Err(FetchError::NavigationTimeout(self.page_timeout)),
            Ok(Err(e)) => Err(FetchError::Navigation(e.to_string())),
            Ok(Ok(_)) => Self::read_page(&page, url).await,
        };

        if let Err(e) = page.close().await {
            debug!(url, error = %e, "tab did not close cleanly");
        }
        outcome
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does #[async_trait] do?
//    - Traits with async methods can't be used as `dyn Trait` on their own
//    - The macro rewrites each async fn to return a boxed future
//    - That small allocation per call is nothing next to loading a web page
//
// 2. What is the chromiumoxide handler?
//    - Browser::launch returns the browser plus a stream of CDP messages
//    - Someone has to poll that stream or every browser call hangs
//    - We spawn a tokio task that polls it until the browser goes away
//
// 3. Why tokio::time::timeout?
//    - It wraps any future and gives up after the duration
//    - Err(_) means the deadline passed, Ok(inner) carries the real result
// -----------------------------------------------------------------------------

// src/fetch/mod.rs
// =============================================================================
// Page fetching.
//
// Submodules:
// - agent: the RenderingAgent seam and the headless Chrome implementation
// - page: PageFetcher, which turns a rendered page into a PageRecord
// =============================================================================

mod agent;
mod page;

pub use agent::{ChromeAgent, RenderedPage, RenderingAgent, ResourceBlocklist};
pub use page::{FetchResult, PageFetcher, PageRecord};

// In-memory rendering agent for tests
#[cfg(test)]
pub(crate) mod testing {
    use super::{RenderedPage, RenderingAgent};
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    pub struct FakeAgent {
        pages: HashMap<String, RenderedPage>,
        slow: Vec<String>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeAgent {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(self, url: &str, text: &str, html: &str) -> Self {
            self.redirect(url, url, text, html)
        }

        pub fn redirect(mut self, url: &str, landed: &str, text: &str, html: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                RenderedPage {
                    landed_url: landed.to_string(),
                    text: text.to_string(),
                    html: html.to_string(),
                },
            );
            self
        }

        pub fn timeout(mut self, url: &str) -> Self {
            self.slow.push(url.to_string());
            self
        }

        // Every URL render() was called with, in call order
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl RenderingAgent for FakeAgent {
        async fn render(&self, url: &str) -> Result<RenderedPage, FetchError> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(url.to_string());
            }
            if self.slow.iter().any(|slow| slow == url) {
                return Err(FetchError::NavigationTimeout(Duration::from_secs(30)));
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Navigation(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)))
        }
    }
}

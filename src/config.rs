// src/config.rs
// =============================================================================
// Static crawl configuration, loaded once per process.
//
// Every field has a default, so a config file only needs the values it wants
// to change:
//
//   max_pages_to_analyze = 50
//   exclude_patterns = ["/cart", "/login"]
//
//   [viewport]
//   width = 1920
//   height = 1080
//
// The CLI can override the crawl limits on top of whatever the file says.
// =============================================================================

use crate::error::CrawlError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36 sitescout/0.1";

// Browser window size used by the rendering agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1366,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum number of successfully analysed pages in a report
    pub max_pages_to_analyze: usize,
    /// Maximum number of distinct URLs the crawl may discover
    pub max_links_to_discover: usize,
    /// Per-page navigation timeout (seconds)
    pub page_timeout_secs: u64,
    /// Politeness delay between batches, lower bound (milliseconds)
    pub crawl_delay_min_ms: u64,
    /// Politeness delay between batches, upper bound (milliseconds)
    pub crawl_delay_max_ms: u64,
    pub user_agent: String,
    pub viewport: Viewport,
    /// Substrings that reject a URL outright
    pub exclude_patterns: Vec<String>,
    /// Substrings marking product pages (classification only)
    pub product_patterns: Vec<String>,
    /// Substrings marking category pages (classification only)
    pub category_patterns: Vec<String>,
    /// Sub-resource types the rendering agent refuses to load
    pub blocked_resource_types: Vec<String>,
    /// Domain substrings the rendering agent refuses to load
    pub blocked_domains: Vec<String>,
    pub stop_words: BTreeSet<String>,
    /// Fixed phrases stripped from every page
    pub boilerplate_phrases: Vec<String>,
    /// Concurrent page fetches per batch
    pub batch_size: usize,
    /// Concurrent sitemap fetch/parse operations
    pub sitemap_workers: usize,
    pub robots_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub sitemap_timeout_secs: u64,
    /// Number of keywords kept per page
    pub max_keywords: usize,
    /// Seed the frontier from robots.txt / sitemap.xml
    pub use_sitemaps: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages_to_analyze: 20,
            max_links_to_discover: 200,
            page_timeout_secs: 30,
            crawl_delay_min_ms: 500,
            crawl_delay_max_ms: 1500,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport: Viewport::default(),
            exclude_patterns: to_strings(&[
                "/wp-admin",
                "/wp-login",
                "/login",
                "/logout",
                "/cart",
                "/checkout",
                "/account",
                "/feed",
                ".pdf",
                ".jpg",
                ".jpeg",
                ".png",
                ".gif",
                ".zip",
                "?replytocom=",
            ]),
            product_patterns: to_strings(&["/product/", "/products/", "/urun/", "/p/", "/item/"]),
            category_patterns: to_strings(&[
                "/category/",
                "/categories/",
                "/kategori/",
                "/collections/",
                "/c/",
            ]),
            blocked_resource_types: to_strings(&["image", "font", "stylesheet", "media"]),
            blocked_domains: to_strings(&[
                "google-analytics.com",
                "googletagmanager.com",
                "doubleclick.net",
                "facebook.net",
                "hotjar.com",
                "clarity.ms",
                "yandex.ru/metrika",
            ]),
            stop_words: default_stop_words(),
            boilerplate_phrases: to_strings(&[
                "Skip to main content",
                "Skip to content",
                "Skip to navigation",
                "Jump to content",
                "Ana içeriğe atla",
                "İçeriğe geç",
                "İçeriğe atla",
                "This website uses cookies",
                "We use cookies",
                "Bu web sitesi çerezler kullanmaktadır",
                "Bu sitede çerezler kullanılmaktadır",
            ]),
            batch_size: 8,
            sitemap_workers: 10,
            robots_timeout_secs: 10,
            probe_timeout_secs: 5,
            sitemap_timeout_secs: 30,
            max_keywords: 20,
            use_sitemaps: true,
        }
    }
}

impl CrawlConfig {
    // Reads a TOML config file; missing fields fall back to defaults
    pub fn load(path: &Path) -> Result<Self, CrawlError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CrawlError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: CrawlConfig = toml::from_str(&content)
            .map_err(|e| CrawlError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.batch_size == 0 {
            return Err(CrawlError::Config("batch_size must be at least 1".to_string()));
        }
        if self.sitemap_workers == 0 {
            return Err(CrawlError::Config(
                "sitemap_workers must be at least 1".to_string(),
            ));
        }
        if self.crawl_delay_min_ms > self.crawl_delay_max_ms {
            return Err(CrawlError::Config(format!(
                "crawl_delay_min_ms ({}) exceeds crawl_delay_max_ms ({})",
                self.crawl_delay_min_ms, self.crawl_delay_max_ms
            )));
        }
        Ok(())
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn robots_timeout(&self) -> Duration {
        Duration::from_secs(self.robots_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn sitemap_timeout(&self) -> Duration {
        Duration::from_secs(self.sitemap_timeout_secs)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// English + Turkish function words
fn default_stop_words() -> BTreeSet<String> {
    const ENGLISH: &[&str] = &[
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
        "during", "each", "few", "for", "from", "further", "get", "had", "has", "have",
        "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into",
        "is", "it", "its", "itself", "just", "more", "most", "my", "no", "nor", "not", "now",
        "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own",
        "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
        "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to",
        "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
        "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your",
        "yours", "may", "us", "via", "per", "etc", "one", "new",
    ];
    const TURKISH: &[&str] = &[
        "acaba", "ama", "ancak", "artık", "aslında", "az", "bana", "bazı", "belki", "ben",
        "beni", "benim", "bir", "biraz", "birçok", "biri", "birkaç", "biz", "bize", "bizi",
        "bizim", "bu", "buna", "bunda", "bundan", "bunu", "bunun", "burada", "çok", "çünkü",
        "da", "daha", "de", "defa", "diye", "en", "gibi", "göre", "hem", "hep", "hepsi", "her",
        "hiç", "için", "ile", "ise", "kadar", "ki", "kim", "mi", "mu", "mü", "nasıl", "ne",
        "neden", "nerede", "nereye", "niye", "o", "olan", "olarak", "oldu", "olduğu", "olmak",
        "olsa", "on", "ona", "ondan", "onlar", "onu", "onun", "sadece", "sen", "siz", "şey",
        "şu", "şunu", "tüm", "ve", "veya", "ya", "yani", "yine", "yok", "zaten", "değil",
        "sonra", "önce", "ayrıca", "tarafından", "üzere", "dolayı", "fazla",
    ];
    ENGLISH
        .iter()
        .chain(TURKISH.iter())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = CrawlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.sitemap_workers, 10);
        assert!(config.stop_words.contains("the"));
        assert!(config.stop_words.contains("ve"));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "max_pages_to_analyze = 5\nexclude_patterns = [\"/private\"]\n\n[viewport]\nwidth = 800\nheight = 600"
        )
        .unwrap();

        let config = CrawlConfig::load(file.path()).unwrap();
        assert_eq!(config.max_pages_to_analyze, 5);
        assert_eq!(config.exclude_patterns, vec!["/private".to_string()]);
        assert_eq!(config.viewport, Viewport { width: 800, height: 600 });
        // untouched fields keep their defaults
        assert_eq!(config.max_links_to_discover, 200);
    }

    #[test]
    fn test_rejects_inverted_delay() {
        let config = CrawlConfig {
            crawl_delay_min_ms: 2000,
            crawl_delay_max_ms: 100,
            ..CrawlConfig::default()
        };
        assert!(matches!(config.validate(), Err(CrawlError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = CrawlConfig::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(CrawlError::Config(_))));
    }
}

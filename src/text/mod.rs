// src/text/mod.rs
// =============================================================================
// Turns raw page text into something worth reporting.
//
// Submodules:
// - normalize: whitespace, split letters, boilerplate and header/footer removal
// - entities: phones, emails, URLs, prices, dates, numbers
// - keywords: token filtering and keyword ranking
//
// `Extractor` glues entities and keywords together: entities are mined
// first, blanked out of the text, and only what is left is used for keywords.
// =============================================================================

mod entities;
mod keywords;
mod normalize;

pub use entities::{blank_entities, extract_entities, ExtractedEntities};
pub use keywords::{is_meaningful, rank_keywords, tokenize, topic_text};
pub use normalize::{collapse_whitespace, fix_split_letters, strip_snippets, TextNormalizer};

use crate::config::CrawlConfig;
use keywords::fold_case;
use serde::Serialize;
use std::collections::BTreeSet;

// Everything mined from one page's normalized text
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionResult {
    pub entities: ExtractedEntities,
    pub keywords: Vec<String>,
    /// Entity-free text reduced to its meaningful tokens
    pub topic_text: String,
}

#[derive(Debug, Clone)]
pub struct Extractor {
    stop_words: BTreeSet<String>,
    max_keywords: usize,
}

impl Extractor {
    pub fn new(stop_words: BTreeSet<String>, max_keywords: usize) -> Self {
        // stop words are matched against lowercased tokens
        let stop_words = stop_words.iter().map(|w| fold_case(w)).collect();
        Self {
            stop_words,
            max_keywords,
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(config.stop_words.clone(), config.max_keywords)
    }

    pub fn extract(&self, text: &str) -> ExtractionResult {
        let entities = extract_entities(text);
        let remaining = blank_entities(text, &entities);
        let tokens = tokenize(&remaining);

        let contact: Vec<&str> = entities
            .emails
            .iter()
            .chain(&entities.phones)
            .map(String::as_str)
            .collect();
        let keywords = rank_keywords(&tokens, &self.stop_words, self.max_keywords, &contact);
        let topic_text = topic_text(&tokens, &self.stop_words);

        ExtractionResult {
            entities,
            keywords,
            topic_text,
        }
    }
}

// src/snippets.rs
// =============================================================================
// Header/footer snippets: the site chrome repeated on every page.
//
// Working out which parts of a page are header and footer is someone else's
// job (a model, a heuristic, a human). The crawler only asks once, with the
// seed page's cleaned text, and strips whatever comes back from every page.
//
// Identification is best effort. An identifier that fails returns empty
// snippets and the crawl carries on with the text as it is.
// =============================================================================

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderFooterSnippets {
    pub header: Vec<String>,
    pub footer: Vec<String>,
}

impl HeaderFooterSnippets {
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.footer.is_empty()
    }

    // Header and footer snippets as one list, ready for stripping
    pub fn combined(&self) -> Vec<String> {
        self.header
            .iter()
            .chain(&self.footer)
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect()
    }
}

#[async_trait]
pub trait HeaderFooterIdentifier: Send + Sync {
    /// Called once per crawl with the seed page's text before any snippets
    /// were removed. Must not fail; return empty snippets instead.
    async fn identify(&self, seed_text: &str) -> HeaderFooterSnippets;
}

// Identifier that never finds anything
pub struct NoSnippets;

#[async_trait]
impl HeaderFooterIdentifier for NoSnippets {
    async fn identify(&self, _seed_text: &str) -> HeaderFooterSnippets {
        HeaderFooterSnippets::default()
    }
}

// Identifier backed by snippets known up front
//
// A snippet only comes back if it actually occurs in the seed text, so a
// stale snippet file cannot silently eat content from a redesigned site.
pub struct StaticSnippets {
    snippets: HeaderFooterSnippets,
}

impl StaticSnippets {
    pub fn new(snippets: HeaderFooterSnippets) -> Self {
        Self { snippets }
    }

    // Reads snippet files, one snippet per non-empty line
    pub fn from_files(header: Option<&Path>, footer: Option<&Path>) -> std::io::Result<Self> {
        Ok(Self::new(HeaderFooterSnippets {
            header: read_lines(header)?,
            footer: read_lines(footer)?,
        }))
    }
}

#[async_trait]
impl HeaderFooterIdentifier for StaticSnippets {
    async fn identify(&self, seed_text: &str) -> HeaderFooterSnippets {
        let seed = crate::text::collapse_whitespace(seed_text);
        let present = |snippets: &[String]| -> Vec<String> {
            snippets
                .iter()
                .filter(|s| seed.contains(crate::text::collapse_whitespace(s).as_str()))
                .cloned()
                .collect()
        };
        HeaderFooterSnippets {
            header: present(&self.snippets.header),
            footer: present(&self.snippets.footer),
        }
    }
}

fn read_lines(path: Option<&Path>) -> std::io::Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

// src/text/normalize.rs
// =============================================================================
// Cleans up the visible text of a rendered page.
//
// Three passes, always in this order:
// 1. collapse whitespace and repair split Turkish letters
//    ("Ş irket" -> "Şirket", "yap ı" -> "yapı", an artifact of how some
//    fonts/renderers lay out dotted and cedilla capitals)
// 2. drop fixed boilerplate phrases (skip links, cookie banner openers)
// 3. drop the site's header/footer snippets, longest first, when known
//
// Pass 3 needs snippets that only exist after the seed page has been seen,
// so the seed goes through 1+2 first, then 3 once the snippets arrive. Every
// later page gets all three at once. Both routes produce the same text.
// =============================================================================

use crate::config::CrawlConfig;
use regex::Regex;
use std::sync::LazyLock;

// A lone Turkish capital split off the lowercase rest of its word
static SPLIT_LEADING_LETTER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(^|\s)([ÇĞİÖŞÜ]) (\p{Ll})").ok());

// A lone lowercase Turkish letter dangling after the word it belongs to
static SPLIT_TRAILING_LETTER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\p{L}) ([çğıöşü])(\s|$|[.,;:!?])").ok());

#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    // longest first
    boilerplate: Vec<String>,
}

impl TextNormalizer {
    pub fn new(boilerplate: Vec<String>) -> Self {
        Self {
            boilerplate: longest_first(boilerplate.iter().map(|p| collapse_whitespace(p))),
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(config.boilerplate_phrases.clone())
    }

    // Passes 1 and 2
    pub fn normalize(&self, raw: &str) -> String {
        let text = fix_split_letters(&collapse_whitespace(raw));
        let text = remove_literals(&text, &self.boilerplate);
        collapse_whitespace(&text)
    }

    // Passes 1, 2 and 3
    pub fn normalize_with_snippets(&self, raw: &str, snippets: &[String]) -> String {
        strip_snippets(&self.normalize(raw), snippets)
    }
}

// Removes header/footer snippets from already-normalized text
//
// Snippets are whitespace-collapsed before matching so that a snippet copied
// from multi-line page text still matches the single-line normalized form.
pub fn strip_snippets(text: &str, snippets: &[String]) -> String {
    if snippets.is_empty() {
        return text.to_string();
    }
    let snippets = longest_first(snippets.iter().map(|s| collapse_whitespace(s)));
    collapse_whitespace(&remove_literals(text, &snippets))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn fix_split_letters(text: &str) -> String {
    let mut fixed = text.to_string();
    // trailing first, so "yap ı örneği" is not read as "yap" + "ıörneği"
    if let Some(re) = SPLIT_TRAILING_LETTER.as_ref() {
        fixed = re.replace_all(&fixed, "${1}${2}${3}").into_owned();
    }
    if let Some(re) = SPLIT_LEADING_LETTER.as_ref() {
        fixed = re.replace_all(&fixed, "${1}${2}${3}").into_owned();
    }
    fixed
}

fn remove_literals(text: &str, literals: &[String]) -> String {
    literals.iter().fold(text.to_string(), |acc, literal| {
        if acc.contains(literal.as_str()) {
            acc.replace(literal.as_str(), " ")
        } else {
            acc
        }
    })
}

fn longest_first(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut items: Vec<String> = items.filter(|s| !s.is_empty()).collect();
    items.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });
    items.dedup();
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\n b\t\tc  "), "a b c");
    }

    #[test]
    fn test_split_letters_repaired() {
        assert_eq!(fix_split_letters("Ş irket hakkında"), "Şirket hakkında");
        assert_eq!(fix_split_letters("Bu bir yap ı örneği"), "Bu bir yapı örneği");
        assert_eq!(fix_split_letters("İ stanbul ofisi"), "İstanbul ofisi");
    }

    #[test]
    fn test_english_single_letters_untouched() {
        assert_eq!(fix_split_letters("I am a user"), "I am a user");
    }

    #[test]
    fn test_boilerplate_removed() {
        let normalizer = TextNormalizer::new(vec![
            "Skip to content".to_string(),
            "Skip to main content".to_string(),
        ]);
        let text = normalizer.normalize("Skip to main content  Welcome to our shop");
        assert_eq!(text, "Welcome to our shop");
    }

    #[test]
    fn test_snippets_longest_first() {
        // with the short snippet first, "Home About" would leave "Contact" behind
        let snippets = vec!["Home About".to_string(), "Home About Contact".to_string()];
        let text = strip_snippets("Home About Contact Our story begins here", &snippets);
        assert_eq!(text, "Our story begins here");
    }

    #[test]
    fn test_multiline_snippet_matches_collapsed_text() {
        let snippets = vec!["© 2024 Example\nAll rights reserved".to_string()];
        let text = strip_snippets("Great products. © 2024 Example All rights reserved", &snippets);
        assert_eq!(text, "Great products.");
    }

    #[test]
    fn test_two_pass_equals_single_pass() {
        let normalizer = TextNormalizer::new(vec!["Skip to content".to_string()]);
        let raw = "Skip to content\nHome | Shop | Blog\n\nFresh coffee beans daily.\nFooter links";
        let snippets = vec!["Home | Shop | Blog".to_string(), "Footer links".to_string()];

        let two_pass = strip_snippets(&normalizer.normalize(raw), &snippets);
        let single_pass = normalizer.normalize_with_snippets(raw, &snippets);

        assert_eq!(two_pass, single_pass);
        assert_eq!(single_pass, "Fresh coffee beans daily.");
    }
}

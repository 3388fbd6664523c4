// src/text/entities.rs
// =============================================================================
// Regex-based entity mining: phones, emails, URLs, prices, dates, numbers.
//
// The passes run in a fixed order and the generic "numbers" pass runs last,
// so a number that is part of a phone, price or date already found is not
// reported a second time.
//
// After extraction, `blank_entities` overwrites every entity in the text
// with spaces of the same length so keyword mining never sees them. Longest
// entities are blanked first: blanking "555" before "+1 555 123 4567" would
// leave a phone number that no longer matches its own text.
// =============================================================================

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

const AMOUNT: &str = r"(?:\d{1,3}(?:[.,]\d{3})+(?:[.,]\d{1,2})?|\d+(?:[.,]\d{1,2})?)";
const CURRENCY_SYMBOLS: &str = r"[$€£₺¥]";
const CURRENCY_CODES: &str = r"(?:USD|EUR|GBP|TRY|TL)";
const MONTHS: &str = "(?:january|february|march|april|june|july|august|september|october|november|december\
|jan|feb|mar|apr|may|jun|jul|aug|sept|sep|oct|nov|dec\
|ocak|şubat|mart|nisan|mayıs|haziran|temmuz|ağustos|eylül|ekim|kasım|aralık\
|oca|şub|nis|haz|tem|ağu|eyl|eki|kas|ara)";

static PHONE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{2,4}\)|\b\d{2,4})[\s.-]?\d{3}[\s.-]?\d{2,4}(?:[\s.-]\d{2})?\b",
    )
    .ok()
});

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").ok());

static URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"'()\[\]{}]+"#).ok());

static PRICE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let pattern = format!(
        r"{sym}\s?{amt}|\b{amt}\s?{sym}|\b{code}\s?{amt}|\b{amt}\s?{code}\b",
        sym = CURRENCY_SYMBOLS,
        amt = AMOUNT,
        code = CURRENCY_CODES,
    );
    Regex::new(&pattern).ok()
});

static DATE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let pattern = format!(
        r"(?i)\b\d{{4}}-\d{{2}}-\d{{2}}\b|\b\d{{1,2}}[./-]\d{{1,2}}[./-]\d{{2,4}}\b|\b\d{{1,2}}\.?\s+{m}\.?,?\s+\d{{4}}\b|\b{m}\.?\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}\b",
        m = MONTHS,
    );
    Regex::new(&pattern).ok()
});

static NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:[.,]\d+)*\b").ok());

// Entities found in one page's text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedEntities {
    pub phones: BTreeSet<String>,
    pub emails: BTreeSet<String>,
    pub urls: BTreeSet<String>,
    pub prices: BTreeSet<String>,
    pub dates: BTreeSet<String>,
    pub numbers: BTreeSet<String>,
}

impl ExtractedEntities {
    // Every entity string, across all buckets
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.phones
            .iter()
            .chain(&self.emails)
            .chain(&self.urls)
            .chain(&self.prices)
            .chain(&self.dates)
            .chain(&self.numbers)
    }
}

// Runs every regex pass over the text
pub fn extract_entities(text: &str) -> ExtractedEntities {
    let phones = find_all(&PHONE, text)
        .into_iter()
        .filter(|phone| plausible_phone(phone))
        .collect();
    let emails = find_all(&EMAIL, text).into_iter().collect();
    let urls = find_all(&URL, text)
        .into_iter()
        .map(|url| trim_url(&url).to_string())
        .filter(|url| !url.is_empty())
        .collect();
    let prices = find_all(&PRICE, text).into_iter().collect();
    let dates = find_all(&DATE, text).into_iter().collect();

    let mut entities = ExtractedEntities {
        phones,
        emails,
        urls,
        prices,
        dates,
        numbers: BTreeSet::new(),
    };

    entities.numbers = find_all(&NUMBER, text)
        .into_iter()
        .filter(|number| {
            !entities
                .phones
                .iter()
                .chain(&entities.prices)
                .chain(&entities.dates)
                .any(|found| found.contains(number.as_str()))
        })
        .collect();

    entities
}

// Replaces every entity with same-length whitespace, longest first
pub fn blank_entities(text: &str, entities: &ExtractedEntities) -> String {
    let mut ordered: Vec<&String> = entities.all().collect();
    ordered.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));

    ordered.into_iter().fold(text.to_string(), |acc, entity| {
        if entity.is_empty() || !acc.contains(entity.as_str()) {
            return acc;
        }
        let blank = " ".repeat(entity.chars().count());
        acc.replace(entity.as_str(), &blank)
    })
}

fn find_all(regex: &LazyLock<Option<Regex>>, text: &str) -> Vec<String> {
    match regex.as_ref() {
        Some(re) => re
            .find_iter(text)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

fn plausible_phone(candidate: &str) -> bool {
    let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
    (7..=15).contains(&digits)
}

// Sentence punctuation right after a URL is not part of it
fn trim_url(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        for re in [&PHONE, &EMAIL, &URL, &PRICE, &DATE, &NUMBER] {
            assert!(re.as_ref().is_some());
        }
    }

    #[test]
    fn test_contact_line() {
        let entities = extract_entities("Contact: info@x.com or call 555-123-4567. Price: $19.99");
        assert_eq!(
            entities.emails.iter().collect::<Vec<_>>(),
            vec!["info@x.com"]
        );
        assert!(entities.phones.iter().any(|p| p.contains("555-123-4567")));
        assert!(entities.prices.iter().any(|p| p.contains("$19.99")));
        // digits inside the phone and price are not generic numbers
        assert!(!entities.numbers.contains("555"));
        assert!(!entities.numbers.contains("19.99"));
    }

    #[test]
    fn test_turkish_formats() {
        let text = "Bize 0212 555 12 34 numarasından ulaşın. Fiyat: 1.299,99 TL. Son gün 15 Ocak 2025.";
        let entities = extract_entities(text);
        assert!(entities.phones.iter().any(|p| p.contains("0212 555 12 34")));
        assert!(entities.prices.contains("1.299,99 TL"));
        assert!(entities.dates.contains("15 Ocak 2025"));
    }

    #[test]
    fn test_dates() {
        let entities = extract_entities("Released 2024-03-01, updated 12/05/2024 and on March 3rd, 2024.");
        assert!(entities.dates.contains("2024-03-01"));
        assert!(entities.dates.contains("12/05/2024"));
        assert!(entities.dates.contains("March 3rd, 2024"));
    }

    #[test]
    fn test_urls_with_trailing_punctuation() {
        let entities = extract_entities("See www.example.com/docs. Or https://example.com/a?b=1, thanks");
        assert!(entities.urls.contains("www.example.com/docs"));
        assert!(entities.urls.contains("https://example.com/a?b=1"));
    }

    #[test]
    fn test_price_forms() {
        let entities = extract_entities("Now €49 instead of 59€, or USD 120.50 / 300 EUR");
        for expected in ["€49", "59€", "USD 120.50", "300 EUR"] {
            assert!(entities.prices.contains(expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_standalone_numbers() {
        let entities = extract_entities("We ship to 42 countries with 3 warehouses");
        assert!(entities.numbers.contains("42"));
        assert!(entities.numbers.contains("3"));
    }

    #[test]
    fn test_blanking_consumes_entities() {
        let text = "Mail sales@shop.com, call +1 555 123 4567 or pay $1,299.00 today";
        let entities = extract_entities(text);
        let blanked = blank_entities(text, &entities);

        assert_eq!(blanked.chars().count(), text.chars().count());
        let rescanned = extract_entities(&blanked);
        assert!(rescanned.emails.is_empty());
        assert!(rescanned.phones.is_empty());
        assert!(rescanned.prices.is_empty());
    }

    #[test]
    fn test_longest_entity_blanked_first() {
        let text = "Call 555-123-4567 now";
        let mut entities = ExtractedEntities::default();
        entities.numbers.insert("555".to_string());
        entities.phones.insert("555-123-4567".to_string());
        let blanked = blank_entities(text, &entities);
        assert_eq!(blanked, format!("Call {} now", " ".repeat(12)));
    }
}

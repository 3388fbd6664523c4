// src/text/keywords.rs
// =============================================================================
// Frequency-based keyword mining.
//
// How a page's keywords are picked:
// 1. Tokenize the (entity-free) text into lowercase words
// 2. Drop stop words, very short tokens, bare numbers and URL leftovers
// 3. Count single words, plus adjacent pairs where both halves survived step 2
// 4. Pairs seen more than once get a 1.5x boost (a repeated phrase says more
//    about a page than either of its words alone)
// 5. Rank by score, earliest appearance breaking ties
// 6. Walk the ranking and skip candidates that overlap one already accepted
//    ("coffee" after "coffee beans"); if that leaves fewer than K, top up
//    from the skipped ones in rank order
//
// The filtered tokens, joined by spaces, double as the page's "topic text".
// =============================================================================

use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

// A word starts with a letter or digit; apostrophes and hyphens may follow
static TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}'’-]*").ok());

// Pairs repeated at least this often are boosted
const BIGRAM_REPEAT_THRESHOLD: usize = 2;
const BIGRAM_BOOST: f64 = 1.5;

// Candidates shorter than this never suppress others
const MIN_SUPPRESSING_LEN: usize = 3;

// Lowercases a word the way a Turkish reader would for the dotted capital:
// plain to_lowercase turns "İ" into "i" plus a combining dot, so "İçin"
// would never match the stop word "için".
pub(super) fn fold_case(word: &str) -> String {
    word.replace('İ', "i").to_lowercase()
}

// Lowercase word tokens in reading order
pub fn tokenize(text: &str) -> Vec<String> {
    let Some(re) = TOKEN.as_ref() else {
        return Vec::new();
    };
    re.find_iter(text)
        .map(|m| {
            fold_case(m.as_str())
                .trim_end_matches(['-', '\'', '’'])
                .to_string()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

// Whether a token carries meaning on its own
pub fn is_meaningful(token: &str, stop_words: &BTreeSet<String>) -> bool {
    token.chars().count() > 2
        && !token.chars().all(|c| c.is_ascii_digit())
        && !token.starts_with("http")
        && !token.starts_with("www")
        && !stop_words.contains(token)
}

// The meaningful tokens of a text, joined by single spaces
pub fn topic_text(tokens: &[String], stop_words: &BTreeSet<String>) -> String {
    tokens
        .iter()
        .filter(|token| is_meaningful(token, stop_words))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug)]
struct Candidate {
    term: String,
    count: usize,
    first_seen: usize,
}

impl Candidate {
    fn score(&self) -> f64 {
        let is_phrase = self.term.contains(' ');
        if is_phrase && self.count >= BIGRAM_REPEAT_THRESHOLD {
            self.count as f64 * BIGRAM_BOOST
        } else {
            self.count as f64
        }
    }
}

// Picks up to `limit` keywords from a token stream
//
// `excluded` holds entity strings (emails, phones) a keyword may not be part
// of; tokenization can split "john.doe@x.com" into words that are really
// fragments of the address.
pub fn rank_keywords(
    tokens: &[String],
    stop_words: &BTreeSet<String>,
    limit: usize,
    excluded: &[&str],
) -> Vec<String> {
    if limit == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut record = |term: String, position: usize| match index.get(&term).copied() {
        Some(i) => candidates[i].count += 1,
        None => {
            index.insert(term.clone(), candidates.len());
            candidates.push(Candidate {
                term,
                count: 1,
                first_seen: position,
            });
        }
    };

    let meaningful: Vec<bool> = tokens.iter().map(|t| is_meaningful(t, stop_words)).collect();
    for (position, token) in tokens.iter().enumerate() {
        if meaningful[position] {
            record(token.clone(), position);
        }
        // pairs come from the unfiltered stream, so "coffee of beans" is not a pair
        if position + 1 < tokens.len() && meaningful[position] && meaningful[position + 1] {
            record(format!("{} {}", token, tokens[position + 1]), position);
        }
    }

    candidates.retain(|c| {
        !excluded
            .iter()
            .any(|entity| fold_case(entity).contains(c.term.as_str()))
    });

    candidates.sort_by(|a, b| {
        b.score()
            .total_cmp(&a.score())
            .then_with(|| a.first_seen.cmp(&b.first_seen))
    });

    select_diverse(candidates, limit)
}

// Greedy redundancy suppression, then backfill in rank order
fn select_diverse(ranked: Vec<Candidate>, limit: usize) -> Vec<String> {
    let mut accepted: Vec<String> = Vec::new();
    let mut skipped: Vec<String> = Vec::new();

    for candidate in ranked {
        if accepted.len() >= limit {
            break;
        }
        let redundant = accepted.iter().any(|kept| {
            kept.chars().count() >= MIN_SUPPRESSING_LEN
                && (kept.contains(candidate.term.as_str()) || candidate.term.contains(kept.as_str()))
        });
        if redundant {
            skipped.push(candidate.term);
        } else {
            accepted.push(candidate.term);
        }
    }

    let missing = limit.saturating_sub(accepted.len());
    accepted.extend(skipped.into_iter().take(missing));
    accepted
}

//! Keyword relevance search over a snapshot.
//!
//! A linear scan: every document is scored against the query tokens, zero
//! scores are dropped, and the rest are ranked with a stable sort so equal
//! scores keep snapshot order.
//!
//! # Scoring
//!
//! Per query token:
//! - `+TITLE_WEIGHT` if the lowercased title contains it,
//! - `+min(occurrences in lowercased content, TERM_CAP)`.
//!
//! Whole query (when longer than 3 characters):
//! - `+PHRASE_BONUS` if the content contains it verbatim,
//! - `+2 * PHRASE_BONUS` if the title does.

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::{Document, SearchResult};

/// Default number of results returned.
pub const MAX_RESULTS: usize = 5;
const TITLE_WEIGHT: u32 = 3;
const PHRASE_BONUS: u32 = 5;
const TERM_CAP: usize = 10;
const PHRASE_MIN_CHARS: usize = 3;

const SNIPPET_WINDOW: usize = 200;
const SNIPPET_STEP: usize = 50;
const SNIPPET_LEAD: usize = 20;
const ELLIPSIS: &str = "...";

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // Korean particles
        "이", "가", "을", "를", "의", "에", "에서", "로", "으로", "와", "과", "은", "는", "도",
        "만", "까지", "부터", "에게", "한테", "께",
        // English function words
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "in", "on", "at", "to",
        "for", "of", "with", "and", "or", "not", "it", "this", "that", "what", "how", "when",
        "where", "who",
    ]
    .into_iter()
    .collect()
});

fn is_hangul(c: char) -> bool {
    matches!(c, 'ㄱ'..='ㅎ' | 'ㅏ'..='ㅣ' | '가'..='힣')
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || is_hangul(c)
}

/// Split a query into search tokens.
///
/// Lowercases, turns every character that is not an ASCII word character or
/// Hangul into a separator, and drops single-character tokens and stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if is_token_char(c) { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|t| t.chars().count() > 1 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Rank `pages` against `query` and return at most `limit` results.
pub fn search<'a>(query: &str, pages: &'a [Document], limit: usize) -> Vec<SearchResult<'a>> {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Vec::new();
    }

    let query_lower = query.to_lowercase();
    let phrase = (query_lower.chars().count() > PHRASE_MIN_CHARS).then_some(query_lower.as_str());

    let mut scored: Vec<(&Document, u32)> = pages
        .iter()
        .map(|doc| (doc, score_document(doc, &tokens, phrase)))
        .filter(|(_, score)| *score > 0)
        .collect();

    // Stable: ties keep snapshot order.
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|(document, score)| SearchResult {
            document,
            score,
            snippet: extract_snippet(&document.content, &tokens),
        })
        .collect()
}

fn score_document(doc: &Document, tokens: &[String], phrase: Option<&str>) -> u32 {
    let title = doc.title.to_lowercase();
    let content = doc.content.to_lowercase();
    let mut score = 0u32;

    for token in tokens {
        if title.contains(token.as_str()) {
            score += TITLE_WEIGHT;
        }
        let hits = content.matches(token.as_str()).count().min(TERM_CAP);
        score += hits as u32;
    }

    if let Some(phrase) = phrase {
        if content.contains(phrase) {
            score += PHRASE_BONUS;
        }
        if title.contains(phrase) {
            score += PHRASE_BONUS * 2;
        }
    }

    score
}

/// Pick the 200-character window covering the most distinct tokens.
///
/// Windows start every 50 characters; the first best window wins. The
/// excerpt begins a little before the window, with newlines flattened and
/// `...` marking a cut at either end.
pub fn extract_snippet(content: &str, tokens: &[String]) -> String {
    let chars: Vec<char> = content.chars().collect();
    let len = chars.len();

    let mut best_pos = 0;
    let mut best_score = 0;
    for start in (0..len).step_by(SNIPPET_STEP) {
        let end = (start + SNIPPET_WINDOW).min(len);
        let window: String = chars[start..end].iter().collect::<String>().to_lowercase();
        let hits = tokens
            .iter()
            .filter(|t| window.contains(t.as_str()))
            .count();
        if hits > best_score {
            best_score = hits;
            best_pos = start;
        }
    }

    let start = best_pos.saturating_sub(SNIPPET_LEAD);
    let end = (best_pos + SNIPPET_WINDOW).min(len);
    let slice: String = chars[start..end]
        .iter()
        .map(|&c| if c == '\n' { ' ' } else { c })
        .collect();

    let mut snippet = slice.trim().to_string();
    if start > 0 {
        snippet.insert_str(0, ELLIPSIS);
    }
    if end < len {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

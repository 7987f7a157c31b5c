//! Keyword extraction: frequency heuristic and LLM response parsing

use crate::text::after_marker;
use std::collections::HashMap;

/// Keywords returned per request
pub const MAX_KEYWORDS: usize = 10;

const STOP_WORDS: [&str; 14] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

const STRIP_CHARS: &[char] = &['.', ',', '!', '?', ';', ':', '"', '(', ')', '[', ']'];

/// Most frequent non-stopword tokens longer than three characters.
///
/// Length and stopword checks apply to the raw token, punctuation is stripped
/// afterwards. Ties keep first-appearance order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for word in lowered.split_whitespace() {
        if STOP_WORDS.contains(&word) || word.chars().count() <= 3 {
            continue;
        }

        let keyword = word.trim_matches(STRIP_CHARS);
        if keyword.is_empty() {
            continue;
        }

        match positions.get(keyword) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                positions.insert(keyword.to_string(), counts.len());
                counts.push((keyword.to_string(), 1));
            }
        }
    }

    // stable: equal counts stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(keyword, _)| keyword)
        .collect()
}

pub fn keywords_prompt(text: &str) -> String {
    format!(
        "Extract the 10 most important keywords or key phrases from the following text. \
         List them separated by commas:\n\nText: {}\n\nKeywords:",
        text
    )
}

/// Comma-separated list after `Keywords:`, empty entries dropped, at most 10
pub fn parse_keyword_response(response: &str) -> Vec<String> {
    after_marker(response, "Keywords:")
        .split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

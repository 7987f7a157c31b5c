//! Fuzzy matching of a query against a list of choices
//!
//! Scores are the normalized InDel similarity in `[0, 100]`:
//! `100 * (1 - (len(a) + len(b) - 2 * lcs(a, b)) / (len(a) + len(b)))`,
//! computed over characters.

use texdit_common::config::LimitsConfig;
use texdit_common::{Result, TexditError};

/// One scored choice
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyMatch {
    pub choice: String,
    pub score: f64,
    pub index: usize,
}

/// Length of the longest common subsequence
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Similarity of two strings, 100 for identical (including both empty)
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();

    if total == 0 {
        return 100.0;
    }

    let distance = total - 2 * lcs_len(&a, &b);
    100.0 * (1.0 - distance as f64 / total as f64)
}

/// Best `limit` choices, highest score first; equal scores keep input order
pub fn extract(query: &str, choices: &[String], limit: usize) -> Vec<FuzzyMatch> {
    let mut scored: Vec<FuzzyMatch> = choices
        .iter()
        .enumerate()
        .map(|(index, choice)| FuzzyMatch {
            choice: choice.clone(),
            score: ratio(query, choice),
            index,
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}

/// Validate a search request; returns query, choices and the effective limit
pub fn validate_search_request<'a>(
    query: Option<&'a str>,
    choices: Option<&'a [String]>,
    limit: Option<usize>,
    limits: &LimitsConfig,
) -> Result<(&'a str, &'a [String], usize)> {
    match (query, choices) {
        (Some(query), Some(choices)) => {
            Ok((query, choices, limit.unwrap_or(limits.default_search_limit)))
        }
        _ => Err(TexditError::invalid_input(
            "Missing required fields: 'query' and 'choices'",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ratio_known_values() {
        assert_eq!(ratio("", ""), 100.0);
        assert_eq!(ratio("abc", ""), 0.0);
        assert_eq!(ratio("summarise", "summarise"), 100.0);
        let score = ratio("this is a test", "this is a test!");
        assert!((score - 96.551724).abs() < 1e-4);
        // lcs("kitten", "sitting") = 4 -> 1 - 5/13
        let score = ratio("kitten", "sitting");
        assert!((score - 61.538461).abs() < 1e-4);
    }

    #[test]
    fn test_ratio_is_symmetric() {
        assert_eq!(ratio("rephrase", "paraphrase"), ratio("paraphrase", "rephrase"));
    }

    #[test]
    fn test_extract_orders_and_limits() {
        let items = choices(&["summarise", "summary", "tone", "keywords", "summarize"]);
        let results = extract("summarise", &items, 3);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].choice, "summarise");
        assert_eq!(results[0].index, 0);
        assert_eq!(results[1].choice, "summarize");
        assert_eq!(results[2].choice, "summary");
    }

    #[test]
    fn test_extract_ties_keep_input_order() {
        let items = choices(&["abd", "abe", "abf"]);
        let results = extract("abc", &items, 10);
        let order: Vec<usize> = results.iter().map(|m| m.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_extract_zero_limit() {
        let items = choices(&["a", "b"]);
        assert!(extract("a", &items, 0).is_empty());
    }

    #[test]
    fn test_validate_search_request() {
        let limits = LimitsConfig::default();
        let items = choices(&["a"]);

        let (query, found, limit) =
            validate_search_request(Some("a"), Some(items.as_slice()), None, &limits).unwrap();
        assert_eq!(query, "a");
        assert_eq!(found.len(), 1);
        assert_eq!(limit, 10);

        let err = validate_search_request(Some("a"), None, None, &limits).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: 'query' and 'choices'"
        );
    }
}

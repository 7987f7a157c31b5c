//! Summarization length planning and validation
//!
//! Summary length is derived from the input word count and the requested
//! ratio; the backend does the actual generation.

use super::{check_length, single_llm_params, EMPTY_TEXT, MISSING_TEXT};
use crate::generator::GenerationParams;
use crate::text::{after_marker, round_to, word_count};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use texdit_common::config::LimitsConfig;
use texdit_common::{Result, TexditError};

/// Shortest summary we ask for, in words
const MIN_TARGET_WORDS: usize = 10;

/// Hard ceiling on seq2seq summary length
const SPECIALIZED_MAX_LENGTH: usize = 150;

/// Target length and decoding parameters for one summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryPlan {
    pub target_words: usize,
    pub params: GenerationParams,
}

fn target_words(words: usize, ratio: f64) -> usize {
    MIN_TARGET_WORDS.max((words as f64 * ratio).floor() as usize)
}

impl SummaryPlan {
    /// Seq2seq summarizer: tight window around the target, capped at 150
    pub fn specialized(words: usize, ratio: f64, max_input_tokens: usize) -> Self {
        let target = target_words(words, ratio);
        let max_length = (target + 20).min(SPECIALIZED_MAX_LENGTH);
        let min_length = 5.max(target.saturating_sub(10));

        Self {
            target_words: target,
            params: GenerationParams::beam(max_length, min_length, 4)
                .with_length_penalty(2.0)
                .with_max_input_tokens(max_input_tokens),
        }
    }

    /// Instruction-tuned LLM: wider window, the target is stated in the prompt
    pub fn single_llm(words: usize, ratio: f64, max_input_tokens: usize) -> Self {
        let target = target_words(words, ratio);

        Self {
            target_words: target,
            params: single_llm_params(
                target + 50,
                5.max(target.saturating_sub(20)),
                max_input_tokens,
            ),
        }
    }
}

/// T5-style task prefix
pub fn specialized_prompt(text: &str) -> String {
    format!("summarize: {}", text)
}

pub fn single_llm_prompt(text: &str, target_words: usize) -> String {
    format!(
        "Summarize the following text in approximately {} words:\n\nText: {}\n\nSummary:",
        target_words, text
    )
}

pub fn clean_single_llm_summary(response: &str) -> String {
    after_marker(response, "Summary:").to_string()
}

/// A generated summary with its length statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub original_length: usize,
    pub summary_length: usize,
    pub compression_ratio: f64,
}

impl Summary {
    pub fn new(summary: String, original_length: usize) -> Self {
        let summary_length = word_count(&summary);
        let compression_ratio = if original_length == 0 {
            0.0
        } else {
            round_to(summary_length as f64 / original_length as f64, 3)
        };

        Self {
            summary,
            original_length,
            summary_length,
            compression_ratio,
        }
    }
}

/// Numeric value of a request's `ratio`. Absent means `default`; booleans
/// count as 0 or 1; any other non-number is `None`.
pub fn ratio_from_json(value: Option<&Value>, default: f64) -> Option<f64> {
    match value {
        None => Some(default),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(_) => None,
    }
}

/// Validate a summarization request; returns the trimmed text and the ratio.
///
/// Checks run in order: missing text, ratio range, empty text, minimum words,
/// maximum characters.
pub fn validate_summary_request(
    text: Option<&str>,
    ratio: Option<&Value>,
    limits: &LimitsConfig,
) -> Result<(String, f64)> {
    let text = text.ok_or_else(|| TexditError::invalid_input(MISSING_TEXT))?.trim();
    let ratio = ratio_from_json(ratio, limits.default_ratio)
        .filter(|ratio| *ratio > 0.0 && *ratio <= 1.0)
        .ok_or_else(|| TexditError::invalid_input("Ratio must be a number between 0 and 1"))?;

    if text.is_empty() {
        return Err(TexditError::invalid_input(EMPTY_TEXT));
    }

    if word_count(text) < limits.min_summary_words {
        return Err(TexditError::invalid_input(format!(
            "Text must be at least {} words long for meaningful summarization",
            limits.min_summary_words
        )));
    }

    check_length(text, limits)?;

    Ok((text.to_string(), ratio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FOX: &str = "The quick brown fox jumps over the lazy dog again and again today";

    #[test]
    fn test_specialized_plan_short_text() {
        // 40 words at 25% -> target 10 (floor), window [5, 30]
        let plan = SummaryPlan::specialized(40, 0.25, 512);
        assert_eq!(plan.target_words, 10);
        assert_eq!(plan.params.max_length, 30);
        assert_eq!(plan.params.min_length, 5);
        assert_eq!(plan.params.num_beams, 4);
        assert_eq!(plan.params.length_penalty, 2.0);
    }

    #[test]
    fn test_specialized_plan_caps_at_150() {
        let plan = SummaryPlan::specialized(1000, 0.5, 512);
        assert_eq!(plan.target_words, 500);
        assert_eq!(plan.params.max_length, 150);
        assert_eq!(plan.params.min_length, 150);
    }

    #[test]
    fn test_single_llm_plan() {
        let plan = SummaryPlan::single_llm(200, 0.25, 1024);
        assert_eq!(plan.target_words, 50);
        assert_eq!(plan.params.max_length, 100);
        assert_eq!(plan.params.min_length, 30);
        assert_eq!(plan.params.num_beams, 2);
        assert_eq!(plan.params.no_repeat_ngram_size, Some(2));
        assert_eq!(plan.params.max_input_tokens, 1024);
    }

    #[test]
    fn test_summary_statistics() {
        let summary = Summary::new("a fox jumps".to_string(), 9);
        assert_eq!(summary.summary_length, 3);
        assert_eq!(summary.compression_ratio, 0.333);
    }

    #[test]
    fn test_validation_order() {
        let limits = LimitsConfig::default();

        let err = validate_summary_request(None, Some(&json!(2.0)), &limits).unwrap_err();
        assert_eq!(err.to_string(), MISSING_TEXT);

        // ratio is checked before emptiness
        let err = validate_summary_request(Some(""), Some(&json!(0.0)), &limits).unwrap_err();
        assert_eq!(err.to_string(), "Ratio must be a number between 0 and 1");

        let err = validate_summary_request(Some("  "), None, &limits).unwrap_err();
        assert_eq!(err.to_string(), EMPTY_TEXT);

        let err = validate_summary_request(Some("too short"), None, &limits).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Text must be at least 10 words long for meaningful summarization"
        );

        let long = format!("{} {}", FOX, "word ".repeat(2500));
        let err = validate_summary_request(Some(&long), None, &limits).unwrap_err();
        assert!(err.to_string().starts_with("Text too long"));
    }

    #[test]
    fn test_validation_defaults_ratio() {
        let limits = LimitsConfig::default();
        let (text, ratio) =
            validate_summary_request(Some(&format!("  {}  ", FOX)), None, &limits).unwrap();
        assert_eq!(text, FOX);
        assert_eq!(ratio, 0.25);

        let (_, ratio) = validate_summary_request(Some(FOX), Some(&json!(1)), &limits).unwrap();
        assert_eq!(ratio, 1.0);
    }

    #[test]
    fn test_non_numeric_ratio_is_rejected() {
        let limits = LimitsConfig::default();
        for ratio in [json!(null), json!("half"), json!([0.5]), json!(false)] {
            let err = validate_summary_request(Some(FOX), Some(&ratio), &limits).unwrap_err();
            assert_eq!(err.to_string(), "Ratio must be a number between 0 and 1");
        }

        // true behaves as 1
        let (_, ratio) = validate_summary_request(Some(FOX), Some(&json!(true)), &limits).unwrap();
        assert_eq!(ratio, 1.0);
    }

    #[test]
    fn test_prompts() {
        assert_eq!(specialized_prompt("abc"), "summarize: abc");
        let prompt = single_llm_prompt("abc", 12);
        assert!(prompt.contains("approximately 12 words"));
        assert!(prompt.ends_with("Summary:"));
        assert_eq!(clean_single_llm_summary("Summary: short one"), "short one");
    }
}

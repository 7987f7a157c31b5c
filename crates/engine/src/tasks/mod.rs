//! Text tasks: prompt construction, length heuristics, rule-based analysers
//! and request validation.

pub mod keywords;
pub mod rephrase;
pub mod search;
pub mod summarize;
pub mod tone;

use crate::generator::GenerationParams;
use texdit_common::config::LimitsConfig;
use texdit_common::{Result, TexditError};

pub use keywords::{extract_keywords, parse_keyword_response, MAX_KEYWORDS};
pub use rephrase::Rephrasing;
pub use search::{extract, ratio, FuzzyMatch};
pub use summarize::{validate_summary_request, Summary, SummaryPlan};
pub use tone::{analyze_tone_rules, parse_tone_response, ToneReport};

pub const MISSING_TEXT: &str = "Missing required field: 'text'";
pub const EMPTY_TEXT: &str = "Text cannot be empty";

/// Decoding shared by every single-LLM task
pub(crate) fn single_llm_params(
    max_length: usize,
    min_length: usize,
    max_input_tokens: usize,
) -> GenerationParams {
    GenerationParams::beam(max_length, min_length, 2)
        .with_no_repeat_ngram_size(2)
        .with_max_input_tokens(max_input_tokens)
}

/// Validate the `text` field of keywords/tone/rephrase requests; returns it trimmed
pub fn validate_text(text: Option<&str>, limits: &LimitsConfig) -> Result<String> {
    let text = text.ok_or_else(|| TexditError::invalid_input(MISSING_TEXT))?.trim();

    if text.is_empty() {
        return Err(TexditError::invalid_input(EMPTY_TEXT));
    }

    check_length(text, limits)?;
    Ok(text.to_string())
}

pub(crate) fn check_length(text: &str, limits: &LimitsConfig) -> Result<()> {
    if text.chars().count() > limits.max_text_chars {
        return Err(TexditError::invalid_input(format!(
            "Text too long. Maximum {} characters allowed.",
            thousands(limits.max_text_chars)
        )));
    }
    Ok(())
}

/// 10000 -> "10,000"
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

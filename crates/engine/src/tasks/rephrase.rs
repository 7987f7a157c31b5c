//! Rephrasing parameters and prompt

use super::single_llm_params;
use crate::generator::GenerationParams;
use crate::text::after_marker;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rephrasing {
    pub original: String,
    pub rephrased: String,
}

/// Seq2seq rephrasing: sampled beams sized around the input length
pub fn specialized_params(words: usize, max_input_tokens: usize) -> GenerationParams {
    GenerationParams::beam(words + 50, 5.max(words.saturating_sub(10)), 4)
        .with_length_penalty(2.0)
        .with_sampling(0.8)
        .with_max_input_tokens(max_input_tokens)
}

pub fn single_llm_params_for(words: usize, max_input_tokens: usize) -> GenerationParams {
    single_llm_params(words + 100, 5.max(words.saturating_sub(10)), max_input_tokens)
}

pub fn rephrase_prompt(text: &str) -> String {
    format!(
        "Rewrite the following text using different words while keeping the same meaning:\n\n\
         Original: {}\n\nRewritten:",
        text
    )
}

pub fn clean_rephrase(response: &str) -> String {
    after_marker(response, "Rewritten:").to_string()
}

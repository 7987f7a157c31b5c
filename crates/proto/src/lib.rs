//! TexDit wire types
//!
//! JSON request and response bodies for the `/api/*` endpoints, shared by the
//! server and the benchmark clients. Required request fields are `Option` so a
//! missing field is reported with a precise message instead of a generic
//! deserialization failure.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Endpoint names under `/api/`
pub mod endpoints {
    pub const SEARCH: &str = "search";
    pub const SUMMARISE: &str = "summarise";
    pub const KEYWORDS: &str = "keywords";
    pub const TONE: &str = "tone";
    pub const REPHRASE: &str = "rephrase";
    pub const SWITCH_MODEL: &str = "switch_model";

    /// Text tasks exercised by the benchmarks, in reporting order
    pub const TASKS: [&str; 4] = [SUMMARISE, KEYWORDS, TONE, REPHRASE];
}

// Fuzzy search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub choices: Option<Vec<String>>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<String>,
}

// Summarization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummariseRequest {
    pub text: Option<String>,
    /// Raw JSON so a non-number (or `null`) reaches validation instead of
    /// failing the body; `None` only when the field is absent
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub ratio: Option<Value>,
}

/// Keep `null` as `Some(Value::Null)`
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummariseResponse {
    pub summary: String,
    pub original_length: usize,
    pub summary_length: usize,
    pub compression_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

/// Body shared by the single-text endpoints (keywords, tone, rephrase)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextRequest {
    pub text: Option<String>,
}

impl TextRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

// Keyword extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordsResponse {
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

// Tone analysis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    Formal,
    Informal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneAnalysis {
    pub raw_response: String,
    pub confidence: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneResponse {
    pub tone: Tone,
    pub formality: Formality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ToneAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

// Rephrasing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RephraseResponse {
    pub original: String,
    pub rephrased: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

// Model switching
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchModelRequest {
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchModelResponse {
    pub message: String,
    pub model_name: String,
}

/// Server-side timing attached to task responses
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Performance {
    /// Seconds, rounded to 2 places
    pub total_time: f64,
}

// Service info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeResponse {
    pub message: String,
    pub version: String,
    pub model_loaded: bool,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub model_loaded: bool,
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let request: SummariseRequest = serde_json::from_str("{}").unwrap();
        assert!(request.text.is_none());
        assert!(request.ratio.is_none());

        // an explicit null is kept apart from an absent ratio
        let request: SummariseRequest = serde_json::from_str(r#"{"ratio": null}"#).unwrap();
        assert_eq!(request.ratio, Some(Value::Null));
        let request: SummariseRequest = serde_json::from_str(r#"{"ratio": "half"}"#).unwrap();
        assert_eq!(request.ratio, Some(Value::from("half")));

        let request: SearchRequest = serde_json::from_str(r#"{"query": "fox"}"#).unwrap();
        assert_eq!(request.query.as_deref(), Some("fox"));
        assert!(request.choices.is_none());
    }

    #[test]
    fn test_tone_labels_are_lowercase() {
        let response = ToneResponse {
            tone: Tone::Positive,
            formality: Formality::Informal,
            analysis: None,
            performance: None,
            model_used: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["tone"], "positive");
        assert_eq!(json["formality"], "informal");
        assert!(json.get("analysis").is_none());
    }
}

//! Package size versus speed
//!
//! Compares the on-disk footprint of shipping one model per feature against a
//! single general model, then checks whether the single LLM answers fast enough.

use crate::client::{EndpointResult, ServerClient};
use crate::corpus::MEDIUM;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use texdit_common::config::BenchConfig;
use texdit_common::Result;
use texdit_proto::endpoints;
use tracing::{info, warn};

/// Per-request timeout for the speed check
pub const SPEED_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SpecializedModel {
    pub feature: &'static str,
    pub model: &'static str,
    pub size_gb: f64,
}

pub const SPECIALIZED_MODELS: [SpecializedModel; 6] = [
    SpecializedModel { feature: "summarization", model: "DistilBART-CNN-12-6", size_gb: 1.14 },
    SpecializedModel { feature: "keywords", model: "ml6team/keyphrase-extraction-distilbert", size_gb: 0.5 },
    SpecializedModel { feature: "grammar", model: "prithivida/grammar_error_correcter_v1", size_gb: 1.2 },
    SpecializedModel { feature: "ner", model: "dslim/bert-base-NER", size_gb: 0.4 },
    SpecializedModel { feature: "tone", model: "cardiffnlp/twitter-roberta-base-sentiment", size_gb: 0.5 },
    SpecializedModel { feature: "rephrase", model: "tuner007/pegasus_paraphrase", size_gb: 2.3 },
];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LlmPackage {
    pub name: &'static str,
    pub size_gb: f64,
    pub expected_speed: &'static str,
}

pub const LLM_PACKAGES: [LlmPackage; 4] = [
    LlmPackage { name: "Flan-T5-Large", size_gb: 3.0, expected_speed: "medium" },
    LlmPackage { name: "Phi-3-Mini", size_gb: 3.8, expected_speed: "fast" },
    LlmPackage { name: "Mistral-7B", size_gb: 14.0, expected_speed: "slow" },
    LlmPackage { name: "Llama-3.2-3B", size_gb: 6.0, expected_speed: "medium-fast" },
];

/// `(scenario, features)`
pub const SCENARIOS: [(&str, &[&str]); 3] = [
    ("minimal", &["summarization", "keywords"]),
    ("standard", &["summarization", "keywords", "tone", "rephrase"]),
    ("full", &["summarization", "keywords", "tone", "rephrase", "grammar", "ner"]),
];

/// Total size and model names for a feature set; unknown features add nothing
pub fn specialized_size(features: &[&str]) -> (f64, Vec<&'static str>) {
    features
        .iter()
        .filter_map(|feature| SPECIALIZED_MODELS.iter().find(|m| m.feature == *feature))
        .fold((0.0, Vec::new()), |(total, mut models), m| {
            models.push(m.model);
            (total + m.size_gb, models)
        })
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmAlternative {
    pub name: String,
    pub size_gb: f64,
    /// LLM size minus specialized size; negative means the LLM is smaller
    pub difference_gb: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeComparison {
    pub scenario: String,
    pub features: Vec<String>,
    pub specialized_gb: f64,
    pub models: Vec<String>,
    pub alternatives: Vec<LlmAlternative>,
}

pub fn size_comparisons() -> Vec<SizeComparison> {
    SCENARIOS
        .iter()
        .map(|(scenario, features)| {
            let (specialized_gb, models) = specialized_size(features);
            SizeComparison {
                scenario: scenario.to_string(),
                features: features.iter().map(|f| f.to_string()).collect(),
                specialized_gb,
                models: models.into_iter().map(str::to_string).collect(),
                alternatives: LLM_PACKAGES
                    .iter()
                    .map(|llm| LlmAlternative {
                        name: llm.name.to_string(),
                        size_gb: llm.size_gb,
                        difference_gb: llm.size_gb - specialized_gb,
                    })
                    .collect(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedVerdict {
    Acceptable,
    Borderline,
    TooSlow,
}

/// Under 5 s is acceptable, under 10 s borderline; timeouts are too slow
pub fn speed_verdict(result: &EndpointResult) -> Option<SpeedVerdict> {
    if result.success {
        Some(if result.time_seconds < 5.0 {
            SpeedVerdict::Acceptable
        } else if result.time_seconds < 10.0 {
            SpeedVerdict::Borderline
        } else {
            SpeedVerdict::TooSlow
        })
    } else if result.timed_out {
        Some(SpeedVerdict::TooSlow)
    } else {
        None
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeedCheck {
    pub endpoint: String,
    pub specialized: EndpointResult,
    pub single_llm: EndpointResult,
    pub verdict: Option<SpeedVerdict>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackagingReport {
    pub sizes: Vec<SizeComparison>,
    /// Empty when either server was down
    pub speed: Vec<SpeedCheck>,
}

pub struct PackagingAnalysis {
    specialized: ServerClient,
    single_llm: ServerClient,
}

impl PackagingAnalysis {
    pub fn new(config: &BenchConfig) -> Result<Self> {
        Ok(Self {
            specialized: ServerClient::new(&config.specialized_url)?,
            single_llm: ServerClient::new(&config.single_llm_url)?,
        })
    }

    pub async fn run(&self) -> Result<PackagingReport> {
        let sizes = size_comparisons();
        for comparison in &sizes {
            info!(
                "{} app ({} features): specialized {:.1}GB across {} models",
                comparison.scenario.to_uppercase(),
                comparison.features.len(),
                comparison.specialized_gb,
                comparison.models.len()
            );
            for alt in &comparison.alternatives {
                let relation = if alt.difference_gb < 0.0 { "smaller" } else { "larger" };
                info!(
                    "  {}: {:.1}GB ({:.1}GB {})",
                    alt.name,
                    alt.size_gb,
                    alt.difference_gb.abs(),
                    relation
                );
            }
        }

        let both_up =
            self.specialized.health_check().await && self.single_llm.health_check().await;
        let speed = if both_up {
            self.speed_checks().await
        } else {
            warn!("Servers not available. Run texdit-manager first for performance data.");
            Vec::new()
        };

        Ok(PackagingReport { sizes, speed })
    }

    /// Medium text against every task on both servers
    async fn speed_checks(&self) -> Vec<SpeedCheck> {
        let body = json!({ "text": MEDIUM });
        let mut checks = Vec::new();

        for endpoint in endpoints::TASKS {
            info!("Testing {}...", endpoint);
            let specialized = self.specialized.post_endpoint(endpoint, &body, SPEED_TIMEOUT).await;
            let single_llm = self.single_llm.post_endpoint(endpoint, &body, SPEED_TIMEOUT).await;
            let verdict = speed_verdict(&single_llm);

            info!(
                "  Specialized: {}s ({}), single LLM: {}s ({}), verdict: {:?}",
                specialized.time_seconds,
                if specialized.success { "ok" } else { "failed" },
                single_llm.time_seconds,
                if single_llm.success { "ok" } else { "failed" },
                verdict
            );

            checks.push(SpeedCheck {
                endpoint: endpoint.to_string(),
                specialized,
                single_llm,
                verdict,
            });
        }

        checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(success: bool, time_seconds: f64, timed_out: bool) -> EndpointResult {
        EndpointResult {
            success,
            time_seconds,
            response: None,
            error: None,
            timed_out,
        }
    }

    #[test]
    fn test_specialized_size() {
        let (total, models) = specialized_size(&["summarization", "keywords"]);
        assert!((total - 1.64).abs() < 1e-9);
        assert_eq!(models.len(), 2);

        let (total, models) = specialized_size(&["summarization", "telepathy"]);
        assert!((total - 1.14).abs() < 1e-9);
        assert_eq!(models, vec!["DistilBART-CNN-12-6"]);
    }

    #[test]
    fn test_size_comparisons() {
        let sizes = size_comparisons();
        assert_eq!(sizes.len(), 3);

        let full = &sizes[2];
        assert_eq!(full.scenario, "full");
        assert!((full.specialized_gb - 6.04).abs() < 1e-9);

        let flan = &full.alternatives[0];
        assert_eq!(flan.name, "Flan-T5-Large");
        assert!(flan.difference_gb < 0.0);
    }

    #[test]
    fn test_speed_verdict() {
        assert_eq!(speed_verdict(&timed(true, 4.9, false)), Some(SpeedVerdict::Acceptable));
        assert_eq!(speed_verdict(&timed(true, 5.0, false)), Some(SpeedVerdict::Borderline));
        assert_eq!(speed_verdict(&timed(true, 12.0, false)), Some(SpeedVerdict::TooSlow));
        assert_eq!(speed_verdict(&timed(false, 15.0, true)), Some(SpeedVerdict::TooSlow));
        assert_eq!(speed_verdict(&timed(false, 0.1, false)), None);
    }

    #[tokio::test]
    async fn test_run_without_servers_skips_speed() {
        let config = BenchConfig {
            specialized_url: "http://127.0.0.1:1".to_string(),
            single_llm_url: "http://127.0.0.1:1".to_string(),
            ..BenchConfig::default()
        };
        let report = PackagingAnalysis::new(&config).unwrap().run().await.unwrap();
        assert_eq!(report.sizes.len(), 3);
        assert!(report.speed.is_empty());
    }
}

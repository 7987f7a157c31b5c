//! Side-by-side timing of both servers over HTTP
//!
//! Posts every corpus text to every task endpoint on each server that is up,
//! then summarizes per endpoint and compares the averages.

use crate::client::{EndpointResult, ServerClient};
use crate::corpus::TEXTS;
use crate::report::write_json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use texdit_common::config::BenchConfig;
use texdit_common::Result;
use texdit_engine::text::word_count;
use texdit_proto::endpoints;
use tracing::{info, warn};
use uuid::Uuid;

/// endpoint -> text size -> result
pub type ArchitectureResults = BTreeMap<String, BTreeMap<String, EndpointResult>>;

/// Timing summary of one endpoint on one server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSummary {
    pub endpoint: String,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub failures: usize,
}

/// Averages of one endpoint on both servers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointComparison {
    pub endpoint: String,
    pub specialized_avg: f64,
    pub single_llm_avg: f64,
    pub faster: String,
    pub difference: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub current_architecture: ArchitectureResults,
    pub single_llm_architecture: ArchitectureResults,
    pub comparison: Vec<EndpointComparison>,
}

/// Summaries of every endpoint in `results`
pub fn summarize(results: &ArchitectureResults) -> Vec<EndpointSummary> {
    results
        .iter()
        .map(|(endpoint, runs)| {
            let times: Vec<f64> = runs
                .values()
                .filter(|r| r.success)
                .map(|r| r.time_seconds)
                .collect();
            let failures = runs.len() - times.len();

            let (average, min, max) = if times.is_empty() {
                (None, None, None)
            } else {
                (
                    Some(times.iter().sum::<f64>() / times.len() as f64),
                    times.iter().copied().reduce(f64::min),
                    times.iter().copied().reduce(f64::max),
                )
            };

            EndpointSummary {
                endpoint: endpoint.clone(),
                average,
                min,
                max,
                failures,
            }
        })
        .collect()
}

/// Compare endpoints that have successful runs on both servers
pub fn compare(
    specialized: &ArchitectureResults,
    single_llm: &ArchitectureResults,
) -> Vec<EndpointComparison> {
    let single: BTreeMap<String, EndpointSummary> = summarize(single_llm)
        .into_iter()
        .map(|s| (s.endpoint.clone(), s))
        .collect();

    summarize(specialized)
        .into_iter()
        .filter_map(|current| {
            let other = single.get(&current.endpoint)?;
            let (current_avg, single_avg) = (current.average?, other.average?);

            let (faster, difference) = if current_avg < single_avg {
                ("specialized", single_avg - current_avg)
            } else {
                ("single_llm", current_avg - single_avg)
            };

            Some(EndpointComparison {
                endpoint: current.endpoint,
                specialized_avg: current_avg,
                single_llm_avg: single_avg,
                faster: faster.to_string(),
                difference,
            })
        })
        .collect()
}

pub struct QuickComparison {
    specialized: ServerClient,
    single_llm: ServerClient,
    timeout: Duration,
    report_dir: PathBuf,
}

impl QuickComparison {
    pub fn new(config: &BenchConfig) -> Result<Self> {
        Ok(Self {
            specialized: ServerClient::new(&config.specialized_url)?,
            single_llm: ServerClient::new(&config.single_llm_url)?,
            timeout: config.request_timeout(),
            report_dir: config.report_dir.clone(),
        })
    }

    /// Run the comparison and write the report; `None` when neither server is up
    pub async fn run(&self) -> Result<Option<QuickReport>> {
        info!("Checking server availability...");
        let current_up = self.specialized.health_check().await;
        let single_up = self.single_llm.health_check().await;
        info!(
            "Specialized ({}): {}, single LLM ({}): {}",
            self.specialized.base_url(),
            availability(current_up),
            self.single_llm.base_url(),
            availability(single_up)
        );

        if !current_up && !single_up {
            warn!(
                "No servers are running. Start at least one with \
                 `TEXDIT_MODE=specialized texdit-server` or `TEXDIT_MODE=single_llm texdit-server`"
            );
            return Ok(None);
        }

        let mut current_results = ArchitectureResults::new();
        let mut single_results = ArchitectureResults::new();

        for endpoint in endpoints::TASKS {
            info!("Testing {}...", endpoint);

            for (size, text) in TEXTS {
                info!("  {} text ({} words)", size, word_count(text));
                let body = request_body(endpoint, text);

                let current = if current_up {
                    let result = self.specialized.post_endpoint(endpoint, &body, self.timeout).await;
                    info!("    Specialized: {}", outcome(&result));
                    Some(result)
                } else {
                    None
                };

                let single = if single_up {
                    let result = self.single_llm.post_endpoint(endpoint, &body, self.timeout).await;
                    info!("    Single LLM: {}", outcome(&result));
                    Some(result)
                } else {
                    None
                };

                if let (Some(current), Some(single)) = (&current, &single) {
                    if current.success && single.success {
                        let diff = single.time_seconds - current.time_seconds;
                        if diff > 0.0 {
                            info!("    Specialized is {:.2}s faster", diff);
                        } else {
                            info!("    Single LLM is {:.2}s faster", diff.abs());
                        }
                    }
                }

                if let Some(result) = current {
                    insert(&mut current_results, endpoint, size, result);
                }
                if let Some(result) = single {
                    insert(&mut single_results, endpoint, size, result);
                }
            }
        }

        let comparison = compare(&current_results, &single_results);
        log_summary("SPECIALIZED ARCHITECTURE", &current_results);
        log_summary("SINGLE LLM ARCHITECTURE", &single_results);
        for c in &comparison {
            info!(
                "{}: {} faster by {:.2}s on average (specialized {:.2}s | single LLM {:.2}s)",
                c.endpoint.to_uppercase(),
                c.faster,
                c.difference,
                c.specialized_avg,
                c.single_llm_avg
            );
        }

        let report = QuickReport {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            current_architecture: current_results,
            single_llm_architecture: single_results,
            comparison,
        };

        let file_name = format!("quick_test_results_{}.json", report.timestamp.timestamp());
        write_json(&self.report_dir, &file_name, &report)?;
        Ok(Some(report))
    }
}

/// `{text}`, plus the default ratio for summaries
pub fn request_body(endpoint: &str, text: &str) -> serde_json::Value {
    if endpoint == endpoints::SUMMARISE {
        json!({ "text": text, "ratio": 0.25 })
    } else {
        json!({ "text": text })
    }
}

fn insert(results: &mut ArchitectureResults, endpoint: &str, size: &str, result: EndpointResult) {
    results
        .entry(endpoint.to_string())
        .or_default()
        .insert(size.to_string(), result);
}

fn availability(up: bool) -> &'static str {
    if up {
        "available"
    } else {
        "unavailable"
    }
}

fn outcome(result: &EndpointResult) -> String {
    if result.success {
        format!("ok {}s", result.time_seconds)
    } else {
        format!("failed {}s", result.time_seconds)
    }
}

fn log_summary(title: &str, results: &ArchitectureResults) {
    if results.is_empty() {
        return;
    }

    info!("{}", title);
    for summary in summarize(results) {
        if let (Some(avg), Some(min), Some(max)) = (summary.average, summary.min, summary.max) {
            info!("  {}: {:.2}s avg ({:.2}s-{:.2}s)", summary.endpoint, avg, min, max);
        }
        if summary.failures > 0 {
            info!("    {} failures", summary.failures);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(success: bool, time_seconds: f64) -> EndpointResult {
        EndpointResult {
            success,
            time_seconds,
            response: None,
            error: (!success).then(|| "HTTP 500: boom".to_string()),
            timed_out: false,
        }
    }

    fn results(endpoint: &str, runs: &[(&str, EndpointResult)]) -> ArchitectureResults {
        let mut out = ArchitectureResults::new();
        for (size, r) in runs {
            insert(&mut out, endpoint, size, r.clone());
        }
        out
    }

    #[test]
    fn test_summarize() {
        let runs = results(
            "tone",
            &[
                ("short", result(true, 0.5)),
                ("medium", result(true, 1.5)),
                ("long", result(false, 9.0)),
            ],
        );
        let summary = &summarize(&runs)[0];
        assert_eq!(summary.average, Some(1.0));
        assert_eq!(summary.min, Some(0.5));
        assert_eq!(summary.max, Some(1.5));
        assert_eq!(summary.failures, 1);
    }

    #[test]
    fn test_summarize_all_failed() {
        let runs = results("tone", &[("short", result(false, 0.1))]);
        let summary = &summarize(&runs)[0];
        assert_eq!(summary.average, None);
        assert_eq!(summary.failures, 1);
    }

    #[test]
    fn test_compare() {
        let current = results("summarise", &[("short", result(true, 0.4))]);
        let single = results("summarise", &[("short", result(true, 1.0))]);

        let comparison = compare(&current, &single);
        assert_eq!(comparison.len(), 1);
        assert_eq!(comparison[0].faster, "specialized");
        assert!((comparison[0].difference - 0.6).abs() < 1e-9);

        // endpoints missing on one side are skipped
        let other = results("keywords", &[("short", result(true, 1.0))]);
        assert!(compare(&current, &other).is_empty());
    }

    #[test]
    fn test_request_body() {
        assert_eq!(request_body("summarise", "t")["ratio"], 0.25);
        assert!(request_body("tone", "t").get("ratio").is_none());
    }

    #[tokio::test]
    async fn test_run_without_servers() {
        let dir = tempfile::tempdir().unwrap();
        let config = BenchConfig {
            specialized_url: "http://127.0.0.1:1".to_string(),
            single_llm_url: "http://127.0.0.1:1".to_string(),
            report_dir: dir.path().to_path_buf(),
            ..BenchConfig::default()
        };

        let report = QuickComparison::new(&config).unwrap().run().await.unwrap();
        assert!(report.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_run_against_one_server() {
        use axum::routing::{get, post};
        use axum::{Json, Router};

        let app = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/api/:endpoint", post(|| async { Json(json!({"ok": true})) }));
        let url = crate::test_support::spawn(app).await;

        let dir = tempfile::tempdir().unwrap();
        let config = BenchConfig {
            specialized_url: url,
            single_llm_url: "http://127.0.0.1:1".to_string(),
            report_dir: dir.path().to_path_buf(),
            ..BenchConfig::default()
        };

        let report = QuickComparison::new(&config).unwrap().run().await.unwrap().unwrap();
        assert_eq!(report.current_architecture.len(), 4);
        assert_eq!(report.current_architecture["summarise"].len(), 3);
        assert!(report.current_architecture["tone"]["long"].success);
        assert!(report.single_llm_architecture.is_empty());
        assert!(report.comparison.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}

//! In-process architecture benchmark
//!
//! Builds each architecture's pipeline directly against the inference backends
//! and measures load time, resident memory growth and per-task latency over the
//! corpus. Memory figures come from `/proc` and are zero where it is missing.

use crate::corpus::TEXTS;
use crate::report::write_json;
use chrono::{Local, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;
use texdit_common::config::{
    BenchConfig, LimitsConfig, LlmOption, SingleLlmConfig, SpecializedConfig,
};
use texdit_common::Result;
use texdit_engine::text::{preview, round_to};
use texdit_engine::{run_task, SingleLlmPipeline, SpecializedPipeline, TaskKind, TaskPipeline};
use tracing::{error, info};

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub cpu_count: usize,
    pub memory_total_gb: Option<f64>,
    pub memory_available_gb: Option<f64>,
    pub version: String,
    pub timestamp: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        let meminfo = std::fs::read_to_string("/proc/meminfo").unwrap_or_default();
        let to_gb = |kb: u64| round_to(kb as f64 / (1024.0 * 1024.0), 2);

        Self {
            cpu_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            memory_total_gb: proc_kb(&meminfo, "MemTotal").map(to_gb),
            memory_available_gb: proc_kb(&meminfo, "MemAvailable").map(to_gb),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Value in kB of a `Key:   1234 kB` line from a `/proc` file
pub fn proc_kb(content: &str, key: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        let rest = line.strip_prefix(key)?.strip_prefix(':')?;
        rest.split_whitespace().next()?.parse().ok()
    })
}

/// Resident set size of this process in MB
pub fn rss_mb() -> f64 {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| proc_kb(&status, "VmRSS"))
        .map(|kb| kb as f64 / 1024.0)
        .unwrap_or(0.0)
}

/// Await `fut`, returning its output with seconds (3 places) and RSS delta in MB (2 places)
async fn measure<T>(fut: impl Future<Output = T>) -> (T, f64, f64) {
    let memory_before = rss_mb();
    let start = Instant::now();
    let output = fut.await;
    let secs = round_to(start.elapsed().as_secs_f64(), 3);
    let memory = round_to(rss_mb() - memory_before, 2);
    (output, secs, memory)
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadingStats {
    pub time_seconds: f64,
    pub memory_mb: f64,
    pub model_size_description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskRun {
    pub time_seconds: f64,
    pub memory_mb: f64,
    pub output_preview: String,
}

/// task -> text size -> run
pub type TaskResults = BTreeMap<String, BTreeMap<String, TaskRun>>;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ArchitectureOutcome {
    Measured {
        loading: LoadingStats,
        #[serde(flatten)]
        tasks: TaskResults,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchitectureReport {
    pub timestamp: String,
    pub system_info: SystemInfo,
    pub current_architecture: ArchitectureOutcome,
    pub single_llm_architecture: BTreeMap<String, ArchitectureOutcome>,
}

/// Every task over every corpus text
pub async fn measure_pipeline(pipeline: &dyn TaskPipeline, ratio: f64) -> Result<TaskResults> {
    let mut results = TaskResults::new();

    for task in TaskKind::ALL {
        info!("  Testing {}...", task);
        let mut runs = BTreeMap::new();

        for (size, text) in TEXTS {
            let (output, time_seconds, memory_mb) =
                measure(run_task(pipeline, task, text, ratio)).await;
            let output = output?;

            runs.insert(
                size.to_string(),
                TaskRun {
                    time_seconds,
                    memory_mb,
                    output_preview: preview(&output, PREVIEW_CHARS),
                },
            );
        }

        results.insert(task.to_string(), runs);
    }

    Ok(results)
}

/// Mean time per task
pub fn task_averages(tasks: &TaskResults) -> Vec<(String, f64)> {
    tasks
        .iter()
        .filter(|(_, runs)| !runs.is_empty())
        .map(|(task, runs)| {
            let total: f64 = runs.values().map(|r| r.time_seconds).sum();
            (task.clone(), total / runs.len() as f64)
        })
        .collect()
}

pub struct ArchitectureTest {
    config: BenchConfig,
    limits: LimitsConfig,
    report_dir: PathBuf,
}

impl ArchitectureTest {
    pub fn new(config: BenchConfig, limits: LimitsConfig) -> Self {
        let report_dir = config.report_dir.clone();
        Self {
            config,
            limits,
            report_dir,
        }
    }

    async fn test_specialized(&self) -> Result<ArchitectureOutcome> {
        let summarizer = self.config.summarizer.clone();
        let description = format!("{} + rule-based keywords/tone", summarizer.model);
        let specialized = SpecializedConfig {
            summarizer,
            rephraser: None,
        };

        let (pipeline, time_seconds, memory_mb) =
            measure(SpecializedPipeline::load(&specialized, self.limits.clone())).await;
        let pipeline = pipeline?;
        info!("  Loaded in {}s ({}MB)", time_seconds, memory_mb);

        let tasks = measure_pipeline(&pipeline, self.limits.default_ratio).await?;
        Ok(ArchitectureOutcome::Measured {
            loading: LoadingStats {
                time_seconds,
                memory_mb,
                model_size_description: description,
            },
            tasks,
        })
    }

    async fn test_llm(&self, option: &LlmOption) -> Result<ArchitectureOutcome> {
        let pipeline = SingleLlmPipeline::new(
            SingleLlmConfig {
                model: option.model.clone(),
                supported_models: vec![option.model.model.clone()],
            },
            self.limits.clone(),
        );

        let (loaded, time_seconds, memory_mb) = measure(pipeline.load()).await;
        loaded?;
        info!("  Loaded in {}s ({}MB)", time_seconds, memory_mb);

        let tasks = measure_pipeline(&pipeline, self.limits.default_ratio).await?;
        Ok(ArchitectureOutcome::Measured {
            loading: LoadingStats {
                time_seconds,
                memory_mb,
                model_size_description: option.size_description.clone(),
            },
            tasks,
        })
    }

    /// Measure both architectures and write `architecture_comparison_<stamp>.json`
    pub async fn run(&self) -> Result<ArchitectureReport> {
        let system_info = SystemInfo::collect();
        info!(
            "System: {} CPUs, {:?}GB total, {:?}GB available",
            system_info.cpu_count, system_info.memory_total_gb, system_info.memory_available_gb
        );

        info!("Testing specialized architecture ({})", self.config.summarizer.model);
        let current_architecture = self.test_specialized().await.unwrap_or_else(|e| {
            error!("Specialized architecture failed: {}", e);
            ArchitectureOutcome::Failed {
                error: e.to_string(),
            }
        });
        log_averages("Specialized", &current_architecture);

        let mut single_llm_architecture = BTreeMap::new();
        for option in &self.config.llm_options {
            info!("Testing {} ({})", option.name, option.size_description);
            let outcome = self.test_llm(option).await.unwrap_or_else(|e| {
                error!("{} failed: {}", option.name, e);
                ArchitectureOutcome::Failed {
                    error: e.to_string(),
                }
            });
            log_averages(&option.name, &outcome);
            single_llm_architecture.insert(option.name.clone(), outcome);
        }

        let report = ArchitectureReport {
            timestamp: Utc::now().to_rfc3339(),
            system_info,
            current_architecture,
            single_llm_architecture,
        };

        let file_name = format!(
            "architecture_comparison_{}.json",
            Local::now().format("%Y%m%d_%H%M%S")
        );
        write_json(&self.report_dir, &file_name, &report)?;
        Ok(report)
    }
}

fn log_averages(name: &str, outcome: &ArchitectureOutcome) {
    if let ArchitectureOutcome::Measured { loading, tasks } = outcome {
        info!("{}: loading {}s, {}MB", name, loading.time_seconds, loading.memory_mb);
        for (task, avg) in task_averages(tasks) {
            info!("  {}: {:.3}s avg", task, avg);
        }
    }
}

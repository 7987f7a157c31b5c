//! The two architectures under comparison
//!
//! `SpecializedPipeline` pairs a seq2seq summarizer/rephraser with rule-based
//! keyword and tone analysis. `SingleLlmPipeline` routes every task through one
//! instruction-tuned model via prompts, and can swap that model at runtime.
//!
//! Pipelines expect validated, trimmed input; see [`crate::tasks`].

use crate::generator::{load_model, LoadedModel};
use crate::tasks::{
    keywords, rephrase, summarize, tone, Rephrasing, Summary, SummaryPlan, ToneReport,
};
use crate::text::word_count;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use texdit_common::config::{LimitsConfig, SingleLlmConfig, SpecializedConfig};
use texdit_common::{ArchitectureMode, ModelEndpointConfig, Result, TexditError, METRICS};
use tracing::{debug, error, info};

/// Reported as `model_used` for the word-list heuristics
pub const RULE_BASED: &str = "rule-based";

/// A task result with how long it took and what produced it
#[derive(Debug, Clone)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
    pub model_used: String,
}

/// The four text tasks shared by both architectures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Summarise,
    Keywords,
    Tone,
    Rephrase,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [
        TaskKind::Summarise,
        TaskKind::Keywords,
        TaskKind::Tone,
        TaskKind::Rephrase,
    ];

    /// Endpoint name under `/api/`
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Summarise => texdit_proto::endpoints::SUMMARISE,
            TaskKind::Keywords => texdit_proto::endpoints::KEYWORDS,
            TaskKind::Tone => texdit_proto::endpoints::TONE,
            TaskKind::Rephrase => texdit_proto::endpoints::REPHRASE,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One architecture's implementation of the text tasks
pub trait TaskPipeline: Send + Sync {
    fn architecture(&self) -> ArchitectureMode;

    /// Name of the primary model, if one is loaded
    fn model_name(&self) -> Option<String>;

    fn model_loaded(&self) -> bool;

    fn summarise<'a>(&'a self, text: &'a str, ratio: f64) -> BoxFuture<'a, Result<Timed<Summary>>>;

    fn keywords<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Timed<Vec<String>>>>;

    fn tone<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Timed<ToneReport>>>;

    fn rephrase<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Timed<Rephrasing>>>;

    /// Replace the active model; returns the new model name
    fn switch_model<'a>(&'a self, model_name: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Run `task` and render its output as a short string (for benchmark previews)
pub async fn run_task(
    pipeline: &dyn TaskPipeline,
    task: TaskKind,
    text: &str,
    ratio: f64,
) -> Result<String> {
    let output = match task {
        TaskKind::Summarise => pipeline.summarise(text, ratio).await?.value.summary,
        TaskKind::Keywords => pipeline.keywords(text).await?.value.join(", "),
        TaskKind::Tone => {
            let report = pipeline.tone(text).await?.value;
            format!("tone={:?}, formality={:?}", report.tone, report.formality).to_lowercase()
        }
        TaskKind::Rephrase => pipeline.rephrase(text).await?.value.rephrased,
    };
    Ok(output)
}

/// Small task-specific models plus heuristics
pub struct SpecializedPipeline {
    summarizer: LoadedModel,
    rephraser: LoadedModel,
    limits: LimitsConfig,
}

impl SpecializedPipeline {
    /// Build from already-loaded models; the summarizer doubles as rephraser when none is given
    pub fn new(summarizer: LoadedModel, rephraser: Option<LoadedModel>, limits: LimitsConfig) -> Self {
        let rephraser = rephraser.unwrap_or_else(|| summarizer.clone());
        METRICS.model.loaded.set(1);
        Self {
            summarizer,
            rephraser,
            limits,
        }
    }

    /// Load the configured models
    pub async fn load(config: &SpecializedConfig, limits: LimitsConfig) -> Result<Self> {
        let summarizer = load_model(&config.summarizer).await?;
        let rephraser = match &config.rephraser {
            Some(rephraser) => Some(load_model(rephraser).await?),
            None => None,
        };
        Ok(Self::new(summarizer, rephraser, limits))
    }

    async fn summarise_inner(&self, text: &str, ratio: f64) -> Result<Timed<Summary>> {
        let start = Instant::now();
        let words = word_count(text);
        let plan = SummaryPlan::specialized(words, ratio, self.limits.specialized_input_tokens);
        debug!(
            "Specialized summary: {} words, target {} ({}..{} tokens)",
            words, plan.target_words, plan.params.min_length, plan.params.max_length
        );

        let prompt = summarize::specialized_prompt(text);
        let summary = self.summarizer.generator.generate(&prompt, &plan.params).await?;

        Ok(Timed {
            value: Summary::new(summary, words),
            elapsed: start.elapsed(),
            model_used: self.summarizer.name.clone(),
        })
    }

    async fn rephrase_inner(&self, text: &str) -> Result<Timed<Rephrasing>> {
        let start = Instant::now();
        let params =
            rephrase::specialized_params(word_count(text), self.limits.specialized_input_tokens);
        let rephrased = self.rephraser.generator.generate(text, &params).await?;

        Ok(Timed {
            value: Rephrasing {
                original: text.to_string(),
                rephrased,
            },
            elapsed: start.elapsed(),
            model_used: self.rephraser.name.clone(),
        })
    }
}

fn rule_based<T>(start: Instant, value: T) -> Timed<T> {
    Timed {
        value,
        elapsed: start.elapsed(),
        model_used: RULE_BASED.to_string(),
    }
}

impl TaskPipeline for SpecializedPipeline {
    fn architecture(&self) -> ArchitectureMode {
        ArchitectureMode::Specialized
    }

    fn model_name(&self) -> Option<String> {
        Some(self.summarizer.name.clone())
    }

    fn model_loaded(&self) -> bool {
        true
    }

    fn summarise<'a>(&'a self, text: &'a str, ratio: f64) -> BoxFuture<'a, Result<Timed<Summary>>> {
        self.summarise_inner(text, ratio).boxed()
    }

    fn keywords<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Timed<Vec<String>>>> {
        let start = Instant::now();
        let result = rule_based(start, keywords::extract_keywords(text));
        async move { Ok(result) }.boxed()
    }

    fn tone<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Timed<ToneReport>>> {
        let start = Instant::now();
        let result = rule_based(start, tone::analyze_tone_rules(text));
        async move { Ok(result) }.boxed()
    }

    fn rephrase<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Timed<Rephrasing>>> {
        self.rephrase_inner(text).boxed()
    }

    fn switch_model<'a>(&'a self, _model_name: &'a str) -> BoxFuture<'a, Result<String>> {
        async move {
            Err(TexditError::not_found(
                "Model switching is only available on the single LLM server",
            ))
        }
        .boxed()
    }
}

/// Loads a model for an endpoint config
pub type ModelLoader =
    Arc<dyn Fn(ModelEndpointConfig) -> BoxFuture<'static, Result<LoadedModel>> + Send + Sync>;

fn http_loader() -> ModelLoader {
    Arc::new(|config: ModelEndpointConfig| async move { load_model(&config).await }.boxed())
}

/// One general-purpose model for every task
pub struct SingleLlmPipeline {
    slot: RwLock<Option<LoadedModel>>,
    /// Name of the most recently requested model, loaded or not
    selected: RwLock<String>,
    /// Held for the whole of a switch so overlapping switches run one at a time
    switching: tokio::sync::Mutex<()>,
    config: SingleLlmConfig,
    limits: LimitsConfig,
    loader: ModelLoader,
}

impl SingleLlmPipeline {
    /// Create with an empty slot; call `load` to fill it
    pub fn new(config: SingleLlmConfig, limits: LimitsConfig) -> Self {
        Self::with_loader(config, limits, http_loader())
    }

    pub fn with_loader(config: SingleLlmConfig, limits: LimitsConfig, loader: ModelLoader) -> Self {
        METRICS.model.loaded.set(0);
        Self {
            slot: RwLock::new(None),
            selected: RwLock::new(config.model.model.clone()),
            switching: tokio::sync::Mutex::new(()),
            config,
            limits,
            loader,
        }
    }

    /// Load the configured startup model
    pub async fn load(&self) -> Result<()> {
        info!("Loading single LLM: {}", self.config.model.model);
        let model = (self.loader)(self.config.model.clone()).await?;
        self.install(model);
        Ok(())
    }

    fn install(&self, model: LoadedModel) {
        *self.slot.write() = Some(model);
        METRICS.model.loaded.set(1);
    }

    fn current(&self) -> Result<LoadedModel> {
        self.slot
            .read()
            .clone()
            .ok_or_else(|| TexditError::model("Model not loaded"))
    }

    async fn summarise_inner(&self, text: &str, ratio: f64) -> Result<Timed<Summary>> {
        let model = self.current()?;
        let start = Instant::now();
        let words = word_count(text);
        let plan = SummaryPlan::single_llm(words, ratio, self.limits.single_llm_input_tokens);

        let prompt = summarize::single_llm_prompt(text, plan.target_words);
        let response = model.generator.generate(&prompt, &plan.params).await?;
        let summary = summarize::clean_single_llm_summary(&response);

        Ok(Timed {
            value: Summary::new(summary, words),
            elapsed: start.elapsed(),
            model_used: model.name,
        })
    }

    async fn keywords_inner(&self, text: &str) -> Result<Timed<Vec<String>>> {
        let model = self.current()?;
        let start = Instant::now();
        let params = crate::tasks::single_llm_params(100, 5, self.limits.single_llm_input_tokens);

        let response = model
            .generator
            .generate(&keywords::keywords_prompt(text), &params)
            .await?;

        Ok(Timed {
            value: keywords::parse_keyword_response(&response),
            elapsed: start.elapsed(),
            model_used: model.name,
        })
    }

    async fn tone_inner(&self, text: &str) -> Result<Timed<ToneReport>> {
        let model = self.current()?;
        let start = Instant::now();
        let params = crate::tasks::single_llm_params(50, 5, self.limits.single_llm_input_tokens);

        let response = model.generator.generate(&tone::tone_prompt(text), &params).await?;

        Ok(Timed {
            value: tone::parse_tone_response(&response),
            elapsed: start.elapsed(),
            model_used: model.name,
        })
    }

    async fn rephrase_inner(&self, text: &str) -> Result<Timed<Rephrasing>> {
        let model = self.current()?;
        let start = Instant::now();
        let params =
            rephrase::single_llm_params_for(word_count(text), self.limits.single_llm_input_tokens);

        let response = model
            .generator
            .generate(&rephrase::rephrase_prompt(text), &params)
            .await?;

        Ok(Timed {
            value: Rephrasing {
                original: text.to_string(),
                rephrased: rephrase::clean_rephrase(&response),
            },
            elapsed: start.elapsed(),
            model_used: model.name,
        })
    }

    async fn switch_inner(&self, model_name: &str) -> Result<String> {
        if !self.config.supported_models.iter().any(|m| m == model_name) {
            let supported = self
                .config
                .supported_models
                .iter()
                .map(|m| format!("'{}'", m))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(TexditError::invalid_input(format!(
                "Model not supported. Supported models: [{}]",
                supported
            )));
        }

        let _switching = self.switching.lock().await;

        // Drop the current model before loading the next one
        *self.selected.write() = model_name.to_string();
        *self.slot.write() = None;
        METRICS.model.loaded.set(0);

        let mut endpoint = self.config.model.clone();
        endpoint.model = model_name.to_string();

        match (self.loader)(endpoint).await {
            Ok(model) => {
                self.install(model);
                METRICS.model.switches_total.inc();
                info!("Switched single LLM to {}", model_name);
                Ok(model_name.to_string())
            }
            Err(e) => {
                error!("Failed to load single LLM {}: {}", model_name, e);
                Err(TexditError::model("Failed to load new model"))
            }
        }
    }
}

impl TaskPipeline for SingleLlmPipeline {
    fn architecture(&self) -> ArchitectureMode {
        ArchitectureMode::SingleLlm
    }

    fn model_name(&self) -> Option<String> {
        Some(self.selected.read().clone())
    }

    fn model_loaded(&self) -> bool {
        self.slot.read().is_some()
    }

    fn summarise<'a>(&'a self, text: &'a str, ratio: f64) -> BoxFuture<'a, Result<Timed<Summary>>> {
        self.summarise_inner(text, ratio).boxed()
    }

    fn keywords<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Timed<Vec<String>>>> {
        self.keywords_inner(text).boxed()
    }

    fn tone<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Timed<ToneReport>>> {
        self.tone_inner(text).boxed()
    }

    fn rephrase<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Timed<Rephrasing>>> {
        self.rephrase_inner(text).boxed()
    }

    fn switch_model<'a>(&'a self, model_name: &'a str) -> BoxFuture<'a, Result<String>> {
        self.switch_inner(model_name).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;
    use texdit_common::ModelKind;
    use texdit_proto::{Formality, Tone};

    const TEXT: &str = "Artificial intelligence has revolutionized many aspects of modern life, \
                        from healthcare to transportation. However, new challenges remain.";

    fn model(generator: ScriptedGenerator) -> (Arc<ScriptedGenerator>, LoadedModel) {
        let generator = Arc::new(generator);
        let loaded = LoadedModel::from_generator(generator.clone());
        (generator, loaded)
    }

    fn single_llm_config() -> SingleLlmConfig {
        SingleLlmConfig {
            model: ModelEndpointConfig::new(
                "http://127.0.0.1:1/v1",
                "google/flan-t5-large",
                ModelKind::Seq2Seq,
            ),
            supported_models: vec![
                "google/flan-t5-base".to_string(),
                "google/flan-t5-large".to_string(),
            ],
        }
    }

    fn scripted_loader(reply: &'static str) -> ModelLoader {
        Arc::new(move |config: ModelEndpointConfig| {
            async move {
                if config.model.contains("broken") {
                    return Err(TexditError::unavailable("backend down"));
                }
                let generator = Arc::new(ScriptedGenerator::replying(&config.model, reply));
                Ok(LoadedModel::from_generator(generator))
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_specialized_summarise_uses_t5_prefix() {
        let (generator, summarizer) = model(ScriptedGenerator::replying("t5-small", "AI changed life."));
        let pipeline = SpecializedPipeline::new(summarizer, None, LimitsConfig::default());

        let result = pipeline.summarise(TEXT, 0.25).await.unwrap();
        assert_eq!(result.value.summary, "AI changed life.");
        assert_eq!(result.value.original_length, 17);
        assert_eq!(result.value.summary_length, 3);
        assert_eq!(result.model_used, "t5-small");

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.starts_with("summarize: Artificial"));
        assert_eq!(calls[0].1.num_beams, 4);
        assert_eq!(calls[0].1.max_length, 30);
    }

    #[tokio::test]
    async fn test_specialized_rules_and_rephraser() {
        let (_, summarizer) = model(ScriptedGenerator::replying("t5-small", "unused"));
        let (rephraser_gen, rephraser) =
            model(ScriptedGenerator::replying("pegasus", "AI has transformed modern living."));
        let pipeline =
            SpecializedPipeline::new(summarizer, Some(rephraser), LimitsConfig::default());

        let keywords = pipeline.keywords(TEXT).await.unwrap();
        assert_eq!(keywords.model_used, RULE_BASED);
        assert!(keywords.value.contains(&"artificial".to_string()));

        let tone = pipeline.tone(TEXT).await.unwrap();
        assert_eq!(tone.value.tone, Tone::Neutral);
        assert_eq!(tone.value.formality, Formality::Informal);

        let rephrased = pipeline.rephrase(TEXT).await.unwrap();
        assert_eq!(rephrased.value.original, TEXT);
        assert_eq!(rephrased.value.rephrased, "AI has transformed modern living.");
        assert_eq!(rephrased.model_used, "pegasus");
        assert!(rephraser_gen.calls()[0].1.do_sample);
    }

    #[tokio::test]
    async fn test_specialized_rejects_switch() {
        let (_, summarizer) = model(ScriptedGenerator::replying("t5-small", "x"));
        let pipeline = SpecializedPipeline::new(summarizer, None, LimitsConfig::default());
        let err = pipeline.switch_model("google/flan-t5-base").await.unwrap_err();
        assert!(matches!(err, TexditError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_single_llm_not_loaded() {
        let pipeline = SingleLlmPipeline::with_loader(
            single_llm_config(),
            LimitsConfig::default(),
            scripted_loader("x"),
        );
        assert!(!pipeline.model_loaded());
        assert!(pipeline.model_name().is_none());

        let err = pipeline.keywords(TEXT).await.unwrap_err();
        assert_eq!(err.to_string(), "Model not loaded");
    }

    #[tokio::test]
    async fn test_single_llm_tasks_parse_responses() {
        let pipeline = SingleLlmPipeline::with_loader(
            single_llm_config(),
            LimitsConfig::default(),
            scripted_loader("Keywords: ai, healthcare Summary: Tone: positive, formal"),
        );
        pipeline.load().await.unwrap();
        assert_eq!(pipeline.model_name().as_deref(), Some("google/flan-t5-large"));

        let summary = pipeline.summarise(TEXT, 0.25).await.unwrap();
        assert_eq!(summary.value.summary, "Tone: positive, formal");
        assert_eq!(summary.model_used, "google/flan-t5-large");

        let tone = pipeline.tone(TEXT).await.unwrap();
        assert_eq!(tone.value.tone, Tone::Positive);
        assert_eq!(tone.value.formality, Formality::Formal);
        assert!(tone.value.raw_response.is_some());
    }

    #[tokio::test]
    async fn test_single_llm_switch_model() {
        let pipeline = SingleLlmPipeline::with_loader(
            single_llm_config(),
            LimitsConfig::default(),
            scripted_loader("ok"),
        );
        pipeline.load().await.unwrap();

        let switched = pipeline.switch_model("google/flan-t5-base").await.unwrap();
        assert_eq!(switched, "google/flan-t5-base");
        assert_eq!(pipeline.model_name().as_deref(), Some("google/flan-t5-base"));

        let err = pipeline.switch_model("gpt-4").await.unwrap_err();
        assert!(matches!(err, TexditError::InvalidInput(_)));
        assert!(err.to_string().starts_with("Model not supported. Supported models: ['google/flan-t5-base'"));
        // rejected names leave the current model in place
        assert!(pipeline.model_loaded());
    }

    #[tokio::test]
    async fn test_single_llm_failed_switch_leaves_slot_empty() {
        let mut config = single_llm_config();
        config.supported_models.push("broken-model".to_string());
        let pipeline =
            SingleLlmPipeline::with_loader(config, LimitsConfig::default(), scripted_loader("ok"));
        pipeline.load().await.unwrap();

        let err = pipeline.switch_model("broken-model").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to load new model");
        assert!(!pipeline.model_loaded());
        // the requested name is still reported
        assert_eq!(pipeline.model_name().as_deref(), Some("broken-model"));
    }

    #[tokio::test]
    async fn test_overlapping_switches_settle_on_last_success() {
        let slow_then_fast: ModelLoader = Arc::new(|config: ModelEndpointConfig| {
            async move {
                if config.model.ends_with("base") {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
                let generator = Arc::new(ScriptedGenerator::replying(&config.model, "ok"));
                Ok(LoadedModel::from_generator(generator))
            }
            .boxed()
        });
        let pipeline = Arc::new(SingleLlmPipeline::with_loader(
            single_llm_config(),
            LimitsConfig::default(),
            slow_then_fast,
        ));

        let first = {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.switch_model("google/flan-t5-base").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = pipeline.switch_model("google/flan-t5-large").await.unwrap();
        first.await.unwrap().unwrap();

        // the second switch waited for the first, so its model is the one installed
        assert_eq!(second, "google/flan-t5-large");
        let model = pipeline.current().unwrap();
        assert_eq!(model.name, "google/flan-t5-large");
        assert_eq!(pipeline.model_name().as_deref(), Some("google/flan-t5-large"));
    }

    #[tokio::test]
    async fn test_run_task_renders_output() {
        let (_, summarizer) = model(ScriptedGenerator::replying("t5-small", "short"));
        let pipeline = SpecializedPipeline::new(summarizer, None, LimitsConfig::default());

        let out = run_task(&pipeline, TaskKind::Tone, "great day", 0.25).await.unwrap();
        assert_eq!(out, "tone=positive, formality=informal");
        let out = run_task(&pipeline, TaskKind::Summarise, TEXT, 0.25).await.unwrap();
        assert_eq!(out, "short");
    }
}

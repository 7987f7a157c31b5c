//! Model-invocation adapter
//!
//! Text generation is delegated to an OpenAI-compatible inference backend
//! (vLLM, llama.cpp server, TGI in completions mode). This module turns the
//! task-level decoding parameters into a completions request and extracts the
//! generated text.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use texdit_common::{ModelEndpointConfig, ModelKind, Result, TexditError, METRICS};
use tracing::{debug, info, warn};

/// Decoding parameters forwarded to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Maximum generated tokens
    pub max_length: usize,

    /// Minimum generated tokens
    pub min_length: usize,

    /// Beam width; 1 disables beam search
    pub num_beams: usize,

    /// Exponential length penalty applied to beam scores
    pub length_penalty: f32,

    /// Stop beams as soon as `num_beams` finished candidates exist
    pub early_stopping: bool,

    /// Forbid repeating n-grams of this size
    pub no_repeat_ngram_size: Option<usize>,

    /// Sample instead of decoding greedily / by beam
    pub do_sample: bool,

    /// Sampling temperature, only meaningful with `do_sample`
    pub temperature: Option<f32>,

    /// Prompt truncation, in tokens
    pub max_input_tokens: usize,
}

impl GenerationParams {
    /// Beam-search decoding with early stopping
    pub fn beam(max_length: usize, min_length: usize, num_beams: usize) -> Self {
        Self {
            max_length,
            min_length: min_length.min(max_length),
            num_beams,
            length_penalty: 1.0,
            early_stopping: true,
            no_repeat_ngram_size: None,
            do_sample: false,
            temperature: None,
            max_input_tokens: 512,
        }
    }

    pub fn with_length_penalty(mut self, length_penalty: f32) -> Self {
        self.length_penalty = length_penalty;
        self
    }

    pub fn with_no_repeat_ngram_size(mut self, size: usize) -> Self {
        self.no_repeat_ngram_size = Some(size);
        self
    }

    pub fn with_sampling(mut self, temperature: f32) -> Self {
        self.do_sample = true;
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_input_tokens(mut self, max_input_tokens: usize) -> Self {
        self.max_input_tokens = max_input_tokens;
        self
    }
}

/// Something that turns a prompt into text
pub trait TextGenerator: Send + Sync {
    /// Model identifier reported in responses
    fn model_name(&self) -> &str;

    /// Model family
    fn kind(&self) -> ModelKind;

    /// Generate a completion for `prompt`
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        params: &'a GenerationParams,
    ) -> BoxFuture<'a, Result<String>>;
}

/// Completions response, reduced to the fields we read
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: Option<String>,
}

/// Generator backed by an OpenAI-compatible `/completions` endpoint
pub struct HttpGenerator {
    config: ModelEndpointConfig,
    client: reqwest::Client,
}

impl HttpGenerator {
    /// Create a new generator; no network traffic happens until `probe` or `generate`
    pub fn new(config: ModelEndpointConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TexditError::model(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Check that the backend answers `GET /models`
    pub async fn probe(&self) -> Result<()> {
        let url = self.url("models");
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| TexditError::unavailable(format!("Failed to connect to {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TexditError::backend(format!("Endpoint error {}: {}", status, text)));
        }

        Ok(())
    }

    fn completion_body(&self, prompt: &str, params: &GenerationParams) -> serde_json::Value {
        let temperature = if params.do_sample {
            params.temperature.unwrap_or(1.0)
        } else {
            0.0
        };

        let mut body = serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "max_tokens": params.max_length,
            "min_tokens": params.min_length,
            "best_of": params.num_beams,
            "use_beam_search": params.num_beams > 1 && !params.do_sample,
            "length_penalty": params.length_penalty,
            "early_stopping": params.early_stopping,
            "temperature": temperature,
            "truncate_prompt_tokens": params.max_input_tokens,
        });

        if let Some(size) = params.no_repeat_ngram_size {
            body["no_repeat_ngram_size"] = serde_json::json!(size);
        }

        body
    }

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let url = self.url("completions");
        let body = self.completion_body(prompt, params);

        debug!("Completion request to {} (model={})", url, self.config.model);
        let start = Instant::now();

        let response = self.authorize(self.client.post(&url).json(&body)).send().await?;
        let status = response.status();
        let elapsed = start.elapsed();
        METRICS.model.generate_duration.observe(elapsed.as_secs_f64());

        debug!(
            "Completion response: status={}, elapsed={:.2}s",
            status,
            elapsed.as_secs_f64()
        );

        if !status.is_success() {
            let error = response.text().await.unwrap_or_default();
            warn!("Backend error from {}: {}", url, error);
            return Err(TexditError::backend(format!("API error {}: {}", status, error)));
        }

        let completion: CompletionResponse = response.json().await?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.text)
            .ok_or_else(|| TexditError::backend("Backend response has no completion text"))?;

        Ok(strip_prompt_echo(self.config.kind, prompt, &text))
    }
}

impl TextGenerator for HttpGenerator {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn kind(&self) -> ModelKind {
        self.config.kind
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        params: &'a GenerationParams,
    ) -> BoxFuture<'a, Result<String>> {
        self.complete(prompt, params).boxed()
    }
}

/// Decoder-only models may return the prompt followed by the continuation
fn strip_prompt_echo(kind: ModelKind, prompt: &str, text: &str) -> String {
    match kind {
        ModelKind::Causal => text.strip_prefix(prompt).unwrap_or(text).trim().to_string(),
        ModelKind::Seq2Seq => text.trim().to_string(),
    }
}

/// A generator that has been constructed and probed
#[derive(Clone)]
pub struct LoadedModel {
    pub generator: Arc<dyn TextGenerator>,
    pub name: String,
    pub load_time: Duration,
}

impl LoadedModel {
    /// Wrap an already-usable generator
    pub fn from_generator(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            name: generator.model_name().to_string(),
            generator,
            load_time: Duration::ZERO,
        }
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("name", &self.name)
            .field("load_time", &self.load_time)
            .finish()
    }
}

/// Build a generator for `config` and make sure the backend serves it
pub async fn load_model(config: &ModelEndpointConfig) -> Result<LoadedModel> {
    info!("Loading model {} from {}", config.model, config.endpoint);
    let start = Instant::now();

    let generator = HttpGenerator::new(config.clone())?;
    generator.probe().await?;

    let load_time = start.elapsed();
    METRICS.model.load_duration.observe(load_time.as_secs_f64());
    info!(
        "Model {} loaded successfully in {:.2} seconds",
        config.model,
        load_time.as_secs_f64()
    );

    Ok(LoadedModel {
        name: config.model.clone(),
        generator: Arc::new(generator),
        load_time,
    })
}

//! Route handlers
//!
//! Every task handler validates its body, runs the pipeline and wraps the result
//! in the wire type. Failures become `{"error": ...}` responses via
//! `TexditError`'s `IntoResponse`.

use crate::{api_routes, AppState};
use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::{Duration, Instant};
use texdit_common::{ArchitectureMode, InFlight, LatencyTimer, Result, TexditError, METRICS};
use texdit_engine::tasks::{self, search::validate_search_request, validate_summary_request};
use texdit_engine::text::round_to;
use texdit_proto::{
    HealthResponse, HomeResponse, KeywordsResponse, Performance, RephraseResponse, SearchRequest,
    SearchResponse, SummariseRequest, SummariseResponse, SwitchModelRequest, SwitchModelResponse,
    TextRequest, ToneAnalysis, ToneResponse,
};
use tracing::error;

/// JSON body extractor whose rejection is a 400 in the API's error format
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = TexditError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let route = req.uri().path().to_string();
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                let err = TexditError::invalid_input(rejection.body_text());
                METRICS
                    .requests
                    .requests_total
                    .with_label_values(&[route.as_str()])
                    .inc();
                record_failure(&route, &err);
                Err(err)
            }
        }
    }
}

fn performance(elapsed: Duration) -> Option<Performance> {
    Some(Performance {
        total_time: round_to(elapsed.as_secs_f64(), 2),
    })
}

fn record_failure(route: &str, e: &TexditError) {
    METRICS
        .requests
        .requests_failed
        .with_label_values(&[route])
        .inc();
    error!("Error occurred in {}: {}", route, e);
}

fn record_outcome<T>(route: &str, result: &Result<T>) {
    if let Err(e) = result {
        record_failure(route, e);
    }
}

/// Count, time and log one request
async fn instrumented<T, F>(route: &'static str, task: F) -> Result<Json<T>>
where
    F: Future<Output = Result<T>>,
{
    let requests = &METRICS.requests;
    requests.requests_total.with_label_values(&[route]).inc();
    let _in_flight = InFlight::enter(&requests.active_requests);

    let start = Instant::now();
    let result = task.await;
    requests
        .request_duration
        .with_label_values(&[route])
        .observe(start.elapsed().as_secs_f64());

    record_outcome(route, &result);
    result.map(Json)
}

/// `instrumented` for handlers that never leave the thread
fn instrumented_sync<T>(route: &'static str, task: impl FnOnce() -> Result<T>) -> Result<Json<T>> {
    let requests = &METRICS.requests;
    requests.requests_total.with_label_values(&[route]).inc();

    let histogram = requests.request_duration.with_label_values(&[route]);
    let result = LatencyTimer::observe(&histogram, task);

    record_outcome(route, &result);
    result.map(Json)
}

pub async fn home(State(state): State<AppState>) -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: state.pipeline.model_loaded(),
        endpoints: api_routes(),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let message = match state.mode() {
        ArchitectureMode::SingleLlm => "Single LLM server is healthy",
        _ => "Specialized server is healthy",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        message: message.to_string(),
        model_loaded: state.pipeline.model_loaded(),
        model_name: state.pipeline.model_name(),
    })
}

pub async fn search(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    instrumented_sync("/api/search", || {
        let (query, choices, limit) = validate_search_request(
            req.query.as_deref(),
            req.choices.as_deref(),
            req.limit,
            &state.limits,
        )?;

        let results = tasks::extract(query, choices, limit)
            .into_iter()
            .map(|m| m.choice)
            .collect();
        Ok(SearchResponse { results })
    })
}

pub async fn summarise(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SummariseRequest>,
) -> Result<Json<SummariseResponse>> {
    instrumented("/api/summarise", async {
        let (text, ratio) = validate_summary_request(req.text.as_deref(), req.ratio.as_ref(), &state.limits)?;
        let result = state.pipeline.summarise(&text, ratio).await?;
        let summary = result.value;

        Ok(SummariseResponse {
            summary: summary.summary,
            original_length: summary.original_length,
            summary_length: summary.summary_length,
            compression_ratio: summary.compression_ratio,
            performance: performance(result.elapsed),
            model_used: Some(result.model_used),
        })
    })
    .await
}

pub async fn keywords(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TextRequest>,
) -> Result<Json<KeywordsResponse>> {
    instrumented("/api/keywords", async {
        let text = tasks::validate_text(req.text.as_deref(), &state.limits)?;
        let result = state.pipeline.keywords(&text).await?;

        Ok(KeywordsResponse {
            keywords: result.value,
            performance: performance(result.elapsed),
            model_used: Some(result.model_used),
        })
    })
    .await
}

pub async fn tone(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TextRequest>,
) -> Result<Json<ToneResponse>> {
    instrumented("/api/tone", async {
        let text = tasks::validate_text(req.text.as_deref(), &state.limits)?;
        let result = state.pipeline.tone(&text).await?;
        let report = result.value;

        Ok(ToneResponse {
            tone: report.tone,
            formality: report.formality,
            analysis: report.raw_response.map(|raw_response| ToneAnalysis {
                raw_response,
                confidence: "medium".to_string(),
            }),
            performance: performance(result.elapsed),
            model_used: Some(result.model_used),
        })
    })
    .await
}

pub async fn rephrase(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TextRequest>,
) -> Result<Json<RephraseResponse>> {
    instrumented("/api/rephrase", async {
        let text = tasks::validate_text(req.text.as_deref(), &state.limits)?;
        let result = state.pipeline.rephrase(&text).await?;

        Ok(RephraseResponse {
            original: result.value.original,
            rephrased: result.value.rephrased,
            performance: performance(result.elapsed),
            model_used: Some(result.model_used),
        })
    })
    .await
}

pub async fn switch_model(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SwitchModelRequest>,
) -> Result<Json<SwitchModelResponse>> {
    instrumented("/api/switch_model", async {
        let model_name = req
            .model_name
            .ok_or_else(|| TexditError::invalid_input("Missing required field: 'model_name'"))?;

        let model_name = state.pipeline.switch_model(&model_name).await?;
        Ok(SwitchModelResponse {
            message: format!("Successfully switched to {}", model_name),
            model_name,
        })
    })
    .await
}

/// Prometheus text exposition
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.gather(),
    )
}

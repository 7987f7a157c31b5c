//! Test doubles for the inference backend
//!
//! `ScriptedGenerator` replaces a model in-process; `spawn_mock_backend` serves a
//! minimal OpenAI-compatible completions API on an ephemeral port.

use crate::generator::{GenerationParams, TextGenerator};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::Arc;
use texdit_common::{ModelKind, Result, TexditError};

type Reply = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// In-process generator with a scripted reply
pub struct ScriptedGenerator {
    name: String,
    kind: ModelKind,
    reply: Reply,
    calls: Mutex<Vec<(String, GenerationParams)>>,
}

impl ScriptedGenerator {
    pub fn new(
        name: &str,
        reply: impl Fn(&str) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind: ModelKind::Seq2Seq,
            reply: Box::new(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answers `reply`
    pub fn replying(name: &str, reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(name, move |_| Ok(reply.clone()))
    }

    /// Always fails with a backend error
    pub fn failing(name: &str, message: &str) -> Self {
        let message = message.to_string();
        Self::new(name, move |_| Err(TexditError::backend(message.clone())))
    }

    /// Prompts and parameters seen so far
    pub fn calls(&self) -> Vec<(String, GenerationParams)> {
        self.calls.lock().clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        params: &'a GenerationParams,
    ) -> BoxFuture<'a, Result<String>> {
        self.calls.lock().push((prompt.to_string(), params.clone()));
        let result = (self.reply)(prompt);
        async move { result }.boxed()
    }
}

/// Handle to a running mock backend
pub struct MockBackend {
    /// Base URL without the `/v1` suffix
    pub base_url: String,
    last_body: Arc<Mutex<Option<serde_json::Value>>>,
}

impl MockBackend {
    /// Body of the most recent completions request
    pub fn last_body(&self) -> Option<serde_json::Value> {
        self.last_body.lock().clone()
    }
}

/// Serve `/v1/models` and `/v1/completions`.
///
/// Completions echo the prompt as `echo: <prompt>`; prompts containing `FAIL`
/// get a 500.
pub async fn spawn_mock_backend() -> MockBackend {
    let last_body = Arc::new(Mutex::new(None));

    let app = Router::new()
        .route("/v1/models", get(models))
        .route("/v1/completions", post(completions))
        .with_state(last_body.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{}", addr),
        last_body,
    }
}

async fn models() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "object": "list", "data": [] }))
}

async fn completions(
    State(last_body): State<Arc<Mutex<Option<serde_json::Value>>>>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    *last_body.lock() = Some(body);

    if prompt.contains("FAIL") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "boom" })),
        );
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "choices": [{ "index": 0, "text": format!("  echo: {}  ", prompt) }]
        })),
    )
}

//! TexDit Server
//!
//! HTTP API exposing the text tasks of one architecture (specialized models or
//! a single LLM). Both architectures serve the same routes so the benchmark
//! clients can compare them request for request.

pub mod handlers;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use texdit_common::config::LimitsConfig;
use texdit_common::{ArchitectureMode, Result, TexditError};
use texdit_engine::TaskPipeline;
use texdit_proto::endpoints;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Architecture serving the tasks
    pub pipeline: Arc<dyn TaskPipeline>,

    /// Input limits and request defaults
    pub limits: LimitsConfig,

    /// Serve `/metrics`
    pub metrics_enabled: bool,
}

impl AppState {
    pub fn new(pipeline: Arc<dyn TaskPipeline>, limits: LimitsConfig) -> Self {
        Self {
            pipeline,
            limits,
            metrics_enabled: true,
        }
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn mode(&self) -> ArchitectureMode {
        self.pipeline.architecture()
    }
}

/// Paths of the task routes, as listed by `GET /`
pub fn api_routes() -> Vec<String> {
    [
        endpoints::SEARCH,
        endpoints::SUMMARISE,
        endpoints::KEYWORDS,
        endpoints::TONE,
        endpoints::REPHRASE,
        endpoints::SWITCH_MODEL,
    ]
    .iter()
    .map(|name| format!("/api/{}", name))
    .collect()
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let mut router = Router::new()
        // Service info
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        // Tasks
        .route("/api/search", post(handlers::search))
        .route("/api/summarise", post(handlers::summarise))
        .route("/api/keywords", post(handlers::keywords))
        .route("/api/tone", post(handlers::tone))
        .route("/api/rephrase", post(handlers::rephrase))
        .route("/api/switch_model", post(handlers::switch_model));

    if state.metrics_enabled {
        router = router.route("/metrics", get(handlers::metrics));
    }

    router
        .with_state(state)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve until Ctrl-C
pub async fn start_server(state: AppState, bind_address: &str, port: u16) -> Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", bind_address, port)
        .parse()
        .map_err(|e| TexditError::config(format!("Invalid address: {}", e)))?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| TexditError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TexditError::internal(format!("Server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Received shutdown signal");
    }
}

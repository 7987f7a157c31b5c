//! TexDit Server - Main Entry Point
//!
//! Serves one architecture. The mode comes from the config file, `TEXDIT__MODE`,
//! or `TEXDIT_MODE` (in that order), defaulting to `specialized`.

use std::path::PathBuf;
use std::sync::Arc;
use texdit_common::{ArchitectureMode, TexditConfig, TexditError};
use texdit_engine::{SingleLlmPipeline, SpecializedPipeline, TaskPipeline};
use texdit_server::{start_server, AppState};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(level: &str, structured: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "texdit_server={level},texdit_engine={level},tower_http={level}",
            level = level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    if structured {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::var("TEXDIT_CONFIG").ok().map(PathBuf::from);
    let fallback_mode = match std::env::var("TEXDIT_MODE") {
        Ok(mode) => mode.parse()?,
        Err(_) => ArchitectureMode::Specialized,
    };

    let config = TexditConfig::load(config_path.as_deref(), fallback_mode)?;

    // Initialize logging
    let observability = config.observability();
    init_tracing(&observability.log_level, observability.structured_logging);

    info!(
        "Starting TexDit {} server: bind={}:{}",
        config.mode, config.bind_address, config.port
    );

    let pipeline: Arc<dyn TaskPipeline> = match config.mode {
        ArchitectureMode::Specialized => {
            let specialized = config
                .specialized
                .as_ref()
                .ok_or_else(|| TexditError::config("Specialized config not found"))?;
            Arc::new(SpecializedPipeline::load(specialized, config.limits.clone()).await?)
        }
        ArchitectureMode::SingleLlm => {
            let single = config
                .single_llm
                .clone()
                .ok_or_else(|| TexditError::config("Single LLM config not found"))?;
            let pipeline = SingleLlmPipeline::new(single, config.limits.clone());
            // Keep serving without a model; tasks answer "Model not loaded"
            if let Err(e) = pipeline.load().await {
                error!("Failed to load single LLM: {}", e);
            }
            Arc::new(pipeline)
        }
        ArchitectureMode::Bench => {
            anyhow::bail!("bench mode is served by the texdit-bench binaries, not texdit-server");
        }
    };

    let state =
        AppState::new(pipeline, config.limits.clone()).with_metrics(observability.enable_metrics);
    start_server(state, &config.bind_address, config.port).await?;
    Ok(())
}

//! TexDit Bench
//!
//! Tooling that compares the specialized-models and single-LLM architectures:
//! HTTP timing against running servers, in-process load and memory
//! measurements, packaging-size analysis, and a manager that runs both servers.

pub mod architecture;
pub mod client;
pub mod corpus;
pub mod manager;
pub mod monitor;
pub mod packaging;
pub mod quick;
pub mod report;

#[cfg(test)]
mod test_support;

pub use architecture::ArchitectureTest;
pub use client::{EndpointResult, ServerClient};
pub use manager::ServerManager;
pub use monitor::{HealthMonitor, ServerStatus};
pub use packaging::PackagingAnalysis;
pub use quick::QuickComparison;

use std::path::PathBuf;
use texdit_common::{ArchitectureMode, Result, TexditConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for a bench binary
pub fn init_tracing(binary: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info,texdit_bench=info,texdit_engine=info", binary).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Bench configuration from `TEXDIT_CONFIG` (if set) over the built-in defaults
pub fn load_config() -> Result<TexditConfig> {
    let path = std::env::var("TEXDIT_CONFIG").ok().map(PathBuf::from);
    TexditConfig::load(path.as_deref(), ArchitectureMode::Bench)
}

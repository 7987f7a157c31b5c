//! TexDit common library
//!
//! This crate contains shared code used across TexDit components.

pub mod config;
pub mod error;
pub mod metrics;

// Re-export commonly used types
pub use config::{ArchitectureMode, ModelEndpointConfig, ModelKind, TexditConfig};
pub use error::{Result, TexditError};
pub use metrics::{InFlight, LatencyTimer, MetricsRegistry, METRICS};

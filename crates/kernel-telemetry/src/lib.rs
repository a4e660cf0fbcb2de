//! # Kernel Telemetry
//!
//! Structured logging and Prometheus metrics for the quantum security
//! kernel.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kernel_telemetry::{init_logging, KernelMetrics, TelemetryConfig};
//!
//! init_logging(&TelemetryConfig::from_env())?;
//! let metrics = KernelMetrics::new()?;
//! metrics.tokens_issued.inc();
//! println!("{}", metrics.encode()?);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QK_SERVICE_NAME` | `quantum-kernel` | Service name in logs |
//! | `QK_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `QK_JSON_LOGS` | `false` | JSON log lines |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::KernelMetrics;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

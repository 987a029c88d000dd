//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config (`LOG_LEVEL`), overridable by `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, compact text for development
//! - Record payloads (access, error, webhook) are JSON in both formats

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Target for per-request access records.
pub const ACCESS_LOG_TARGET: &str = "access_log";

/// Target for unhandled failure records.
pub const ERROR_LOG_TARGET: &str = "access_log::error";

/// Target for alerting webhook audit lines.
pub const ALERT_LOG_TARGET: &str = "alert_recv";

/// Build the filter for the configured level.
///
/// `RUST_LOG` wins when set, so operators can still narrow or widen targets.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_lowercase()))
}

/// Install the global subscriber.
pub fn init_logging(
    config: &ObservabilityConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let registry = tracing_subscriber::registry().with(build_filter(&config.log_level));

    match config.log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().flatten_event(true))
            .try_init(),
        LogFormat::Text => registry.with(fmt::layer().compact()).try_init(),
    }
}

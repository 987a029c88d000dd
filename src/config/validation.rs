//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, buckets increasing)
//! - Check the bind address and scrape endpoint are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

const LOG_LEVELS: [&str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];

/// Paths already taken by the built-in routes.
const RESERVED_PATHS: [&str; 4] = ["/", "/health", "/fail", "/alertmanager"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.environment must not be empty")]
    EmptyEnvironment,

    #[error("observability.log_level `{0}` is not one of TRACE, DEBUG, INFO, WARN, ERROR")]
    UnknownLogLevel(String),

    #[error("metrics.endpoint `{0}` must start with '/'")]
    InvalidEndpoint(String),

    #[error("metrics.endpoint `{0}` conflicts with a built-in route")]
    EndpointConflict(String),

    #[error("metrics.endpoint `{0}` must be a literal path without captures or wildcards")]
    EndpointPattern(String),

    #[error("metrics.duration_buckets must be non-empty and strictly increasing")]
    InvalidBuckets,

    #[error("metrics.upkeep_interval_secs must be greater than zero")]
    ZeroUpkeepInterval,

    #[error("limits.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("limits.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("limits.webhook_max_body_size must be greater than zero")]
    ZeroWebhookBodyLimit,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let observability = &config.observability;
    if observability.environment.trim().is_empty() {
        errors.push(ValidationError::EmptyEnvironment);
    }
    if !LOG_LEVELS.contains(&observability.log_level.to_uppercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(observability.log_level.clone()));
    }

    let metrics = &config.metrics;
    if !metrics.endpoint.starts_with('/') {
        errors.push(ValidationError::InvalidEndpoint(metrics.endpoint.clone()));
    }
    if RESERVED_PATHS.contains(&metrics.endpoint.as_str()) {
        errors.push(ValidationError::EndpointConflict(metrics.endpoint.clone()));
    }
    if !is_literal_path(&metrics.endpoint) {
        errors.push(ValidationError::EndpointPattern(metrics.endpoint.clone()));
    }
    let increasing = metrics.duration_buckets.windows(2).all(|w| w[0] < w[1]);
    if metrics.duration_buckets.is_empty() || !increasing {
        errors.push(ValidationError::InvalidBuckets);
    }
    if metrics.upkeep_interval_secs == 0 {
        errors.push(ValidationError::ZeroUpkeepInterval);
    }

    if config.limits.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.limits.webhook_max_body_size == 0 {
        errors.push(ValidationError::ZeroWebhookBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The router treats braces and `:`/`*` segment prefixes as route syntax.
fn is_literal_path(path: &str) -> bool {
    !path.contains(['{', '}'])
        && path
            .split('/')
            .all(|segment| !segment.starts_with([':', '*']))
}

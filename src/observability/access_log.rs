//! Structured access log: one JSON record per request.
//!
//! A [`AccessGuard`] is created when a request enters the pipeline and emits
//! its record when dropped. Dropping happens on every exit path: normal
//! return, unwinding, and cancellation of the request future. If no status was
//! set by then, the record carries 500.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::observability::logging::{ACCESS_LOG_TARGET, ERROR_LOG_TARGET};

/// Status reported when no response was produced.
pub const FALLBACK_STATUS: u16 = 500;

/// A single access log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessLogRecord {
    /// Environment tag (`APP_ENV`).
    pub env: String,
    pub method: String,
    /// Raw request path, not the route template.
    pub path: String,
    pub status: u16,
    /// Milliseconds, rounded to 2 decimal places.
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Record of an unhandled failure, emitted by the exception boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorLogRecord {
    pub level: &'static str,
    pub msg: &'static str,
    /// Debug representation of the failure. Never sent to clients.
    pub error: String,
    pub path: String,
    pub method: String,
}

impl ErrorLogRecord {
    pub fn unhandled(error: impl Into<String>, path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            level: "error",
            msg: "unhandled_exception",
            error: error.into(),
            path: path.into(),
            method: method.into(),
        }
    }
}

/// Per-request state owned by the guard.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub request_id: Option<String>,
    pub start: Instant,
}

impl RequestContext {
    /// Capture the request and start the clock.
    pub fn new(method: impl Into<String>, path: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            request_id,
            start: Instant::now(),
        }
    }
}

/// Convert an elapsed duration to milliseconds with 2 decimals.
pub fn latency_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}

/// Access log manager: emits records and counts them.
#[derive(Debug)]
pub struct AccessLog {
    environment: String,
    access_entries: AtomicU64,
    error_entries: AtomicU64,
}

impl AccessLog {
    /// Create a new access log for the given environment tag.
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            access_entries: AtomicU64::new(0),
            error_entries: AtomicU64::new(0),
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Start tracking a request. The record is emitted when the guard drops.
    pub fn start(self: &Arc<Self>, context: RequestContext) -> AccessGuard {
        AccessGuard {
            log: Arc::clone(self),
            context,
            status: None,
        }
    }

    /// Emit an access record.
    pub fn record(&self, record: &AccessLogRecord) {
        self.access_entries.fetch_add(1, Ordering::Relaxed);
        match serde_json::to_string(record) {
            Ok(line) => tracing::info!(target: ACCESS_LOG_TARGET, "{}", line),
            Err(e) => tracing::warn!(error = %e, path = %record.path, "Failed to serialize access record"),
        }
    }

    /// Emit an unhandled failure record.
    pub fn record_error(&self, record: &ErrorLogRecord) {
        self.error_entries.fetch_add(1, Ordering::Relaxed);
        match serde_json::to_string(record) {
            Ok(line) => tracing::error!(target: ERROR_LOG_TARGET, "{}", line),
            Err(e) => tracing::warn!(error = %e, path = %record.path, "Failed to serialize error record"),
        }
    }

    /// Number of access records emitted so far.
    pub fn access_entries(&self) -> u64 {
        self.access_entries.load(Ordering::Relaxed)
    }

    /// Number of error records emitted so far.
    pub fn error_entries(&self) -> u64 {
        self.error_entries.load(Ordering::Relaxed)
    }
}

/// Scoped timer for one request.
#[derive(Debug)]
pub struct AccessGuard {
    log: Arc<AccessLog>,
    context: RequestContext,
    status: Option<u16>,
}

impl AccessGuard {
    /// Record the status of the response that is leaving the pipeline.
    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// Build the record as it would be emitted right now.
    pub fn snapshot(&self) -> AccessLogRecord {
        AccessLogRecord {
            env: self.log.environment.clone(),
            method: self.context.method.clone(),
            path: self.context.path.clone(),
            status: self.status.unwrap_or(FALLBACK_STATUS),
            latency_ms: latency_ms(self.context.start.elapsed()),
            request_id: self.context.request_id.clone(),
        }
    }
}

impl Drop for AccessGuard {
    fn drop(&mut self) {
        let record = self.snapshot();
        self.log.record(&record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_rounding() {
        assert_eq!(latency_ms(Duration::from_micros(1_234_567)), 1234.57);
        assert_eq!(latency_ms(Duration::from_nanos(4_999)), 0.0);
        assert_eq!(latency_ms(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_guard_emits_once_on_drop() {
        let log = Arc::new(AccessLog::new("test"));
        {
            let mut guard = log.start(RequestContext::new("GET", "/health", None));
            guard.set_status(200);
            assert_eq!(log.access_entries(), 0);
        }
        assert_eq!(log.access_entries(), 1);
    }

    #[test]
    fn test_status_defaults_to_500_without_response() {
        let log = Arc::new(AccessLog::new("test"));
        let guard = log.start(RequestContext::new("POST", "/alertmanager", Some("abc".into())));
        let record = guard.snapshot();
        assert_eq!(record.status, 500);
        assert_eq!(record.request_id.as_deref(), Some("abc"));
        assert!(record.latency_ms >= 0.0);
        drop(guard);
        assert_eq!(log.access_entries(), 1);
    }

    #[test]
    fn test_guard_emits_while_unwinding() {
        let log = Arc::new(AccessLog::new("test"));
        let inner = Arc::clone(&log);
        let result = std::panic::catch_unwind(move || {
            let _guard = inner.start(RequestContext::new("GET", "/boom", None));
            panic!("handler blew up");
        });
        assert!(result.is_err());
        assert_eq!(log.access_entries(), 1);
    }

    #[test]
    fn test_record_shape() {
        let record = AccessLogRecord {
            env: "dev".into(),
            method: "GET".into(),
            path: "/items/42".into(),
            status: 200,
            latency_ms: 1.5,
            request_id: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "env": "dev",
                "method": "GET",
                "path": "/items/42",
                "status": 200,
                "latency_ms": 1.5,
            })
        );
    }

    #[test]
    fn test_error_record_shape() {
        let log = AccessLog::new("dev");
        let record = ErrorLogRecord::unhandled("Intentional(\"x\")", "/fail", "GET");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["level"], "error");
        assert_eq!(value["msg"], "unhandled_exception");
        assert_eq!(value["path"], "/fail");
        log.record_error(&record);
        assert_eq!(log.error_entries(), 1);
        assert_eq!(log.access_entries(), 0);
    }
}

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request pipeline produces:
//!     → access_log.rs (one record per request, error records on faults)
//!     → metrics.rs (counters, histograms keyed by route template)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows into every access record
//! - Metrics are cheap (atomic increments)
//! - Instrumentation never fails a request

pub mod access_log;
pub mod logging;
pub mod metrics;

pub use access_log::{AccessGuard, AccessLog, AccessLogRecord, ErrorLogRecord, RequestContext};
pub use self::metrics::{Exchange, MetricsCollector, MetricsError, MetricsPolicy, PrometheusCollector};

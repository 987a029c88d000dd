//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define HTTP metrics (requests, latency, sizes, aborts)
//! - Expose Prometheus-compatible text exposition
//! - Decide which exchanges are observed and how they are labelled
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, handler, status
//! - `http_request_duration_seconds` (histogram): latency by method, handler
//! - `http_request_duration_highr_seconds` (histogram): latency, fine buckets
//! - `http_request_size_bytes` / `http_response_size_bytes` (summary): by handler
//! - `http_requests_aborted_total` (counter): dropped before a response existed
//!
//! # Design Decisions
//! - Collector is injected behind a trait so tests can substitute a fake
//! - Prometheus recorder is local to the collector, never installed globally
//! - Low-overhead metric updates (atomic operations)
//! - Handler label is the route template, bounding label cardinality

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::MetricsConfig;

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION: &str = "http_request_duration_seconds";
pub const REQUEST_DURATION_HIGHR: &str = "http_request_duration_highr_seconds";
pub const REQUEST_SIZE: &str = "http_request_size_bytes";
pub const RESPONSE_SIZE: &str = "http_response_size_bytes";
pub const REQUESTS_ABORTED: &str = "http_requests_aborted_total";

/// Content type of the text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Handler label used for untemplated paths when they are not ignored.
pub const UNTEMPLATED_HANDLER: &str = "none";

const HIGHR_BUCKETS: &[f64] = &[
    0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0,
    7.5, 10.0, 30.0, 60.0,
];

/// Error building the metrics recorder.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid histogram configuration: {0}")]
    Build(#[from] BuildError),
}

/// One completed request/response exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub method: String,
    /// Route template, or [`UNTEMPLATED_HANDLER`].
    pub handler: String,
    /// Grouped class (`2xx`) or the raw code (`200`).
    pub status: String,
    pub latency: Duration,
    pub request_size: u64,
    pub response_size: u64,
}

/// Process-wide aggregate of completed exchanges.
pub trait MetricsCollector: Send + Sync {
    /// Record one completed exchange.
    fn observe(&self, exchange: &Exchange);

    /// Record an exchange whose future was dropped before a response existed.
    fn observe_aborted(&self, method: &str, handler: &str);

    /// Render the current snapshot. Must not reset anything.
    fn render(&self) -> String;

    /// Periodic housekeeping.
    fn upkeep(&self) {}
}

/// Collector backed by a local Prometheus recorder.
pub struct PrometheusCollector {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl PrometheusCollector {
    /// Build a collector with the configured latency buckets.
    pub fn new(config: &MetricsConfig) -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION.to_string()),
                &config.duration_buckets,
            )?
            .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION_HIGHR.to_string()), HIGHR_BUCKETS)?
            .build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_counter!(REQUESTS_TOTAL, "Total number of requests by method, status and handler.");
            describe_histogram!(
                REQUEST_DURATION,
                Unit::Seconds,
                "Latency with only few buckets by handler."
            );
            describe_histogram!(
                REQUEST_DURATION_HIGHR,
                Unit::Seconds,
                "Latency with many buckets but no API specific labels."
            );
            describe_histogram!(REQUEST_SIZE, Unit::Bytes, "Content length of incoming requests by handler.");
            describe_histogram!(RESPONSE_SIZE, Unit::Bytes, "Content length of outgoing responses by handler.");
            describe_counter!(REQUESTS_ABORTED, "Requests dropped before a response was produced.");
        });

        Ok(Self { recorder, handle })
    }
}

impl MetricsCollector for PrometheusCollector {
    fn observe(&self, exchange: &Exchange) {
        let secs = exchange.latency.as_secs_f64();
        metrics::with_local_recorder(&self.recorder, || {
            counter!(
                REQUESTS_TOTAL,
                "method" => exchange.method.clone(),
                "status" => exchange.status.clone(),
                "handler" => exchange.handler.clone()
            )
            .increment(1);
            histogram!(
                REQUEST_DURATION,
                "method" => exchange.method.clone(),
                "handler" => exchange.handler.clone()
            )
            .record(secs);
            histogram!(REQUEST_DURATION_HIGHR).record(secs);
            histogram!(REQUEST_SIZE, "handler" => exchange.handler.clone())
                .record(exchange.request_size as f64);
            histogram!(RESPONSE_SIZE, "handler" => exchange.handler.clone())
                .record(exchange.response_size as f64);
        });
    }

    fn observe_aborted(&self, method: &str, handler: &str) {
        metrics::with_local_recorder(&self.recorder, || {
            counter!(
                REQUESTS_ABORTED,
                "method" => method.to_owned(),
                "handler" => handler.to_owned()
            )
            .increment(1);
        });
    }

    fn render(&self) -> String {
        self.handle.render()
    }

    fn upkeep(&self) {
        self.handle.run_upkeep();
    }
}

/// Which exchanges are observed, and under which labels.
#[derive(Debug, Clone)]
pub struct MetricsPolicy {
    group_status_codes: bool,
    ignore_untemplated: bool,
    excluded_paths: HashSet<String>,
}

impl MetricsPolicy {
    /// The scrape endpoint is always excluded, whatever `excluded_paths` says.
    pub fn new(config: &MetricsConfig) -> Self {
        let mut excluded_paths: HashSet<String> = config.excluded_paths.iter().cloned().collect();
        excluded_paths.insert(config.endpoint.clone());

        Self {
            group_status_codes: config.group_status_codes,
            ignore_untemplated: config.ignore_untemplated,
            excluded_paths,
        }
    }

    /// Handler label for a request, or `None` if it must not be observed.
    pub fn handler_label(&self, template: Option<&str>, raw_path: &str) -> Option<String> {
        if self.excluded_paths.contains(raw_path) {
            return None;
        }
        match template {
            Some(t) if self.excluded_paths.contains(t) => None,
            Some(t) => Some(t.to_owned()),
            None if self.ignore_untemplated => None,
            None => Some(UNTEMPLATED_HANDLER.to_owned()),
        }
    }

    /// Status label for a response code.
    pub fn status_label(&self, code: u16) -> String {
        status_label(code, self.group_status_codes)
    }
}

/// `503` → `5xx` when grouping, `503` otherwise.
pub fn status_label(code: u16, grouped: bool) -> String {
    if grouped {
        format!("{}xx", code / 100)
    } else {
        code.to_string()
    }
}

/// Run recorder upkeep until shutdown.
pub async fn run_upkeep(
    collector: Arc<dyn MetricsCollector>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                collector.upkeep();
            }
            _ = shutdown.recv() => {
                tracing::debug!("Metrics upkeep received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

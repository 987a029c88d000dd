//! Metrics middleware.
//!
//! Observes every completed exchange not excluded by the [`MetricsPolicy`].
//! Instrumentation problems are contained here: a panicking collector is
//! logged and the response still goes out.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::HttpBody,
    extract::{MatchedPath, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;
use crate::observability::{Exchange, MetricsCollector};

pub async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let template = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned());

    let Some(handler) = state
        .metrics_policy
        .handler_label(template.as_deref(), request.uri().path())
    else {
        return next.run(request).await;
    };

    let request_size = body_size(request.headers(), request.body().size_hint().exact());
    let mut observation = Observation {
        collector: Arc::clone(&state.metrics),
        method: request.method().to_string(),
        handler,
        start: Instant::now(),
        done: false,
    };

    let response = next.run(request).await;

    let exchange = Exchange {
        method: observation.method.clone(),
        handler: observation.handler.clone(),
        status: state.metrics_policy.status_label(response.status().as_u16()),
        latency: observation.start.elapsed(),
        request_size,
        response_size: body_size(response.headers(), response.body().size_hint().exact()),
    };
    observation.complete(&exchange);

    response
}

/// Content-Length header, else the exact body size hint, else 0.
fn body_size(headers: &HeaderMap, exact: Option<u64>) -> u64 {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .or(exact)
        .unwrap_or(0)
}

fn contained<F: FnOnce()>(what: &'static str, f: F) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::warn!(operation = what, "Metrics collector panicked; observation dropped");
    }
}

/// In-flight observation. Recorded as aborted if dropped before completion.
struct Observation {
    collector: Arc<dyn MetricsCollector>,
    method: String,
    handler: String,
    start: Instant,
    done: bool,
}

impl Observation {
    fn complete(&mut self, exchange: &Exchange) {
        self.done = true;
        let collector = &self.collector;
        contained("observe", || collector.observe(exchange));
    }
}

impl Drop for Observation {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        tracing::debug!(method = %self.method, handler = %self.handler, "Request dropped before response");
        let collector = &self.collector;
        let (method, handler) = (&self.method, &self.handler);
        contained("observe_aborted", || collector.observe_aborted(method, handler));
    }
}

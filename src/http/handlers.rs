//! Route handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::alerting::webhook;
use crate::error::HandlerError;
use crate::http::response::Ack;
use crate::http::server::AppState;
use crate::observability::metrics::PROMETHEUS_CONTENT_TYPE;

/// Name reported by the root endpoint.
pub const SERVICE_NAME: &str = "sre-starter";

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": SERVICE_NAME,
        "env": state.access_log.environment(),
    }))
}

pub async fn health() -> Json<Ack> {
    Json(Ack::OK)
}

/// Always fails. Used to check the alert pipeline end to end.
pub async fn fail() -> Result<Json<Ack>, HandlerError> {
    Err(HandlerError::Intentional("intentional failure for alert test"))
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}

/// Alertmanager webhook receiver. Acknowledges every delivery.
pub async fn alertmanager(body: Bytes) -> Json<Ack> {
    let summary = webhook::receive(&body);
    tracing::debug!(
        receiver = ?summary.receiver,
        alerts = summary.alerts_count,
        "Webhook acknowledged"
    );
    Json(Ack::OK)
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}

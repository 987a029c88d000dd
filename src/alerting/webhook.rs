//! Alertmanager webhook normalization.
//!
//! The payload has no fixed schema on our side. It is decoded into a
//! `serde_json::Value` and read field by field, each access falling back to
//! null or empty. Nothing in here can fail: the sender must always get an
//! acknowledgement, otherwise it starts retrying.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{json, Value};

use crate::observability::logging::ALERT_LOG_TARGET;

/// Bounded view of one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub receiver: Option<String>,
    pub status: Option<String>,
    pub alerts_count: usize,
    /// Distinct alert names, sorted. `None` (missing name) sorts first.
    pub alertnames: Vec<Option<String>>,
}

impl AlertSummary {
    pub fn from_payload(payload: &Value) -> Self {
        let alerts = payload
            .get("alerts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let alertnames: BTreeSet<Option<String>> = alerts.iter().map(alertname).collect();

        Self {
            receiver: string_field(payload, "receiver"),
            status: string_field(payload, "status"),
            alerts_count: alerts.len(),
            alertnames: alertnames.into_iter().collect(),
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn alertname(alert: &Value) -> Option<String> {
    alert
        .get("labels")
        .and_then(|labels| labels.get("alertname"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Decode a request body. Bodies that are not JSON are kept as text.
pub fn decode_payload(body: &[u8]) -> Value {
    match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(
                target: ALERT_LOG_TARGET,
                error = %e,
                bytes = body.len(),
                "Webhook body is not valid JSON"
            );
            Value::String(String::from_utf8_lossy(body).into_owned())
        }
    }
}

/// Summarize a delivery and write the audit line.
pub fn receive(body: &[u8]) -> AlertSummary {
    let payload = decode_payload(body);
    let summary = AlertSummary::from_payload(&payload);

    let line = json!({ "summary": summary, "payload": payload });
    tracing::warn!(target: ALERT_LOG_TARGET, "ALERTMANAGER_WEBHOOK {}", line);

    summary
}

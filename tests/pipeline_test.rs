//! End-to-end tests of the request instrumentation pipeline.

use reqwest::StatusCode;
use serde_json::{json, Value};
use sre_starter::config::ServiceConfig;

mod common;

#[tokio::test]
async fn test_health_is_stable() {
    let service = common::start_service(ServiceConfig::default()).await;

    for _ in 0..3 {
        let res = service.client.get(service.url("/health")).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.json::<Value>().await.unwrap(), json!({"ok": true}));
    }

    // A fault in between does not change the answer.
    let _ = service.client.get(service.url("/fail")).send().await.unwrap();

    let res = service.client.get(service.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"ok": true}));
}

#[tokio::test]
async fn test_fail_returns_uniform_error() {
    let service = common::start_service(ServiceConfig::default()).await;

    let res = service.client.get(service.url("/fail")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = res.text().await.unwrap();
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"detail": "internal_error"}));
    assert!(!body.contains("intentional"), "failure detail leaked: {body}");

    assert_eq!(service.state.access_log.error_entries(), 1);
    assert_eq!(service.state.access_log.access_entries(), 1);

    let exposition = service.scrape().await;
    assert_eq!(
        common::sample(
            &exposition,
            "http_requests_total",
            &["handler=\"/fail\"", "status=\"5xx\"", "method=\"GET\""]
        ),
        Some(1.0)
    );
}

#[tokio::test]
async fn test_one_access_record_per_request() {
    let service = common::start_service(ServiceConfig::default()).await;

    let paths = ["/health", "/fail", "/", "/does-not-exist", "/metrics"];
    for path in paths {
        let _ = service.client.get(service.url(path)).send().await.unwrap();
    }
    let res = service
        .client
        .post(service.url("/alertmanager"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(service.state.access_log.access_entries(), paths.len() as u64 + 1);
    assert_eq!(service.state.access_log.error_entries(), 1);
}

#[tokio::test]
async fn test_metrics_never_count_themselves() {
    let service = common::start_service(ServiceConfig::default()).await;

    let _ = service.client.get(service.url("/health")).send().await.unwrap();
    for _ in 0..3 {
        let _ = service.scrape().await;
    }

    let res = service.client.get(service.url("/metrics")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));

    let exposition = res.text().await.unwrap();
    assert!(exposition.contains("handler=\"/health\""));
    assert!(!exposition.contains("handler=\"/metrics\""));
}

#[tokio::test]
async fn test_alertmanager_always_acknowledges() {
    let service = common::start_service(ServiceConfig::default()).await;

    let full = json!({
        "receiver": "r1",
        "status": "firing",
        "alerts": [
            {"labels": {"alertname": "A"}},
            {"labels": {"alertname": "B"}},
            {"labels": {"alertname": "A"}}
        ]
    });
    let res = service.client.post(service.url("/alertmanager")).json(&full).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"ok": true}));

    let res = service.client.post(service.url("/alertmanager")).json(&json!({})).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"ok": true}));

    let res = service
        .client
        .post(service.url("/alertmanager"))
        .header("content-type", "application/json")
        .body("{\"alerts\": [")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"ok": true}));

    assert_eq!(service.state.access_log.error_entries(), 0);
}

#[tokio::test]
async fn test_concurrent_requests_are_all_counted() {
    let service = common::start_service(ServiceConfig::default()).await;
    let n = 64;

    let mut tasks = Vec::new();
    for _ in 0..n {
        let client = service.client.clone();
        let url = service.url("/health");
        tasks.push(tokio::spawn(async move {
            client.get(&url).send().await.map(|r| r.status())
        }));
    }
    for task in futures_util::future::join_all(tasks).await {
        assert_eq!(task.unwrap().unwrap(), StatusCode::OK);
    }

    let exposition = service.scrape().await;
    assert_eq!(
        common::sample(
            &exposition,
            "http_requests_total",
            &["handler=\"/health\"", "status=\"2xx\""]
        ),
        Some(n as f64)
    );
    assert_eq!(
        common::sample(
            &exposition,
            "http_request_duration_seconds_count",
            &["handler=\"/health\""]
        ),
        Some(n as f64)
    );
    assert_eq!(service.state.access_log.access_entries(), n as u64 + 1);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let service = common::start_service(ServiceConfig::default()).await;

    let res = service.client.get(service.url("/health")).send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));

    let res = service
        .client
        .get(service.url("/fail"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn test_custom_scrape_endpoint() {
    let mut config = ServiceConfig::default();
    config.metrics.endpoint = "/internal/metrics".into();
    let service = common::start_service(config).await;

    let _ = service.client.get(service.url("/health")).send().await.unwrap();
    let res = service
        .client
        .get(service.url("/internal/metrics"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let exposition = res.text().await.unwrap();
    assert!(exposition.contains("handler=\"/health\""));
    assert!(!exposition.contains("/internal/metrics"));

    let res = service.client.get(service.url("/metrics")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

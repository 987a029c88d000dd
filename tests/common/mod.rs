//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use sre_starter::config::ServiceConfig;
use sre_starter::http::{AppState, HttpServer};
use sre_starter::lifecycle::Shutdown;
use tokio::net::TcpListener;

/// A running service on an ephemeral port.
pub struct TestService {
    pub addr: SocketAddr,
    pub state: AppState,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
}

#[allow(dead_code)]
impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Scrape `/metrics` and return the body.
    pub async fn scrape(&self) -> String {
        self.client
            .get(self.url("/metrics"))
            .send()
            .await
            .expect("metrics endpoint unreachable")
            .text()
            .await
            .unwrap()
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the service with the given configuration.
pub async fn start_service(config: ServiceConfig) -> TestService {
    let server = HttpServer::new(config).expect("valid metrics config");
    let state = server.state().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    TestService {
        addr,
        state,
        shutdown,
        client,
    }
}

/// Value of the sample whose line starts with `metric` and contains every label.
#[allow(dead_code)]
pub fn sample(exposition: &str, metric: &str, labels: &[&str]) -> Option<f64> {
    exposition
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| line.starts_with(&format!("{metric}{{")) || line.starts_with(&format!("{metric} ")))
        .find(|line| labels.iter().all(|label| line.contains(label)))
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

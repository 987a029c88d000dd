//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, access log, metrics, boundary)
//! - Bind server to listener
//! - Run metrics upkeep alongside the server
//! - Drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::error::panic_fault;
use crate::http::handlers;
use crate::http::middleware::{access_log_middleware, exception_boundary, metrics_middleware};
use crate::http::request::UuidRequestId;
use crate::observability::metrics::run_upkeep;
use crate::observability::{AccessLog, MetricsCollector, MetricsError, MetricsPolicy, PrometheusCollector};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub access_log: Arc<AccessLog>,
    pub metrics: Arc<dyn MetricsCollector>,
    pub metrics_policy: Arc<MetricsPolicy>,
}

impl AppState {
    /// Build state around an existing collector.
    pub fn new(config: ServiceConfig, metrics: Arc<dyn MetricsCollector>) -> Self {
        Self {
            access_log: Arc::new(AccessLog::new(config.observability.environment.clone())),
            metrics_policy: Arc::new(MetricsPolicy::new(&config.metrics)),
            metrics,
            config: Arc::new(config),
        }
    }
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with a Prometheus collector.
    pub fn new(config: ServiceConfig) -> Result<Self, MetricsError> {
        let collector = PrometheusCollector::new(&config.metrics)?;
        Ok(Self::with_collector(config, Arc::new(collector)))
    }

    /// Create a new HTTP server around the given collector.
    pub fn with_collector(config: ServiceConfig, metrics: Arc<dyn MetricsCollector>) -> Self {
        let state = AppState::new(config, metrics);
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers added later wrap the ones added earlier. The webhook route
    /// carries its own body limit, which takes precedence over the global one.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let config = Arc::clone(&state.config);

        Router::new()
            .route("/", get(handlers::root))
            .route("/health", get(handlers::health))
            .route("/fail", get(handlers::fail))
            .route(&config.metrics.endpoint, get(handlers::metrics))
            .route(
                "/alertmanager",
                post(handlers::alertmanager)
                    .layer(DefaultBodyLimit::max(config.limits.webhook_max_body_size)),
            )
            .fallback(handlers::not_found)
            .layer(CatchPanicLayer::custom(panic_fault))
            .layer(TimeoutLayer::new(Duration::from_secs(config.limits.request_timeout_secs)))
            .layer(middleware::from_fn_with_state(state.clone(), exception_boundary))
            .layer(middleware::from_fn_with_state(state.clone(), metrics_middleware))
            .layer(middleware::from_fn_with_state(state.clone(), access_log_middleware))
            .layer(DefaultBodyLimit::max(config.limits.max_body_size))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// A clone of the router, e.g. for driving it without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.state.config
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.state.config.observability.environment,
            "HTTP server starting"
        );

        let upkeep = tokio::spawn(run_upkeep(
            Arc::clone(&self.state.metrics),
            Duration::from_secs(self.state.config.metrics.upkeep_interval_secs),
            shutdown.resubscribe(),
        ));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        upkeep.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

//! sre-starter: an HTTP service with access logging, a uniform error
//! boundary, Prometheus metrics and an Alertmanager webhook receiver.

pub mod alerting;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

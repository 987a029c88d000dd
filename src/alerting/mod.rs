//! Alerting system integration.
//!
//! # Data Flow
//! ```text
//! POST /alertmanager (any body)
//!     → webhook.rs (decode defensively, summarize)
//!     → WARN audit line: summary + raw payload
//!     → {"ok": true}
//! ```

pub mod webhook;

pub use webhook::AlertSummary;

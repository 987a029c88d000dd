//! Request instrumentation middleware.
//!
//! # Ordering (outermost first)
//! ```text
//! access_log.rs   timer + one record per request (drop guard)
//!     → metrics.rs    one observation per completed exchange
//!     → exception.rs  fault marker → uniform 500 + error record
//!     → [timeout, panic catcher, route handler]
//! ```
//!
//! Both observers sit outside the boundary, so they see the final status.

pub mod access_log;
pub mod exception;
pub mod metrics;

pub use access_log::access_log_middleware;
pub use exception::exception_boundary;
pub use self::metrics::metrics_middleware;

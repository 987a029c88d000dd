//! Handler failures and the fault marker carried to the exception boundary.
//!
//! Handlers return `Result<_, HandlerError>`. Converting the error into a
//! response does not build the client-facing body: it produces a bare 500
//! tagged with a [`HandlerFault`] extension. Panics are tagged the same way by
//! [`panic_fault`]. The exception boundary middleware is the only place that
//! turns a tagged response into the uniform failure shape.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure raised inside route handling.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Deliberate failure, used to exercise alert pipelines.
    #[error("{0}")]
    Intentional(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Marker attached to a response produced from an unhandled failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFault {
    detail: String,
}

impl HandlerFault {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    /// Server-side representation of the failure.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

fn faulted(detail: String) -> Response {
    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response.extensions_mut().insert(HandlerFault::new(detail));
    response
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        faulted(format!("{self:?}"))
    }
}

/// Turn a caught panic payload into a tagged 500.
///
/// Used with `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn panic_fault(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    faulted(format!("Panic({message:?})"))
}

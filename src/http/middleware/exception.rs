//! Exception boundary.
//!
//! Terminal handler for every unhandled failure. A response tagged with a
//! [`HandlerFault`] is logged server-side and replaced by the uniform
//! `{"detail": "internal_error"}` 500. Untagged responses pass through as is.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::HandlerFault;
use crate::http::response::internal_error;
use crate::http::server::AppState;
use crate::observability::ErrorLogRecord;

pub async fn exception_boundary(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    let Some(fault) = response.extensions().get::<HandlerFault>() else {
        return response;
    };

    state
        .access_log
        .record_error(&ErrorLogRecord::unhandled(fault.detail(), path, method));
    internal_error()
}

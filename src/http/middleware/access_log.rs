//! Access log middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::RequestContext;

/// Time the request and emit exactly one access record for it.
///
/// The record is written by the guard's `Drop`, so it is also written when
/// the inner future is cancelled; the status is then 500.
pub async fn access_log_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let context = RequestContext::new(
        request.method().as_str(),
        request.uri().path(),
        request_id(request.headers()),
    );
    let mut guard = state.access_log.start(context);

    let response = next.run(request).await;
    guard.set_status(response.status().as_u16());
    response
}

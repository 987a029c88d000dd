//! Response bodies shared by handlers and the exception boundary.
//!
//! # Design Decisions
//! - The failure body is a single opaque field, identical for every cause
//! - Acknowledgements are a fixed `{"ok": true}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{"ok": true}`
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Ack = Ack { ok: true };
}

/// `{"detail": "internal_error"}`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorBody {
    pub detail: &'static str,
}

/// The uniform client-facing response for any unhandled failure.
pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            detail: "internal_error",
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_internal_error_body() {
        let response = internal_error();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], br#"{"detail":"internal_error"}"#);
    }

    #[test]
    fn test_ack_shape() {
        assert_eq!(serde_json::to_string(&Ack::OK).unwrap(), r#"{"ok":true}"#);
    }
}

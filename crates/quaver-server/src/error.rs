//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`quaver_core::Error`] so that route
//! handlers can return `Result<T, AppError>` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: quaver_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: quaver_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }
}

impl From<quaver_core::Error> for AppError {
    fn from(e: quaver_core::Error) -> Self {
        Self::new(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let code = match &self.inner {
            quaver_core::Error::NotFound { .. } => "not_found",
            quaver_core::Error::Unauthorized(_) => "unauthorized",
            quaver_core::Error::Forbidden(_) => "forbidden",
            quaver_core::Error::Validation(_) => "validation_error",
            quaver_core::Error::Conflict(_) => "conflict",
            quaver_core::Error::UnsupportedMedia(_) => "unsupported_media",
            quaver_core::Error::Database { .. } => "database_error",
            quaver_core::Error::Io { .. } => "io_error",
            quaver_core::Error::Internal(_) => "internal_error",
        };

        // 5xx bodies stay generic: the logged error carries the details.
        let message = if status.is_server_error() {
            "Internal Server Error".to_string()
        } else {
            self.inner.to_string()
        };

        let body = json!({
            "error": message,
            "code": code,
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}

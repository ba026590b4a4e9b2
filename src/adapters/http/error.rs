//! HTTP error responses
//!
//! Every error body has the shape `{"detail": "..."}`.

use std::any::Any;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::query::ErrorDetail;

/// Errors surfaced by HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body could not be read as the expected JSON
    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),

    /// Anything the handler could not recover from
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::InvalidBody(rejection) => {
                (StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
            }
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        (status, Json(ErrorDetail::new(detail))).into_response()
    }
}

/// Converts a handler panic into a 500 response.
///
/// The panic message is logged but not returned to the caller.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!("Request handler panicked: {}", message);

    ApiError::Internal("Internal Server Error".to_string()).into_response()
}

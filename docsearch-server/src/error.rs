//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docsearch_rag::RagError;
use serde_json::json;
use tracing::error;

/// A failed request. Every failure is reported as `500 {"detail": ...}`.
#[derive(Debug)]
pub struct ApiError(pub RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, upstream = self.0.is_upstream(), "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": self.0.to_string() })))
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

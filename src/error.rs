use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
};
use tracing::error;

/// Failures while answering a signing request. All of them are the server's
/// fault, so every variant maps to a 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A credential needed for signing is not configured
    #[error("server is missing configuration: {0}")]
    MissingConfig(&'static str),
    /// The system clock could not be turned into a Unix timestamp
    #[error("clock error: {0}")]
    Clock(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Signing request failed: {}", self);
        let body = serde_json::json!({ "error": self.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, JsonResponse(body)).into_response()
    }
}

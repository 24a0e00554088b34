use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode, header},
    response::{IntoResponse, Json as JsonResponse},
    routing::get,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::SignUploadResponse;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::upload::sign_upload_at;

/// Builds and runs the server on the configured port
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    run_server_with_listener(config, listener).await
}

/// Runs the server with a provided listener (useful for tests with ephemeral ports)
pub async fn run_server_with_listener(
    config: AppConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = listener.local_addr()?;
    info!("Backend running on {}", addr);

    axum::serve(listener, router(Arc::new(config))).await?;
    Ok(())
}

/// Routes, CORS and request tracing around the shared config.
pub fn router(config: Arc<AppConfig>) -> Router {
    // Mobile web views and browsers call this cross-origin
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route(
            "/api/sign-upload",
            get(handle_sign_upload).fallback(method_not_allowed_handler),
        )
        .fallback(fallback_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(config)
}

/// GET /api/sign-upload → signature plus the exact params that were signed
async fn handle_sign_upload(
    State(config): State<Arc<AppConfig>>,
) -> Result<JsonResponse<SignUploadResponse>, ApiError> {
    let resp = sign_upload_at(&config, Utc::now())?;
    Ok(JsonResponse(resp))
}

/// Fallback for any unsupported route
async fn fallback_handler() -> impl IntoResponse {
    let now = Utc::now();
    error!("{} Unknown route, returning 404", now.to_rfc3339());
    let body = serde_json::json!({ "error": "Not found" });
    (StatusCode::NOT_FOUND, JsonResponse(body))
}

/// Known route, unsupported method
async fn method_not_allowed_handler(method: Method) -> impl IntoResponse {
    error!("{} {} not allowed, returning 405", Utc::now().to_rfc3339(), method);
    let body = serde_json::json!({ "error": "Method not allowed" });
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, HEAD")],
        JsonResponse(body),
    )
}

//! System handlers: health check and OpenAPI specification.

use crate::api::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use utoipa::OpenApi;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check(State(_state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.1 specification document")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    Json(crate::api::ApiDoc::openapi())
}

//! Song generation task handlers.

use crate::api::AppState;
use crate::types::{CallbackEnvelope, TaskId};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Provider identifier echoed in submission responses
const PROVIDER_NAME: &str = "kie";

/// Request body for POST /songs
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitSongRequest {
    /// Song title
    #[serde(default = "default_title")]
    pub title: String,
    /// Full lyrics
    #[serde(default)]
    pub lyrics: String,
    /// Musical style
    #[serde(default = "default_style")]
    pub style: String,
}

fn default_title() -> String {
    "AI Song".to_string()
}

fn default_style() -> String {
    "Classical".to_string()
}

/// Response body for POST /songs
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitSongResponse {
    /// Provider-issued task id, the handle for subsequent polling
    pub task_id: TaskId,
    /// Which provider accepted the task
    pub provider: String,
}

/// POST /songs - Submit a generation request
#[utoipa::path(
    post,
    path = "/songs",
    tag = "songs",
    request_body = SubmitSongRequest,
    responses(
        (status = 200, description = "Task accepted by the provider", body = SubmitSongResponse),
        (status = 500, description = "Configuration or provider error", body = crate::error::ApiError),
        (status = 502, description = "Provider or relay host unreachable", body = crate::error::ApiError),
        (status = 504, description = "Provider did not respond in time", body = crate::error::ApiError)
    )
)]
pub async fn submit_song(
    State(state): State<AppState>,
    Json(request): Json<SubmitSongRequest>,
) -> Response {
    let request = crate::types::GenerationRequest {
        title: request.title,
        lyrics: request.lyrics,
        style: request.style,
    };

    match state.forge.submit(request).await {
        Ok(task_id) => (
            StatusCode::OK,
            Json(SubmitSongResponse {
                task_id,
                provider: PROVIDER_NAME.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Song submission failed: {}", e);
            e.into_response()
        }
    }
}

/// POST /provider/callback - Provider-pushed completion notification
///
/// Acknowledges `{code: 200}` for every parsable payload, including partial
/// ones that carry no usable media reference yet, so the provider does not
/// redeliver them. Only a fundamentally unparsable body (or a store failure)
/// is acknowledged with `{code: 500}` to request redelivery.
#[utoipa::path(
    post,
    path = "/provider/callback",
    tag = "songs",
    request_body = CallbackEnvelope,
    responses(
        (status = 200, description = "Callback accepted"),
        (status = 500, description = "Unparsable payload, provider should redeliver")
    )
)]
pub async fn provider_callback(
    State(state): State<AppState>,
    payload: Result<Json<CallbackEnvelope>, JsonRejection>,
) -> Response {
    let Json(envelope) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "unparsable callback payload");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"code": 500})),
            )
                .into_response();
        }
    };

    match state.forge.ingest_callback(envelope).await {
        Ok(()) => (StatusCode::OK, Json(json!({"code": 200}))).into_response(),
        Err(e) => {
            tracing::error!("Callback ingestion failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"code": 500})),
            )
                .into_response()
        }
    }
}

/// GET /songs/:task_id/status - Poll the observable state of a task
///
/// An optional `X-User-Id` header attaches a user identity; the first poll
/// that observes the final record then records the creation against that
/// user.
#[utoipa::path(
    get,
    path = "/songs/{task_id}/status",
    tag = "songs",
    params(
        ("task_id" = String, Path, description = "Provider-issued task id"),
        ("X-User-Id" = Option<String>, Header, description = "User identity to record the creation against")
    ),
    responses(
        (status = 200, description = "Current observable task status", body = crate::types::TaskStatus),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn song_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .filter(|user| !user.is_empty());

    match state
        .forge
        .resolve_status(&TaskId::from(task_id), user)
        .await
    {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => {
            tracing::error!("Status resolution failed: {}", e);
            e.into_response()
        }
    }
}

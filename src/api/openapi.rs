//! OpenAPI documentation definitions.

use utoipa::OpenApi;

use super::routes;

/// OpenAPI documentation for the songforge REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "songforge API",
        description = "Asynchronous song-generation task orchestration API",
        license(name = "MIT OR Apache-2.0")
    ),
    paths(
        routes::submit_song,
        routes::provider_callback,
        routes::song_status,
        routes::health_check,
        routes::openapi_spec,
    ),
    components(schemas(
        routes::SubmitSongRequest,
        routes::SubmitSongResponse,
        crate::types::TaskId,
        crate::types::TaskState,
        crate::types::TaskStatus,
        crate::types::CallbackEnvelope,
        crate::types::CallbackData,
        crate::types::MediaDescriptor,
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "songs", description = "Song generation task management"),
        (name = "system", description = "Health and documentation")
    )
)]
pub struct ApiDoc;

use super::dto::UploadVideoForm;
use super::model::Video;
use super::service::UploadService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::common::security::TokenClaims;
use crate::state::AppState;
use axum::{
    extract::{Extension, Multipart, Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

/// Upload Video
/// Stages the file, tags it by aspect ratio, remuxes it for fast start,
/// publishes it to object storage and records the public URL.
#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/upload",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = UploadVideoForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload successful", body = ApiResponse<Video>),
        (status = 400, description = "Bad Request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Video not found"),
        (status = 413, description = "Payload Too Large"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Video",
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<TokenClaims>,
    multipart: Multipart,
) -> impl IntoResponse {
    let cancel = state.shutdown.child_token();

    match UploadService::upload_video(&state, id, claims.sub, multipart, &cancel).await {
        Ok(video) => ApiSuccess::ok(video, "Video uploaded successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

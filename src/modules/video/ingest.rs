use super::content_type::VideoContentType;
use super::error::UploadError;
use crate::common::upload::{StageError, stage_stream};
use crate::config::settings::UploadConfig;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use tempfile::TempPath;
use tracing::{debug, info};

/// Multipart field that carries the video bytes.
pub const VIDEO_FIELD: &str = "video";

#[derive(Debug)]
pub struct IngestedVideo {
    pub source: TempPath,
    pub content_type: VideoContentType,
    pub size: u64,
}

/// Finds the `video` part, checks its declared type, and stages it on disk.
///
/// The content type is checked before any file is created. Other parts are
/// skipped.
pub async fn ingest(
    multipart: &mut Multipart,
    config: &UploadConfig,
) -> Result<IngestedVideo, UploadError> {
    let limit = config.max_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::from_multipart(e, limit))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let content_type = VideoContentType::from_header(field.content_type())?;
        let file_name = field.file_name().unwrap_or("upload").to_string();

        let staged = stage_stream(field, &config.temp_dir, content_type.extension(), limit)
            .await
            .map_err(|e| stage_error(e, limit))?;

        info!(
            file_name = %file_name,
            content_type = %content_type,
            size_bytes = staged.size,
            "Staged upload"
        );

        return Ok(IngestedVideo {
            source: staged.path,
            content_type,
            size: staged.size,
        });
    }

    Err(UploadError::Validation(format!(
        "No {} field found in multipart request",
        VIDEO_FIELD
    )))
}

fn stage_error(err: StageError<MultipartError>, limit: u64) -> UploadError {
    match err {
        StageError::TooLarge { limit } => UploadError::PayloadTooLarge { limit },
        StageError::Stream(e) => UploadError::from_multipart(e, limit),
        StageError::Io(e) => UploadError::from(e),
    }
}

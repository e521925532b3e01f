use super::content_type::VideoContentType;
use super::error::UploadError;
use crate::infrastructure::storage::ObjectStore;
use std::path::Path;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub key: String,
    pub url: String,
}

/// Uploads `path` under `bucket/key` and resolves its public address.
/// Any storage failure is fatal to the request.
pub async fn publish(
    store: &dyn ObjectStore,
    bucket: &str,
    key: String,
    path: &Path,
    content_type: VideoContentType,
) -> Result<Published, UploadError> {
    let start = Instant::now();

    store
        .put_file(bucket, &key, path, content_type.as_str())
        .await?;

    let url = store.public_url(bucket, &key);

    info!(
        bucket = %bucket,
        key = %key,
        duration_ms = start.elapsed().as_millis(),
        "Published video object"
    );

    Ok(Published { key, url })
}

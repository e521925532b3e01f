use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub mod s3;

pub use s3::StorageService;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },
}

/// Durable object storage addressed by bucket and key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Streams the file at `path` to `bucket/key` with `content_type` set
    /// as object metadata.
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Public address of an object. Pure string assembly, no I/O.
    fn public_url(&self, bucket: &str, key: &str) -> String;
}

/// Virtual-hosted AWS address, or path-style under a custom endpoint.
pub fn public_object_url(endpoint: Option<&str>, bucket: &str, region: &str, key: &str) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
    }
}

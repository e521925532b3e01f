use super::{ObjectStore, StorageError, public_object_url};
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::{Client, config::BehaviorVersion, config::Credentials, config::Region};
use bytes::Bytes;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::config::settings::StorageConfig;

/// Files above this size go through S3 multipart upload.
const MULTIPART_THRESHOLD: u64 = 64 * 1024 * 1024;
/// S3 requires at least 5 MiB for every part but the last.
const PART_SIZE: usize = 8 * 1024 * 1024;

#[derive(Clone)]
pub struct StorageService {
    pub client: Client,
    region: String,
    endpoint: Option<String>,
}

impl StorageService {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "static",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            url::Url::parse(endpoint)
                .with_context(|| format!("Invalid S3 endpoint: {}", endpoint))?;
            // Required for MinIO
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        info!(
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "✅ S3 client configured"
        );

        Ok(Self {
            client,
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        })
    }

    async fn put_single(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| upload_error(key, e.to_string()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| upload_error(key, sdk_message(e)))?;

        Ok(())
    }

    async fn put_multipart(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|source| read_error(path, source))?;

        let mut uploader = MultipartUploader::new(self, bucket, key, content_type).await?;

        loop {
            let mut buffer = Vec::with_capacity(PART_SIZE);
            let read = match (&mut file).take(PART_SIZE as u64).read_to_end(&mut buffer).await {
                Ok(n) => n,
                Err(source) => {
                    uploader.abort().await;
                    return Err(read_error(path, source));
                }
            };
            if read == 0 {
                break;
            }

            if let Err(e) = uploader.upload_part(Bytes::from(buffer)).await {
                uploader.abort().await;
                return Err(e);
            }
        }

        uploader.finish().await
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|source| read_error(path, source))?
            .len();

        if size > MULTIPART_THRESHOLD {
            self.put_multipart(bucket, key, path, content_type).await
        } else {
            self.put_single(bucket, key, path, content_type).await
        }
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        public_object_url(self.endpoint.as_deref(), bucket, &self.region, key)
    }
}

struct MultipartUploader<'a> {
    storage: &'a StorageService,
    bucket: &'a str,
    key: &'a str,
    upload_id: String,
    parts: Vec<CompletedPart>,
    part_number: i32,
}

impl<'a> MultipartUploader<'a> {
    async fn new(
        storage: &'a StorageService,
        bucket: &'a str,
        key: &'a str,
        content_type: &str,
    ) -> Result<Self, StorageError> {
        let result = storage
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| upload_error(key, format!("Failed to initiate upload: {}", sdk_message(e))))?;

        let upload_id = result
            .upload_id
            .ok_or_else(|| upload_error(key, "No upload id returned".to_string()))?;

        Ok(Self {
            storage,
            bucket,
            key,
            upload_id,
            parts: Vec::new(),
            part_number: 1,
        })
    }

    async fn upload_part(&mut self, body: Bytes) -> Result<(), StorageError> {
        let result = self
            .storage
            .client
            .upload_part()
            .bucket(self.bucket)
            .key(self.key)
            .upload_id(&self.upload_id)
            .part_number(self.part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                upload_error(
                    self.key,
                    format!("Failed to upload part {}: {}", self.part_number, sdk_message(e)),
                )
            })?;

        let e_tag = result.e_tag.ok_or_else(|| {
            upload_error(self.key, format!("Part {} returned no ETag", self.part_number))
        })?;

        self.parts.push(
            CompletedPart::builder()
                .e_tag(e_tag)
                .part_number(self.part_number)
                .build(),
        );
        self.part_number += 1;

        Ok(())
    }

    async fn finish(self) -> Result<(), StorageError> {
        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(self.parts.clone()))
            .build();

        let result = self
            .storage
            .client
            .complete_multipart_upload()
            .bucket(self.bucket)
            .key(self.key)
            .upload_id(&self.upload_id)
            .multipart_upload(completed)
            .send()
            .await;

        if let Err(e) = result {
            let message = format!("Failed to complete upload: {}", sdk_message(e));
            self.abort().await;
            return Err(upload_error(self.key, message));
        }

        Ok(())
    }

    /// Best effort; a failed abort leaves parts for the bucket lifecycle rule.
    async fn abort(&self) {
        let result = self
            .storage
            .client
            .abort_multipart_upload()
            .bucket(self.bucket)
            .key(self.key)
            .upload_id(&self.upload_id)
            .send()
            .await;

        if let Err(e) = result {
            warn!(key = self.key, error = %sdk_message(e), "Failed to abort multipart upload");
        }
    }
}

fn sdk_message<E>(err: E) -> String
where
    aws_sdk_s3::Error: From<E>,
{
    aws_sdk_s3::Error::from(err).to_string()
}

fn upload_error(key: &str, message: String) -> StorageError {
    StorageError::Upload {
        key: key.to_string(),
        message,
    }
}

fn read_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Read {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: Option<&str>) -> StorageConfig {
        StorageConfig {
            bucket: "tubely".to_string(),
            region: "eu-west-1".to_string(),
            endpoint: endpoint.map(str::to_string),
            access_key: "key".to_string(),
            secret_key: "secret".to_string(),
        }
    }

    #[test]
    fn rejects_malformed_endpoint() {
        assert!(StorageService::new(&config(Some("not a url"))).is_err());
    }

    #[test]
    fn public_url_follows_configured_addressing() {
        let aws = StorageService::new(&config(None)).unwrap();
        assert_eq!(
            aws.public_url("tubely", "portrait/k.mp4"),
            "https://tubely.s3.eu-west-1.amazonaws.com/portrait/k.mp4"
        );

        let minio = StorageService::new(&config(Some("http://minio:9000"))).unwrap();
        assert_eq!(
            minio.public_url("tubely", "portrait/k.mp4"),
            "http://minio:9000/tubely/portrait/k.mp4"
        );
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let storage = StorageService::new(&config(Some("http://127.0.0.1:1"))).unwrap();
        let err = storage
            .put_file("tubely", "other/k.mp4", Path::new("/nonexistent/file.mp4"), "video/mp4")
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Read { .. }));
    }
}

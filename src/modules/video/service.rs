//! The upload pipeline: validate, ingest, probe, optimize, publish, commit.
//!
//! Concurrent uploads for the same video are not serialized. Each run
//! publishes under its own fresh key and the last commit wins.

use super::content_type::VideoContentType;
use super::error::UploadError;
use super::geometry::{self, AspectClass};
use super::ingest;
use super::keys;
use super::model::Video;
use super::optimizer;
use super::publisher;
use crate::common::upload::release_temp;
use crate::state::AppState;
use axum::extract::Multipart;
use std::fmt;
use std::future::Future;
use tempfile::TempPath;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Ingesting,
    Probing,
    Optimizing,
    Publishing,
    Committing,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Ingesting => "ingesting",
            PipelineStage::Probing => "probing",
            PipelineStage::Optimizing => "optimizing",
            PipelineStage::Publishing => "publishing",
            PipelineStage::Committing => "committing",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// State for one pipeline run. Owns both temp files; they are removed when
/// the job is released or dropped, whichever comes first.
#[derive(Debug)]
pub struct UploadJob {
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub content_type: Option<VideoContentType>,
    pub aspect: AspectClass,
    pub object_key: Option<String>,
    pub public_url: Option<String>,
    source: Option<TempPath>,
    optimized: Option<TempPath>,
    stage: PipelineStage,
}

impl UploadJob {
    pub fn new(video_id: Uuid, owner_id: Uuid) -> Self {
        Self {
            video_id,
            owner_id,
            content_type: None,
            aspect: AspectClass::Other,
            object_key: None,
            public_url: None,
            source: None,
            optimized: None,
            stage: PipelineStage::Validating,
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    fn advance(&mut self, next: PipelineStage) {
        debug!(from = %self.stage, to = %next, "Pipeline transition");
        self.stage = next;
    }

    /// Removes whatever temp files the job still holds. Safe to call more
    /// than once.
    pub fn release(&mut self) {
        if let Some(path) = self.optimized.take() {
            release_temp(path);
        }
        if let Some(path) = self.source.take() {
            release_temp(path);
        }
    }
}

impl Drop for UploadJob {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct UploadService;

impl UploadService {
    /// Runs the full pipeline for `video_id` on behalf of `owner_id`.
    ///
    /// Returns the updated record. On every exit, including cancellation
    /// through `cancel`, both temp files are gone before this returns.
    #[tracing::instrument(name = "upload_pipeline", skip_all, fields(video_id = %video_id, owner_id = %owner_id))]
    pub async fn upload_video(
        state: &AppState,
        video_id: Uuid,
        owner_id: Uuid,
        mut multipart: Multipart,
        cancel: &CancellationToken,
    ) -> Result<Video, UploadError> {
        let mut job = UploadJob::new(video_id, owner_id);

        let result = Self::drive(state, &mut job, &mut multipart, cancel).await;
        job.release();

        match &result {
            Ok(_) => {
                job.advance(PipelineStage::Done);
                info!(
                    aspect = %job.aspect,
                    object_key = job.object_key.as_deref().unwrap_or_default(),
                    "Upload pipeline finished"
                );
            }
            Err(e) if e.status_code().is_server_error() => {
                error!(
                    stage = %job.stage(),
                    status = e.status_code().as_u16(),
                    error = %e,
                    "Upload pipeline aborted"
                );
            }
            Err(e) => {
                warn!(
                    stage = %job.stage(),
                    status = e.status_code().as_u16(),
                    error = %e,
                    "Upload pipeline aborted"
                );
            }
        }

        result
    }

    async fn drive(
        state: &AppState,
        job: &mut UploadJob,
        multipart: &mut Multipart,
        cancel: &CancellationToken,
    ) -> Result<Video, UploadError> {
        let video = until_cancelled(cancel, state.videos.get_video(job.video_id))
            .await?
            .map_err(|e| UploadError::Internal(format!("Unable to get video metadata: {}", e)))?
            .ok_or_else(|| UploadError::NotFound("Video not found".to_string()))?;

        if video.user_id != job.owner_id {
            return Err(UploadError::Forbidden(
                "Caller does not own this video".to_string(),
            ));
        }

        job.advance(PipelineStage::Ingesting);
        let ingested = until_cancelled(cancel, ingest::ingest(multipart, &state.config.upload)).await??;
        let content_type = ingested.content_type;
        let source_path = ingested.source.to_path_buf();
        job.content_type = Some(content_type);
        job.source = Some(ingested.source);

        job.advance(PipelineStage::Probing);
        job.aspect = until_cancelled(
            cancel,
            geometry::probe_aspect(state.inspector.as_ref(), &source_path),
        )
        .await?;

        job.advance(PipelineStage::Optimizing);
        let optimized = until_cancelled(
            cancel,
            optimizer::optimize(state.remuxer.as_ref(), &source_path),
        )
        .await??;
        let optimized_path = optimized.to_path_buf();
        job.optimized = Some(optimized);

        job.advance(PipelineStage::Publishing);
        let key = keys::object_key(job.aspect, content_type.extension(), state.entropy.as_ref());
        job.object_key = Some(key.clone());
        let published = until_cancelled(
            cancel,
            publisher::publish(
                state.storage.as_ref(),
                &state.config.storage.bucket,
                key,
                &optimized_path,
                content_type,
            ),
        )
        .await??;
        job.public_url = Some(published.url.clone());

        // Past this point the object exists. A failed commit leaves it
        // orphaned for out-of-band collection.
        job.advance(PipelineStage::Committing);
        let updated = until_cancelled(
            cancel,
            state.videos.update_video_url(job.video_id, &published.url),
        )
        .await?
        .map_err(|e| UploadError::Storage(format!("Unable to update video metadata: {}", e)))?;

        Ok(updated)
    }
}

async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, UploadError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(UploadError::Cancelled),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::upload::stage_stream;
    use bytes::Bytes;
    use futures_util::stream;
    use std::convert::Infallible;

    async fn staged(dir: &std::path::Path) -> TempPath {
        let chunks = stream::iter(vec![Ok::<_, Infallible>(Bytes::from_static(b"mp4"))]);
        stage_stream(chunks, dir, "mp4", 1024).await.unwrap().path
    }

    #[tokio::test]
    async fn dropping_a_job_removes_its_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = UploadJob::new(Uuid::new_v4(), Uuid::new_v4());

        let source = staged(dir.path()).await;
        let optimized_path = optimizer::optimized_path_for(&source);
        std::fs::write(&optimized_path, b"moov").unwrap();
        job.optimized = Some(TempPath::try_from_path(&optimized_path).unwrap());
        job.source = Some(source);

        drop(job);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn release_twice_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = UploadJob::new(Uuid::new_v4(), Uuid::new_v4());
        job.source = Some(staged(dir.path()).await);

        job.release();
        job.release();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let out = until_cancelled(&cancel, std::future::pending::<()>()).await;
        assert!(matches!(out, Err(UploadError::Cancelled)));
    }

    #[test]
    fn new_job_starts_validating_with_other() {
        let job = UploadJob::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(job.stage(), PipelineStage::Validating);
        assert_eq!(job.aspect, AspectClass::Other);
    }
}

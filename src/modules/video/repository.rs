use super::model::Video;
use crate::infrastructure::db::pool::DbPool;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use uuid::Uuid;

/// The metadata store as the upload pipeline sees it.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>>;

    /// Overwrites `video_url` and returns the updated record.
    async fn update_video_url(&self, id: Uuid, video_url: &str) -> Result<Video>;
}

/// Postgres-backed store over the `videos` table.
#[derive(Clone)]
pub struct VideoRepository {
    pool: DbPool,
}

impl VideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoStore for VideoRepository {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(
            r#"
            SELECT id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    async fn update_video_url(&self, id: Uuid, video_url: &str) -> Result<Video> {
        let video = sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos
            SET video_url = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at
            "#,
        )
        .bind(video_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to update video url: {}", e))?
        .ok_or_else(|| anyhow!("Video not found"))?;

        Ok(video)
    }
}

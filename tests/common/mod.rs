#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;
use time::OffsetDateTime;
use uuid::Uuid;

use tubely::app::create_app;
use tubely::common::security::create_access_token;
use tubely::config::settings::{AppConfig, StorageConfig, UploadConfig};
use tubely::infrastructure::media::{Geometry, MediaInspector, MediaRemuxer, MediaToolError};
use tubely::infrastructure::storage::{ObjectStore, StorageError, public_object_url};
use tubely::modules::video::keys::EntropySource;
use tubely::modules::video::model::Video;
use tubely::modules::video::repository::VideoStore;
use tubely::state::AppState;

pub const JWT_SECRET: &str = "test-secret";
pub const BUCKET: &str = "tubely-test";
pub const REGION: &str = "us-east-1";
pub const BOUNDARY: &str = "tubely-test-boundary";

#[derive(Default)]
pub struct InMemoryVideoStore {
    pub videos: Mutex<HashMap<Uuid, Video>>,
    pub fail_commit: bool,
}

impl InMemoryVideoStore {
    pub fn with_video(video: Video) -> Self {
        let store = Self::default();
        store.videos.lock().unwrap().insert(video.id, video);
        store
    }

    pub fn video(&self, id: Uuid) -> Video {
        self.videos.lock().unwrap()[&id].clone()
    }
}

#[async_trait]
impl VideoStore for InMemoryVideoStore {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>> {
        Ok(self.videos.lock().unwrap().get(&id).cloned())
    }

    async fn update_video_url(&self, id: Uuid, video_url: &str) -> Result<Video> {
        if self.fail_commit {
            return Err(anyhow!("connection refused"));
        }
        let mut videos = self.videos.lock().unwrap();
        let video = videos.get_mut(&id).ok_or_else(|| anyhow!("Video not found"))?;
        video.video_url = Some(video_url.to_string());
        video.updated_at = OffsetDateTime::now_utc();
        Ok(video.clone())
    }
}

/// Returns fixed dimensions, or fails like a missing ffprobe.
pub struct FakeInspector(pub Option<Geometry>);

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn video_geometry(&self, path: &Path) -> Result<Geometry, MediaToolError> {
        assert!(path.exists(), "probe ran against a missing file");
        self.0.ok_or(MediaToolError::NoVideoStream)
    }
}

pub enum FakeRemuxer {
    Copy,
    /// Writes half an output file, then reports failure.
    FailPartway,
    /// Writes half an output file, signals, then never returns.
    HangPartway(Arc<Notify>),
}

#[async_trait]
impl MediaRemuxer for FakeRemuxer {
    async fn remux_faststart(&self, source: &Path, output: &Path) -> Result<(), MediaToolError> {
        match self {
            FakeRemuxer::Copy => {
                tokio::fs::copy(source, output).await.unwrap();
                Ok(())
            }
            FakeRemuxer::FailPartway => {
                tokio::fs::write(output, b"partial").await.unwrap();
                Err(MediaToolError::MissingOutput {
                    tool: "ffmpeg",
                    path: output.display().to_string(),
                })
            }
            FakeRemuxer::HangPartway(started) => {
                tokio::fs::write(output, b"partial").await.unwrap();
                started.notify_one();
                std::future::pending().await
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

#[derive(Default)]
pub struct RecordingObjectStore {
    pub objects: Mutex<Vec<StoredObject>>,
    pub fail: bool,
}

impl RecordingObjectStore {
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Upload {
                key: key.to_string(),
                message: "AccessDenied".to_string(),
            });
        }
        let body = tokio::fs::read(path)
            .await
            .map_err(|source| StorageError::Read {
                path: path.display().to_string(),
                source,
            })?;
        self.objects.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            body,
        });
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        public_object_url(None, bucket, REGION, key)
    }
}

pub struct FixedEntropy(pub u8);

impl EntropySource for FixedEntropy {
    fn fill(&self, buf: &mut [u8]) {
        buf.fill(self.0);
    }
}

pub fn sample_video(owner: Uuid) -> Video {
    let now = OffsetDateTime::now_utc();
    Video {
        id: Uuid::new_v4(),
        user_id: owner,
        title: "Boots demo".to_string(),
        description: Some("A short clip".to_string()),
        thumbnail_url: None,
        video_url: None,
        created_at: now,
        updated_at: now,
    }
}

pub struct TestAppBuilder {
    inspector: FakeInspector,
    remuxer: FakeRemuxer,
    fail_storage: bool,
    fail_commit: bool,
    max_bytes: u64,
    remux_started: Arc<Notify>,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self {
            inspector: FakeInspector(Some(Geometry {
                width: 1920,
                height: 1080,
            })),
            remuxer: FakeRemuxer::Copy,
            fail_storage: false,
            fail_commit: false,
            max_bytes: 1 << 20,
            remux_started: Arc::new(Notify::new()),
        }
    }
}

impl TestAppBuilder {
    pub fn geometry(mut self, width: u32, height: u32) -> Self {
        self.inspector = FakeInspector(Some(Geometry { width, height }));
        self
    }

    pub fn probe_fails(mut self) -> Self {
        self.inspector = FakeInspector(None);
        self
    }

    pub fn remux_fails(mut self) -> Self {
        self.remuxer = FakeRemuxer::FailPartway;
        self
    }

    /// The remuxer stalls mid-write; `TestApp::remux_started` fires once
    /// both temp files exist.
    pub fn remux_hangs(mut self) -> Self {
        self.remuxer = FakeRemuxer::HangPartway(self.remux_started.clone());
        self
    }

    pub fn storage_fails(mut self) -> Self {
        self.fail_storage = true;
        self
    }

    pub fn commit_fails(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn build(self) -> TestApp {
        let temp = tempfile::tempdir().unwrap();
        let owner = Uuid::new_v4();
        let video = sample_video(owner);
        let video_id = video.id;

        let mut store = InMemoryVideoStore::with_video(video);
        store.fail_commit = self.fail_commit;
        let store = Arc::new(store);
        let objects = Arc::new(RecordingObjectStore {
            fail: self.fail_storage,
            ..Default::default()
        });

        let config = AppConfig {
            server_port: 0,
            database_url: String::new(),
            database_max_connections: 1,
            jwt_secret: JWT_SECRET.to_string(),
            storage: StorageConfig {
                bucket: BUCKET.to_string(),
                region: REGION.to_string(),
                endpoint: None,
                access_key: String::new(),
                secret_key: String::new(),
            },
            upload: UploadConfig {
                max_bytes: self.max_bytes,
                temp_dir: temp.path().to_path_buf(),
                ..UploadConfig::default()
            },
        };

        let state = AppState::new(
            config,
            store.clone(),
            objects.clone(),
            Arc::new(self.inspector),
            Arc::new(self.remuxer),
            Arc::new(FixedEntropy(0)),
        );

        TestApp {
            router: create_app(state.clone()),
            state,
            store,
            objects,
            temp,
            owner,
            video_id,
            remux_started: self.remux_started,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryVideoStore>,
    pub objects: Arc<RecordingObjectStore>,
    pub temp: TempDir,
    pub owner: Uuid,
    pub video_id: Uuid,
    pub remux_started: Arc<Notify>,
}

impl TestApp {
    pub fn owner_token(&self) -> String {
        token_for(self.owner)
    }

    pub fn upload_uri(&self) -> String {
        format!("/api/v1/videos/{}/upload", self.video_id)
    }

    pub fn temp_entries(&self) -> usize {
        std::fs::read_dir(self.temp.path()).unwrap().count()
    }
}

pub fn token_for(user: Uuid) -> String {
    create_access_token(user, JWT_SECRET, 3600).unwrap()
}

/// One-part multipart body carrying `bytes` as `field` with the given type.
pub fn multipart_body(field: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"clip.mp4\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(uri: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

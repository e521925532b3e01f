use crate::config::env::{self, EnvKey};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Hard ceiling on an upload request body.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1 << 30;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint such as MinIO. Unset means AWS.
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub temp_dir: PathBuf,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub probe_timeout_secs: u64,
    pub remux_timeout_secs: u64,
}

impl UploadConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn remux_timeout(&self) -> Duration {
        Duration::from_secs(self.remux_timeout_secs)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            temp_dir: std::env::temp_dir(),
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            probe_timeout_secs: 30,
            remux_timeout_secs: 900,
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        let defaults = UploadConfig::default();

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 8091),
            database_url: env::get(EnvKey::DatabaseUrl)?,
            database_max_connections: env::get_parsed(EnvKey::DatabaseMaxConnections, 10),
            jwt_secret: env::get(EnvKey::JwtSecret)?,
            storage: StorageConfig {
                bucket: env::get(EnvKey::S3Bucket)?,
                region: env::get_or(EnvKey::S3Region, "us-east-1"),
                endpoint: env::get_opt(EnvKey::S3Endpoint),
                access_key: env::get(EnvKey::S3AccessKey)?,
                secret_key: env::get(EnvKey::S3SecretKey)?,
            },
            upload: UploadConfig {
                max_bytes: env::get_parsed(EnvKey::UploadMaxBytes, defaults.max_bytes),
                temp_dir: env::get_opt(EnvKey::UploadTempDir)
                    .map(PathBuf::from)
                    .unwrap_or(defaults.temp_dir),
                ffprobe_path: env::get_or(EnvKey::FfprobePath, &defaults.ffprobe_path),
                ffmpeg_path: env::get_or(EnvKey::FfmpegPath, &defaults.ffmpeg_path),
                probe_timeout_secs: env::get_parsed(
                    EnvKey::ProbeTimeoutSecs,
                    defaults.probe_timeout_secs,
                ),
                remux_timeout_secs: env::get_parsed(
                    EnvKey::RemuxTimeoutSecs,
                    defaults.remux_timeout_secs,
                ),
            },
        })
    }
}

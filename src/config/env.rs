use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    DatabaseMaxConnections,
    JwtSecret,
    S3Bucket,
    S3Region,
    S3Endpoint,
    S3AccessKey,
    S3SecretKey,
    UploadMaxBytes,
    UploadTempDir,
    FfprobePath,
    FfmpegPath,
    ProbeTimeoutSecs,
    RemuxTimeoutSecs,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::DatabaseMaxConnections => "DATABASE_MAX_CONNECTIONS",
            EnvKey::JwtSecret => "JWT_SECRET",
            EnvKey::S3Bucket => "S3_BUCKET",
            EnvKey::S3Region => "S3_REGION",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::S3AccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::S3SecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::UploadMaxBytes => "UPLOAD_MAX_BYTES",
            EnvKey::UploadTempDir => "UPLOAD_TEMP_DIR",
            EnvKey::FfprobePath => "FFPROBE_PATH",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::ProbeTimeoutSecs => "PROBE_TIMEOUT_SECS",
            EnvKey::RemuxTimeoutSecs => "REMUX_TIMEOUT_SECS",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank values both count as absent.
pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str())
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    parse_or(get(key).ok().as_deref(), default)
}

fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    match raw {
        Some(val) => val.trim().parse::<T>().unwrap_or(default),
        None => default,
    }
}

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tubely::app;
use tubely::config::settings::AppConfig;
use tubely::infrastructure::db::pool::connect_to_db;
use tubely::infrastructure::media::{Ffmpeg, Ffprobe};
use tubely::infrastructure::storage::StorageService;
use tubely::modules::video::keys::SystemEntropy;
use tubely::modules::video::repository::VideoRepository;
use tubely::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tubely=info,tower_http=info")),
        )
        .init();

    info!("Starting server...");

    let config = AppConfig::new().context("Missing required environment variable")?;

    tokio::fs::create_dir_all(&config.upload.temp_dir)
        .await
        .with_context(|| format!("Cannot create {}", config.upload.temp_dir.display()))?;

    let db = connect_to_db(&config.database_url, config.database_max_connections).await?;
    let storage = StorageService::new(&config.storage)?;

    let state = AppState::new(
        config.clone(),
        Arc::new(VideoRepository::new(db)),
        Arc::new(storage),
        Arc::new(Ffprobe::new(
            config.upload.ffprobe_path.clone(),
            config.upload.probe_timeout(),
        )),
        Arc::new(Ffmpeg::new(
            config.upload.ffmpeg_path.clone(),
            config.upload.remux_timeout(),
        )),
        Arc::new(SystemEntropy),
    );
    let shutdown = state.shutdown.clone();

    let app = app::create_app(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

/// Waits for Ctrl-C or SIGTERM, then cancels in-flight uploads.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown requested, cancelling in-flight uploads");
    token.cancel();
}

use crate::config::settings::AppConfig;
use crate::infrastructure::media::{MediaInspector, MediaRemuxer};
use crate::infrastructure::storage::ObjectStore;
use crate::modules::video::keys::EntropySource;
use crate::modules::video::repository::VideoStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub videos: Arc<dyn VideoStore>,
    pub storage: Arc<dyn ObjectStore>,
    pub inspector: Arc<dyn MediaInspector>,
    pub remuxer: Arc<dyn MediaRemuxer>,
    pub entropy: Arc<dyn EntropySource>,
    /// Cancelled on shutdown; every upload runs under a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        videos: Arc<dyn VideoStore>,
        storage: Arc<dyn ObjectStore>,
        inspector: Arc<dyn MediaInspector>,
        remuxer: Arc<dyn MediaRemuxer>,
        entropy: Arc<dyn EntropySource>,
    ) -> Self {
        Self {
            config,
            videos,
            storage,
            inspector,
            remuxer,
            entropy,
            shutdown: CancellationToken::new(),
        }
    }
}

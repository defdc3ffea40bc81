//! HTTP handlers and shared application state

pub mod search;
pub mod system;
pub mod torrents;

pub use search::{resolve_cover, search};
pub use system::{api_test, health_check};
pub use torrents::add_torrent;

use crate::cache::SqliteCoverCache;
use crate::core::config::Config;
use crate::core::dispatch::DispatchService;
use crate::core::error::Result;
use crate::core::search::SearchService;
use crate::covers::{self, CoverResolver};
use crate::db::manager::DatabaseManager;
use crate::db::repository::{CoverRepository, UserRepository};
use crate::downloader::QbittorrentClient;
use crate::index::{MamClient, TorrentIndex};
use crate::notify::{NoopNotifier, Notifier, WebhookNotifier};
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub user_repo: Arc<UserRepository>,
    pub cover_resolver: Arc<CoverResolver>,
    pub search_service: Arc<SearchService>,
    pub dispatch_service: Arc<DispatchService>,
    pub jwt_secret: Arc<String>,
}

impl AppState {
    /// Wire the production adapters from configuration
    pub fn from_config(config: Config, db: Arc<DatabaseManager>) -> Result<Self> {
        let index: Arc<dyn TorrentIndex> = Arc::new(MamClient::new(&config.index)?);
        let download_client = Arc::new(QbittorrentClient::new(&config.download_client)?);

        let notifier: Arc<dyn Notifier> =
            match WebhookNotifier::from_config(&config.notifications)? {
                Some(webhook) => Arc::new(webhook),
                None => Arc::new(NoopNotifier),
            };

        let cache = Arc::new(SqliteCoverCache::new(CoverRepository::new(db.clone())));
        let cover_resolver = Arc::new(CoverResolver::new(
            cache,
            covers::default_providers(&config.covers)?,
            &config.covers,
        ));

        let search_service = Arc::new(SearchService::new(index.clone(), cover_resolver.clone()));
        let dispatch_service = Arc::new(DispatchService::new(
            index,
            download_client,
            notifier,
            config.download_client.save_path.clone(),
        ));

        Ok(Self {
            jwt_secret: Arc::new(config.security.jwt_secret.clone()),
            config: Arc::new(config),
            user_repo: Arc::new(UserRepository::new(db)),
            cover_resolver,
            search_service,
            dispatch_service,
        })
    }
}

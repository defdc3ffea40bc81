//! Torrent dispatch
//!
//! Moves one torrent from the index to the download client:
//! fetch the `.torrent` file, log in, upload, then announce it.
//! Each step runs once; the first failure aborts the rest.

use crate::core::error::Result;
use crate::downloader::DownloadClient;
use crate::index::TorrentIndex;
use crate::notify::{NotificationEvent, Notifier};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Successful dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReceipt {
    pub torrent_id: u64,
    pub save_path: String,
}

impl DispatchReceipt {
    pub fn detail(&self) -> String {
        format!("Torrent {} added successfully", self.torrent_id)
    }
}

pub struct DispatchService {
    index: Arc<dyn TorrentIndex>,
    download_client: Arc<dyn DownloadClient>,
    notifier: Arc<dyn Notifier>,
    save_path: String,
}

impl DispatchService {
    pub fn new(
        index: Arc<dyn TorrentIndex>,
        download_client: Arc<dyn DownloadClient>,
        notifier: Arc<dyn Notifier>,
        save_path: impl Into<String>,
    ) -> Self {
        Self {
            index,
            download_client,
            notifier,
            save_path: save_path.into(),
        }
    }

    pub async fn dispatch(
        &self,
        actor: &str,
        torrent_id: u64,
        title: Option<String>,
    ) -> Result<DispatchReceipt> {
        info!(actor, torrent_id, "dispatch");

        let artifact = self.index.fetch_torrent(torrent_id).await.map_err(|e| {
            warn!(actor, torrent_id, error = %e, "Torrent fetch failed");
            e
        })?;

        let session = self.download_client.login().await.map_err(|e| {
            warn!(actor, torrent_id, error = %e, "Download client login failed");
            e
        })?;

        self.download_client
            .add_torrent(&session, &artifact, &self.save_path)
            .await
            .map_err(|e| {
                warn!(actor, torrent_id, error = %e, "Torrent upload failed");
                e
            })?;

        info!(actor, torrent_id, save_path = %self.save_path, "Torrent added to download client");

        self.notifier.notify(NotificationEvent {
            actor: actor.to_string(),
            torrent_id,
            title,
        });

        Ok(DispatchReceipt {
            torrent_id,
            save_path: self.save_path.clone(),
        })
    }
}

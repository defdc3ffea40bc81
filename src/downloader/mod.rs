//! Remote download client
//!
//! A session is opened per dispatch and dropped with it; nothing is pooled
//! between calls.

pub mod qbittorrent;

pub use qbittorrent::QbittorrentClient;

use crate::core::error::Result;
use crate::index::TorrentArtifact;
use async_trait::async_trait;

/// Authenticated session with the download client
///
/// Holds the `SID` cookie value returned by the login call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    sid: Option<String>,
}

impl ClientSession {
    pub fn new(sid: Option<String>) -> Self {
        Self { sid }
    }

    /// Value for the `Cookie` header, if the client issued one
    pub fn cookie(&self) -> Option<String> {
        self.sid.as_ref().map(|sid| format!("SID={}", sid))
    }
}

#[async_trait]
pub trait DownloadClient: Send + Sync {
    async fn login(&self) -> Result<ClientSession>;

    async fn add_torrent(
        &self,
        session: &ClientSession,
        artifact: &TorrentArtifact,
        save_path: &str,
    ) -> Result<()>;
}

/// Pull the SID value out of a `Set-Cookie` header value
pub fn parse_sid(set_cookie: &str) -> Option<String> {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.trim().strip_prefix("SID="))
        .filter(|sid| !sid.is_empty())
        .map(str::to_string)
}

//! Private torrent index
//!
//! The index is searched for audiobook torrents and serves the `.torrent`
//! file that is later handed to the download client.

pub mod mam;

pub use mam::MamClient;

use crate::core::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Column the index matches the search text against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    #[default]
    Title,
    Author,
    Series,
    Narrator,
}

impl SearchField {
    /// Unknown values fall back to [`SearchField::Title`]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw {
            "title" => SearchField::Title,
            "author" => SearchField::Author,
            "series" => SearchField::Series,
            "narrator" => SearchField::Narrator,
            _ => SearchField::Title,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Author => "author",
            SearchField::Series => "series",
            SearchField::Narrator => "narrator",
        }
    }
}

/// One search hit as the index reports it
///
/// The index is inconsistent about numbers vs strings, so fields are read
/// leniently and unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndexTorrent {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub series: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub catname: Option<String>,
    /// Passed through as sent: a byte count or a formatted string
    #[serde(default)]
    pub size: Option<Value>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub seeders: Option<u64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub filetype: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub filetypes: Option<String>,
}

/// Raw `.torrent` bytes fetched for a single dispatch
#[derive(Debug, Clone)]
pub struct TorrentArtifact {
    pub torrent_id: u64,
    pub bytes: Bytes,
}

impl TorrentArtifact {
    /// File name used for the multipart upload
    pub fn file_name(&self) -> String {
        format!("{}.torrent", self.torrent_id)
    }
}

#[async_trait]
pub trait TorrentIndex: Send + Sync {
    /// One search request; returns the records in the order the index sent them
    async fn search(&self, query: &str, field: SearchField) -> Result<Vec<IndexTorrent>>;

    /// Download the `.torrent` file for `torrent_id`
    async fn fetch_torrent(&self, torrent_id: u64) -> Result<TorrentArtifact>;
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

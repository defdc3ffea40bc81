use serde::{Deserialize, Serialize};

/// Body of POST /api/add
#[derive(Debug, Deserialize)]
pub struct AddTorrentRequest {
    pub tid: u64,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddTorrentResponse {
    pub status: String,
    pub detail: String,
}

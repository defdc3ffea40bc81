//! API request and response models

pub mod search;
pub mod torrents;

pub use search::{CoverParams, CoverResponse, SearchParams};
pub use torrents::{AddTorrentRequest, AddTorrentResponse};

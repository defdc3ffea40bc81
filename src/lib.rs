//! Shelfdrop
//!
//! Audiobook search gateway: queries a private torrent index, decorates the
//! hits with cover art, and hands chosen torrents to a qBittorrent daemon.

pub mod api;
pub mod auth;
pub mod cache;
pub mod core;
pub mod covers;
pub mod db;
pub mod downloader;
pub mod index;
pub mod notify;

// Re-export commonly used types
pub use api::ApiServer;
pub use crate::core::{Config, GatewayError};
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type alias for the library
pub type Result<T> = anyhow::Result<T>;

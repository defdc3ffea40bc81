//! Core application layer
//!
//! - Configuration management
//! - Structured logging
//! - Error types
//! - Search enrichment and torrent dispatch services

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod search;

pub use config::Config;
pub use dispatch::{DispatchReceipt, DispatchService};
pub use error::{ErrorContext, ErrorResponse, GatewayError, Result};
pub use logging::Logger;
pub use search::{EnrichedResult, SearchService};

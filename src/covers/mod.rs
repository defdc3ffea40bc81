//! Cover art lookup
//!
//! Three public catalogs are queried in a fixed priority order, with the
//! outcome memoized in the cover cache:
//! - [`itunes`]: audiobook artwork, upscaled to 600x600
//! - [`google_books`]: volume thumbnails, forced to https
//! - [`open_library`]: cover ids turned into large cover URLs
//!
//! [`resolver::CoverResolver`] owns the cascade.

pub mod google_books;
pub mod itunes;
pub mod open_library;
pub mod provider;
pub mod resolver;

pub use provider::CoverProvider;
pub use resolver::CoverResolver;

use crate::core::config::CoversConfig;
use crate::core::error::{GatewayError, Result};
use std::sync::Arc;
use thiserror::Error;

/// Errors a single provider can produce; always recovered by the cascade
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::Status(status.as_u16())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Normalized cover lookup key
///
/// Fields are only reachable through [`CoverQuery::new`], which trims them,
/// so the cache key and the provider queries always agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverQuery {
    title: String,
    author: String,
}

impl CoverQuery {
    pub fn new(title: &str, author: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            author: author.trim().to_string(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
    }

    /// Free-text query shared by the iTunes and Google Books lookups
    pub fn composite(&self) -> String {
        format!("{} {} audiobook", self.title, self.author)
            .trim()
            .to_string()
    }
}

/// Build the production provider chain in priority order
pub fn default_providers(config: &CoversConfig) -> Result<Vec<Arc<dyn CoverProvider>>> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| GatewayError::InitializationError(format!("Cover HTTP client: {}", e)))?;

    let providers: Vec<Arc<dyn CoverProvider>> = vec![
        Arc::new(itunes::ItunesProvider::new(client.clone(), &config.itunes_url)),
        Arc::new(google_books::GoogleBooksProvider::new(
            client.clone(),
            &config.google_books_url,
        )),
        Arc::new(open_library::OpenLibraryProvider::new(client, &config.open_library_url)),
    ];
    Ok(providers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_trimmed() {
        let query = CoverQuery::new("  Dune ", "\tHerbert\n");
        assert_eq!(query.title(), "Dune");
        assert_eq!(query.author(), "Herbert");
        assert_eq!(query.composite(), "Dune Herbert audiobook");
    }

    #[test]
    fn test_composite_without_author() {
        let query = CoverQuery::new("Dune", "");
        assert_eq!(query.composite(), "Dune  audiobook");
    }

    #[test]
    fn test_blank_title_is_empty() {
        assert!(CoverQuery::new("   ", "Herbert").is_empty());
        assert!(!CoverQuery::new("Dune", "").is_empty());
    }

    #[test]
    fn test_default_providers_order() {
        let config = crate::core::config::Config::defaults().unwrap().covers;
        let names: Vec<_> = default_providers(&config)
            .unwrap()
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["itunes", "google_books", "open_library"]);
    }
}

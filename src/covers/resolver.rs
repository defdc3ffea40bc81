//! Cascading cover resolver
//!
//! Consults the cache, then each provider in order until one returns a
//! non-empty URL. Every outcome, including "nothing found", is written back
//! to the cache. Provider and cache failures never reach the caller.

use super::provider::CoverProvider;
use super::CoverQuery;
use crate::cache::{CachedCover, CoverCache};
use crate::core::config::CoversConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct CoverResolver {
    cache: Arc<dyn CoverCache>,
    providers: Vec<Arc<dyn CoverProvider>>,
    timeout: Duration,
    trust_negative_cache: bool,
}

impl CoverResolver {
    /// `providers` are tried in the given order
    pub fn new(
        cache: Arc<dyn CoverCache>,
        providers: Vec<Arc<dyn CoverProvider>>,
        config: &CoversConfig,
    ) -> Self {
        Self {
            cache,
            providers,
            timeout: config.timeout(),
            trust_negative_cache: config.trust_negative_cache,
        }
    }

    pub async fn resolve(&self, title: &str, author: &str) -> Option<String> {
        let query = CoverQuery::new(title, author);
        if query.is_empty() {
            return None;
        }

        match self.cache.get(query.title(), query.author()).await {
            Ok(Some(CachedCover::Found(url))) => {
                debug!(title = query.title(), "cover cache hit");
                return Some(url);
            }
            Ok(Some(CachedCover::NotFound)) if self.trust_negative_cache => {
                debug!(title = query.title(), "cover cache negative hit");
                return None;
            }
            Ok(_) => {}
            Err(e) => warn!(title = query.title(), error = %e, "Cover cache read failed"),
        }

        let found = self.cascade(&query).await;
        if found.is_none() {
            info!(title = query.title(), author = query.author(), "cover_missing");
        }

        if let Err(e) = self
            .cache
            .put(query.title(), query.author(), found.as_deref())
            .await
        {
            warn!(title = query.title(), error = %e, "Cover cache write failed");
        }

        found
    }

    async fn cascade(&self, query: &CoverQuery) -> Option<String> {
        for provider in &self.providers {
            match tokio::time::timeout(self.timeout, provider.lookup(query)).await {
                Ok(Ok(Some(url))) if !url.is_empty() => {
                    info!(title = query.title(), provider = provider.name(), "cover_resolved");
                    return Some(url);
                }
                Ok(Ok(_)) => {
                    debug!(provider = provider.name(), "provider returned no cover");
                }
                Ok(Err(e)) => {
                    debug!(provider = provider.name(), error = %e, "provider lookup failed");
                }
                Err(_) => {
                    debug!(provider = provider.name(), "provider lookup timed out");
                }
            }
        }
        None
    }
}

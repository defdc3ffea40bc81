//! Cover cache
//!
//! Persistent mapping from a normalized (title, author) pair to the outcome of
//! the last cover lookup. An entry either holds a URL or records that every
//! provider came back empty; a missing entry means the pair was never looked up.

use crate::core::error::Result;
use crate::db::repository::CoverRepository;
use async_trait::async_trait;

/// Outcome stored for a (title, author) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedCover {
    Found(String),
    NotFound,
}

impl From<Option<String>> for CachedCover {
    fn from(url: Option<String>) -> Self {
        match url {
            Some(url) => CachedCover::Found(url),
            None => CachedCover::NotFound,
        }
    }
}

#[async_trait]
pub trait CoverCache: Send + Sync {
    /// `Ok(None)` is a miss
    async fn get(&self, title: &str, author: &str) -> Result<Option<CachedCover>>;

    /// Insert or overwrite; `None` stores an explicit negative
    async fn put(&self, title: &str, author: &str, cover_url: Option<&str>) -> Result<()>;
}

/// Cover cache backed by the `covers` table
pub struct SqliteCoverCache {
    repo: CoverRepository,
}

impl SqliteCoverCache {
    pub fn new(repo: CoverRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl CoverCache for SqliteCoverCache {
    async fn get(&self, title: &str, author: &str) -> Result<Option<CachedCover>> {
        let record = self.repo.find(title, author).await?;
        Ok(record.map(|r| CachedCover::from(r.cover_url)))
    }

    async fn put(&self, title: &str, author: &str, cover_url: Option<&str>) -> Result<()> {
        self.repo.upsert(title, author, cover_url).await
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::core::error::GatewayError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory cache that counts accesses; `failing()` errors on every call
    #[derive(Default)]
    pub struct MemoryCoverCache {
        entries: Mutex<HashMap<(String, String), Option<String>>>,
        fail: bool,
        gets: AtomicUsize,
        puts: AtomicUsize,
    }

    impl MemoryCoverCache {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn seed(&self, title: &str, author: &str, cover_url: Option<&str>) {
            self.entries.lock().unwrap().insert(
                (title.to_string(), author.to_string()),
                cover_url.map(str::to_string),
            );
        }

        pub fn entry(&self, title: &str, author: &str) -> Option<Option<String>> {
            self.entries
                .lock()
                .unwrap()
                .get(&(title.to_string(), author.to_string()))
                .cloned()
        }

        pub fn gets(&self) -> usize {
            self.gets.load(Ordering::SeqCst)
        }

        pub fn puts(&self) -> usize {
            self.puts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CoverCache for MemoryCoverCache {
        async fn get(&self, title: &str, author: &str) -> Result<Option<CachedCover>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::TaskError("cache offline".into()));
            }
            Ok(self.entry(title, author).map(CachedCover::from))
        }

        async fn put(&self, title: &str, author: &str, cover_url: Option<&str>) -> Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::TaskError("cache offline".into()));
            }
            self.seed(title, author, cover_url);
            Ok(())
        }
    }
}

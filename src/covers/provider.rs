//! Cover provider trait
//!
//! Each catalog adapter implements [`CoverProvider`]; the resolver holds them
//! as trait objects so tests can substitute scripted providers.

use super::{CoverQuery, ProviderError};
use async_trait::async_trait;

#[async_trait]
pub trait CoverProvider: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Look up a cover URL; `Ok(None)` means the catalog had nothing usable
    async fn lookup(&self, query: &CoverQuery) -> Result<Option<String>, ProviderError>;
}

/// Keep only non-empty candidates
pub(crate) fn non_empty(candidate: Option<String>) -> Option<String> {
    candidate.filter(|url| !url.is_empty())
}

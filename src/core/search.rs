//! Search enrichment
//!
//! Runs one index search and decorates each hit with a cover URL.

use crate::core::error::{GatewayError, Result};
use crate::covers::CoverResolver;
use crate::index::{IndexTorrent, SearchField, TorrentIndex};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Upper bound on records enriched per search
pub const MAX_ENRICHED_RESULTS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedResult {
    pub id: Option<u64>,
    pub title: String,
    pub author: String,
    pub series: String,
    pub category: Option<String>,
    pub size: Option<serde_json::Value>,
    pub seeders: Option<u64>,
    pub filetypes: String,
    pub cover: Option<String>,
}

impl EnrichedResult {
    fn from_record(record: IndexTorrent, cover: Option<String>) -> Self {
        Self {
            id: record.id,
            title: display_title(&record),
            author: first_present([record.author.as_deref()]),
            series: first_present([record.series.as_deref()]),
            category: record.catname,
            size: record.size,
            seeders: record.seeders,
            filetypes: first_present([record.filetype.as_deref(), record.filetypes.as_deref()]),
            cover,
        }
    }
}

/// `title`, else `name`, else empty
fn display_title(record: &IndexTorrent) -> String {
    first_present([record.title.as_deref(), record.name.as_deref()])
}

fn first_present<const N: usize>(candidates: [Option<&str>; N]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_string()
}

pub struct SearchService {
    index: Arc<dyn TorrentIndex>,
    covers: Arc<CoverResolver>,
}

impl SearchService {
    pub fn new(index: Arc<dyn TorrentIndex>, covers: Arc<CoverResolver>) -> Self {
        Self { index, covers }
    }

    pub async fn search(
        &self,
        query: &str,
        field: &str,
        user: &str,
    ) -> Result<Vec<EnrichedResult>> {
        if query.trim().is_empty() {
            return Err(GatewayError::ValidationError(
                "Search query cannot be empty".to_string(),
            ));
        }
        let field = SearchField::parse_lenient(field);

        let records = self.index.search(query, field).await?;
        info!(
            user,
            query,
            field = field.as_str(),
            results = records.len(),
            "search"
        );

        let mut results = Vec::with_capacity(records.len().min(MAX_ENRICHED_RESULTS));
        for record in records.into_iter().take(MAX_ENRICHED_RESULTS) {
            let title = display_title(&record);
            let author = record.author.clone().unwrap_or_default();
            let cover = self.covers.resolve(&title, &author).await;
            results.push(EnrichedResult::from_record(record, cover));
        }

        Ok(results)
    }
}

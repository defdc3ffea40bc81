//! OpenLibrary search adapter
//!
//! Searches by title only and builds the large cover URL from `cover_i`.

use super::provider::CoverProvider;
use super::{CoverQuery, ProviderError};
use async_trait::async_trait;
use serde::Deserialize;

const COVERS_BASE: &str = "https://covers.openlibrary.org/b/id";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
pub struct SearchDoc {
    pub cover_i: Option<i64>,
}

pub struct OpenLibraryProvider {
    http_client: reqwest::Client,
    endpoint: String,
}

impl OpenLibraryProvider {
    pub fn new(http_client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CoverProvider for OpenLibraryProvider {
    fn name(&self) -> &'static str {
        "open_library"
    }

    async fn lookup(&self, query: &CoverQuery) -> Result<Option<String>, ProviderError> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("title", query.title())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.docs.first().and_then(|doc| doc.cover_i).and_then(cover_url))
    }
}

/// Large cover URL for a cover id; zero means "no cover"
pub fn cover_url(cover_id: i64) -> Option<String> {
    (cover_id != 0).then(|| format!("{}/{}-L.jpg", COVERS_BASE, cover_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;

    #[test]
    fn test_cover_url() {
        assert_eq!(
            cover_url(8231856).as_deref(),
            Some("https://covers.openlibrary.org/b/id/8231856-L.jpg")
        );
        assert_eq!(cover_url(0), None);
    }

    #[tokio::test]
    async fn test_lookup_uses_title_only() {
        let app = Router::new().route(
            "/search.json",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let docs = match params.get("title").map(String::as_str) {
                    Some("Dune") if params.len() == 1 => serde_json::json!([{ "cover_i": 42 }]),
                    _ => serde_json::json!([]),
                };
                Json(serde_json::json!({ "numFound": 1, "docs": docs }))
            }),
        );
        let base = crate::test_support::spawn_stub(app).await;

        let provider =
            OpenLibraryProvider::new(reqwest::Client::new(), format!("{base}/search.json"));
        let url = provider.lookup(&CoverQuery::new("Dune", "Herbert")).await.unwrap();
        assert_eq!(
            url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/42-L.jpg")
        );
    }

    #[tokio::test]
    async fn test_lookup_doc_without_cover() {
        let app = Router::new().route(
            "/search.json",
            get(|| async { Json(serde_json::json!({ "docs": [{ "title": "Dune" }] })) }),
        );
        let base = crate::test_support::spawn_stub(app).await;

        let provider =
            OpenLibraryProvider::new(reqwest::Client::new(), format!("{base}/search.json"));
        assert_eq!(provider.lookup(&CoverQuery::new("Dune", "")).await.unwrap(), None);
    }
}

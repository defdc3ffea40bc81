//! iTunes Search API adapter
//!
//! Queries the audiobook media type and upscales the returned artwork URL
//! from the 100px or 60px variant to 600px.

use super::provider::{non_empty, CoverProvider};
use super::{CoverQuery, ProviderError};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "resultCount", default)]
    pub result_count: u64,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "artworkUrl100")]
    pub artwork_url_100: Option<String>,
    #[serde(rename = "artworkUrl60")]
    pub artwork_url_60: Option<String>,
}

pub struct ItunesProvider {
    http_client: reqwest::Client,
    endpoint: String,
}

impl ItunesProvider {
    pub fn new(http_client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CoverProvider for ItunesProvider {
    fn name(&self) -> &'static str {
        "itunes"
    }

    async fn lookup(&self, query: &CoverQuery) -> Result<Option<String>, ProviderError> {
        let term = query.composite();
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("term", term.as_str()), ("media", "audiobook"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(extract_artwork(&body))
    }
}

/// First result's artwork, upscaled; `None` when the search came back empty
pub fn extract_artwork(response: &SearchResponse) -> Option<String> {
    if response.result_count == 0 {
        return None;
    }
    let first = response.results.first()?;
    let url = non_empty(first.artwork_url_100.clone()).or_else(|| first.artwork_url_60.clone());
    non_empty(url).map(|url| upscale_artwork(&url))
}

/// Swap the size token for the 600x600 rendition; the rest of the URL is untouched
pub fn upscale_artwork(url: &str) -> String {
    url.replace("100x100", "600x600").replace("60x60", "600x600")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;

    fn parse(json: serde_json::Value) -> SearchResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_upscale_100() {
        assert_eq!(
            upscale_artwork("https://is1.mzstatic.com/image/thumb/a/100x100bb.jpg"),
            "https://is1.mzstatic.com/image/thumb/a/600x600bb.jpg"
        );
    }

    #[test]
    fn test_upscale_60() {
        assert_eq!(
            upscale_artwork("https://is1.mzstatic.com/x/60x60bb.jpg"),
            "https://is1.mzstatic.com/x/600x600bb.jpg"
        );
    }

    #[test]
    fn test_extract_prefers_100() {
        let body = parse(serde_json::json!({
            "resultCount": 1,
            "results": [{
                "artworkUrl60": "https://img/60x60bb.jpg",
                "artworkUrl100": "https://img/100x100bb.jpg"
            }]
        }));
        assert_eq!(extract_artwork(&body).as_deref(), Some("https://img/600x600bb.jpg"));
    }

    #[test]
    fn test_extract_falls_back_to_60() {
        let body = parse(serde_json::json!({
            "resultCount": 1,
            "results": [{ "artworkUrl60": "https://img/60x60bb.jpg" }]
        }));
        assert_eq!(extract_artwork(&body).as_deref(), Some("https://img/600x600bb.jpg"));
    }

    #[test]
    fn test_extract_zero_results() {
        let body = parse(serde_json::json!({ "resultCount": 0, "results": [] }));
        assert_eq!(extract_artwork(&body), None);

        let body = parse(serde_json::json!({ "resultCount": 1, "results": [{}] }));
        assert_eq!(extract_artwork(&body), None);
    }

    #[tokio::test]
    async fn test_lookup_sends_audiobook_query() {
        let app = Router::new().route(
            "/search",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("term").map(String::as_str), Some("Dune Herbert audiobook"));
                assert_eq!(params.get("media").map(String::as_str), Some("audiobook"));
                assert_eq!(params.get("limit").map(String::as_str), Some("1"));
                Json(serde_json::json!({
                    "resultCount": 1,
                    "results": [{ "artworkUrl100": "https://img/100x100bb.jpg" }]
                }))
            }),
        );
        let base = crate::test_support::spawn_stub(app).await;

        let provider = ItunesProvider::new(reqwest::Client::new(), format!("{base}/search"));
        let url = provider.lookup(&CoverQuery::new("Dune", "Herbert")).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://img/600x600bb.jpg"));
    }

    #[tokio::test]
    async fn test_lookup_non_json_is_malformed() {
        let app = Router::new().route("/search", get(|| async { "<html>maintenance</html>" }));
        let base = crate::test_support::spawn_stub(app).await;

        let provider = ItunesProvider::new(reqwest::Client::new(), format!("{base}/search"));
        let err = provider.lookup(&CoverQuery::new("Dune", "")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }
}

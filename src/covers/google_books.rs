//! Google Books volumes API adapter

use super::provider::{non_empty, CoverProvider};
use super::{CoverQuery, ProviderError};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct VolumesResponse {
    #[serde(default)]
    pub items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
pub struct Volume {
    #[serde(rename = "volumeInfo", default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct VolumeInfo {
    #[serde(rename = "imageLinks", default)]
    pub image_links: ImageLinks,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
    #[serde(rename = "smallThumbnail")]
    pub small_thumbnail: Option<String>,
}

pub struct GoogleBooksProvider {
    http_client: reqwest::Client,
    endpoint: String,
}

impl GoogleBooksProvider {
    pub fn new(http_client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CoverProvider for GoogleBooksProvider {
    fn name(&self) -> &'static str {
        "google_books"
    }

    async fn lookup(&self, query: &CoverQuery) -> Result<Option<String>, ProviderError> {
        let q = query.composite();
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("q", q.as_str()), ("maxResults", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: VolumesResponse = response.json().await?;
        Ok(extract_thumbnail(&body))
    }
}

pub fn extract_thumbnail(response: &VolumesResponse) -> Option<String> {
    let links = &response.items.first()?.volume_info.image_links;
    let url = non_empty(links.thumbnail.clone()).or_else(|| links.small_thumbnail.clone());
    non_empty(url).map(|url| force_https(&url))
}

/// Rewrite a leading `http://` to `https://`
pub fn force_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

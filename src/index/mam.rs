//! MyAnonamouse HTTP client
//!
//! Authenticates with the account's session cookie on every request.
//! Search: POST /tor/js/loadSearchJSONbasic.php
//! Download: GET /tor/download.php?tid={id}

use super::{IndexTorrent, SearchField, TorrentArtifact, TorrentIndex};
use crate::core::config::IndexConfig;
use crate::core::error::{excerpt, GatewayError, Result, Upstream};
use async_trait::async_trait;
use reqwest::{header, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

/// Audiobooks main category
const MAIN_CATEGORY: &str = "13";
/// English
const BROWSE_LANGUAGE: &str = "1";
const PER_PAGE: u32 = 25;

pub struct MamClient {
    http_client: reqwest::Client,
    base_url: String,
    cookie: String,
    user_agent: String,
    search_timeout: Duration,
    download_timeout: Duration,
}

impl MamClient {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::InitializationError(format!("Index HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie: config.cookie.clone(),
            user_agent: config.user_agent.clone(),
            search_timeout: config.search_timeout(),
            download_timeout: config.download_timeout(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(header::COOKIE, &self.cookie)
            .header(header::USER_AGENT, &self.user_agent)
    }
}

/// Request body for the basic JSON search endpoint
pub fn search_payload(query: &str, field: SearchField) -> Value {
    json!({
        "tor": {
            "text": query,
            "srchIn": [field.as_str()],
            "searchType": "all",
            "searchIn": "torrents",
            "main_cat": [MAIN_CATEGORY],
            "cat": ["0"],
            "browse_lang": [BROWSE_LANGUAGE],
            "browseFlagsHideVsShow": "0",
            "sortType": "seedersDesc",
            "startNumber": "0",
            "perpage": PER_PAGE,
        },
        "thumbnail": "true",
    })
}

/// Parse a search response body
///
/// An object without `data` is how the index says "nothing found".
pub fn parse_search_body(body: &str) -> Result<Vec<IndexTorrent>> {
    let raw: Value =
        serde_json::from_str(body).map_err(|_| GatewayError::parse(Upstream::IndexSearch, body))?;

    let data = match raw.get("data") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(data) => data.clone(),
    };

    serde_json::from_value(data).map_err(|_| GatewayError::parse(Upstream::IndexSearch, body))
}

fn rejected(upstream: Upstream, status: StatusCode, body: String) -> GatewayError {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        GatewayError::UpstreamAuth {
            upstream,
            status: Some(status.as_u16()),
            body: excerpt(&body),
        }
    } else {
        GatewayError::UpstreamUnavailable {
            upstream,
            status: Some(status.as_u16()),
            message: excerpt(&body),
        }
    }
}

#[async_trait]
impl TorrentIndex for MamClient {
    async fn search(&self, query: &str, field: SearchField) -> Result<Vec<IndexTorrent>> {
        let request = self
            .http_client
            .post(self.url("/tor/js/loadSearchJSONbasic.php"))
            .json(&search_payload(query, field))
            .timeout(self.search_timeout);

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| GatewayError::transport(Upstream::IndexSearch, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::transport(Upstream::IndexSearch, &e))?;

        if !status.is_success() {
            return Err(rejected(Upstream::IndexSearch, status, body));
        }

        parse_search_body(&body)
    }

    async fn fetch_torrent(&self, torrent_id: u64) -> Result<TorrentArtifact> {
        let request = self
            .http_client
            .get(self.url("/tor/download.php"))
            .query(&[("tid", torrent_id)])
            .timeout(self.download_timeout);

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| GatewayError::transport(Upstream::IndexDownload, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(rejected(Upstream::IndexDownload, status, body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::transport(Upstream::IndexDownload, &e))?;

        if bytes.is_empty() {
            return Err(GatewayError::UpstreamUnavailable {
                upstream: Upstream::IndexDownload,
                status: Some(status.as_u16()),
                message: "empty torrent file".to_string(),
            });
        }

        tracing::debug!(torrent_id, size = bytes.len(), "Fetched torrent file");
        Ok(TorrentArtifact { torrent_id, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;

    fn client(base_url: &str) -> MamClient {
        let mut config = crate::core::config::Config::defaults().unwrap().index;
        config.base_url = base_url.to_string();
        config.cookie = "mam_id=abc".to_string();
        MamClient::new(&config).unwrap()
    }

    #[test]
    fn test_search_payload_shape() {
        let payload = search_payload("dune", SearchField::Narrator);
        assert_eq!(payload["tor"]["text"], "dune");
        assert_eq!(payload["tor"]["srchIn"], json!(["narrator"]));
        assert_eq!(payload["tor"]["main_cat"], json!(["13"]));
        assert_eq!(payload["tor"]["sortType"], "seedersDesc");
        assert_eq!(payload["tor"]["perpage"], 25);
        assert_eq!(payload["thumbnail"], "true");
    }

    #[test]
    fn test_parse_missing_data_is_empty() {
        let parsed = parse_search_body(r#"{"error":"Nothing returned, out of 0"}"#).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_parse_non_json() {
        let body = format!("<html>{}</html>", "x".repeat(1000));
        match parse_search_body(&body).unwrap_err() {
            GatewayError::Parse { upstream, excerpt } => {
                assert_eq!(upstream, Upstream::IndexSearch);
                assert_eq!(excerpt.chars().count(), 500);
                assert!(excerpt.starts_with("<html>"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_data_not_array() {
        let err = parse_search_body(r#"{"data":"oops"}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_search_sends_cookie_and_field() {
        let app = Router::new().route(
            "/tor/js/loadSearchJSONbasic.php",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                let cookie = headers
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "data": [{
                        "id": 7,
                        "title": body["tor"]["text"],
                        "author": cookie,
                        "series": body["tor"]["srchIn"][0],
                    }]
                }))
            }),
        );
        let base = spawn_stub(app).await;

        let results = client(&base).search("Dune", SearchField::Author).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, Some(7));
        assert_eq!(results[0].title.as_deref(), Some("Dune"));
        assert_eq!(results[0].author.as_deref(), Some("mam_id=abc"));
        assert_eq!(results[0].series.as_deref(), Some("author"));
    }

    #[tokio::test]
    async fn test_search_forbidden_is_upstream_auth() {
        let app = Router::new().route(
            "/tor/js/loadSearchJSONbasic.php",
            post(|| async { (AxumStatus::FORBIDDEN, "cookie expired") }),
        );
        let base = spawn_stub(app).await;

        let err = client(&base).search("Dune", SearchField::Title).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::UpstreamAuth {
                upstream: Upstream::IndexSearch,
                status: Some(403),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_fetch_torrent() {
        let app = Router::new().route(
            "/tor/download.php",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                match params.get("tid").map(String::as_str) {
                    Some("42") => (AxumStatus::OK, b"d8:announce0:e".to_vec()),
                    Some("7") => (AxumStatus::OK, Vec::new()),
                    _ => (AxumStatus::NOT_FOUND, b"no such torrent".to_vec()),
                }
            }),
        );
        let base = spawn_stub(app).await;
        let client = client(&base);

        let artifact = client.fetch_torrent(42).await.unwrap();
        assert_eq!(artifact.torrent_id, 42);
        assert_eq!(&artifact.bytes[..], b"d8:announce0:e");

        let err = client.fetch_torrent(1).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::UpstreamUnavailable {
                upstream: Upstream::IndexDownload,
                status: Some(404),
                ..
            }
        ));

        let err = client.fetch_torrent(7).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::UpstreamUnavailable {
                upstream: Upstream::IndexDownload,
                status: Some(200),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_index() {
        let err = client("http://127.0.0.1:9")
            .fetch_torrent(42)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::UpstreamUnavailable {
                upstream: Upstream::IndexDownload,
                status: None,
                ..
            }
        ));
    }
}

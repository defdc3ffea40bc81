//! qBittorrent Web API client
//!
//! Login: POST /api/v2/auth/login
//! Add:   POST /api/v2/torrents/add (multipart)

use super::{parse_sid, ClientSession, DownloadClient};
use crate::core::config::DownloadClientConfig;
use crate::core::error::{excerpt, GatewayError, Result, Upstream};
use crate::index::TorrentArtifact;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{header, StatusCode};
use std::time::Duration;

/// Substring the login endpoint returns on success ("Ok.")
const LOGIN_OK_MARKER: &str = "Ok";

pub struct QbittorrentClient {
    http_client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    login_timeout: Duration,
    add_timeout: Duration,
}

impl QbittorrentClient {
    pub fn new(config: &DownloadClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            GatewayError::InitializationError(format!("Download client HTTP client: {}", e))
        })?;

        Ok(Self {
            http_client,
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            login_timeout: config.login_timeout(),
            add_timeout: config.add_timeout(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/v2{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl DownloadClient for QbittorrentClient {
    async fn login(&self) -> Result<ClientSession> {
        let params = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let response = self
            .http_client
            .post(self.url("/auth/login"))
            .form(&params)
            .timeout(self.login_timeout)
            .send()
            .await
            .map_err(|e| GatewayError::transport(Upstream::DownloadClientLogin, &e))?;

        let status = response.status();
        let sid = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(parse_sid);

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::transport(Upstream::DownloadClientLogin, &e))?;

        if status != StatusCode::OK || !body.contains(LOGIN_OK_MARKER) {
            return Err(GatewayError::UpstreamAuth {
                upstream: Upstream::DownloadClientLogin,
                status: Some(status.as_u16()),
                body: excerpt(&body),
            });
        }

        tracing::debug!(has_sid = sid.is_some(), "Logged in to download client");
        Ok(ClientSession::new(sid))
    }

    async fn add_torrent(
        &self,
        session: &ClientSession,
        artifact: &TorrentArtifact,
        save_path: &str,
    ) -> Result<()> {
        let part = Part::bytes(artifact.bytes.to_vec())
            .file_name(artifact.file_name())
            .mime_str("application/x-bittorrent")
            .map_err(|e| GatewayError::transport(Upstream::DownloadClientAdd, &e))?;

        let form = Form::new()
            .part("torrents", part)
            .text("savepath", save_path.to_string())
            .text("autoTMM", "false");

        let mut request = self
            .http_client
            .post(self.url("/torrents/add"))
            .multipart(form)
            .timeout(self.add_timeout);

        if let Some(cookie) = session.cookie() {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::transport(Upstream::DownloadClientAdd, &e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamUnavailable {
                upstream: Upstream::DownloadClientAdd,
                status: Some(status.as_u16()),
                message: excerpt(&message),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::{
        extract::Multipart,
        http::{HeaderMap, StatusCode as AxumStatus},
        response::IntoResponse,
        routing::post,
        Form as AxumForm, Router,
    };
    use bytes::Bytes;
    use std::collections::HashMap;

    fn client(base_url: &str) -> QbittorrentClient {
        let mut config = crate::core::config::Config::defaults().unwrap().download_client;
        config.url = base_url.to_string();
        config.username = "admin".to_string();
        config.password = "secret".to_string();
        QbittorrentClient::new(&config).unwrap()
    }

    fn artifact() -> TorrentArtifact {
        TorrentArtifact {
            torrent_id: 42,
            bytes: Bytes::from_static(b"d8:announce0:e"),
        }
    }

    async fn login_handler(AxumForm(form): AxumForm<HashMap<String, String>>) -> impl IntoResponse {
        let ok = form.get("username").map(String::as_str) == Some("admin")
            && form.get("password").map(String::as_str) == Some("secret");
        if ok {
            (
                [("set-cookie", "SID=abc123; HttpOnly; path=/")],
                "Ok.",
            )
                .into_response()
        } else {
            "Fails.".into_response()
        }
    }

    async fn add_handler(headers: HeaderMap, mut multipart: Multipart) -> impl IntoResponse {
        if headers.get("cookie").and_then(|v| v.to_str().ok()) != Some("SID=abc123") {
            return (AxumStatus::FORBIDDEN, "Forbidden".to_string());
        }
        let mut fields = Vec::new();
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await.unwrap_or_default();
            fields.push(format!(
                "{}|{}|{}",
                name,
                file_name.unwrap_or_default(),
                String::from_utf8_lossy(&data)
            ));
        }
        fields.sort();
        let expected = [
            "autoTMM||false",
            "savepath||/media/audiobooks",
            "torrents|42.torrent|d8:announce0:e",
        ];
        if fields == expected {
            (AxumStatus::OK, "Ok.".to_string())
        } else {
            (AxumStatus::BAD_REQUEST, fields.join("\n"))
        }
    }

    #[tokio::test]
    async fn test_login_returns_sid_session() {
        let app = Router::new().route("/api/v2/auth/login", post(login_handler));
        let base = spawn_stub(app).await;

        let session = client(&base).login().await.unwrap();
        assert_eq!(session.cookie().as_deref(), Some("SID=abc123"));
    }

    #[tokio::test]
    async fn test_login_without_marker_is_upstream_auth() {
        let app = Router::new().route("/api/v2/auth/login", post(login_handler));
        let base = spawn_stub(app).await;

        let mut bad = client(&base);
        bad.password = "wrong".to_string();
        match bad.login().await.unwrap_err() {
            GatewayError::UpstreamAuth {
                upstream,
                status,
                body,
            } => {
                assert_eq!(upstream, Upstream::DownloadClientLogin);
                assert_eq!(status, Some(200));
                assert_eq!(body, "Fails.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_torrent_multipart() {
        let app = Router::new()
            .route("/api/v2/auth/login", post(login_handler))
            .route("/api/v2/torrents/add", post(add_handler));
        let base = spawn_stub(app).await;
        let client = client(&base);

        let session = client.login().await.unwrap();
        client
            .add_torrent(&session, &artifact(), "/media/audiobooks")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_torrent_rejected() {
        let app = Router::new().route("/api/v2/torrents/add", post(add_handler));
        let base = spawn_stub(app).await;

        let err = client(&base)
            .add_torrent(&ClientSession::new(None), &artifact(), "/media/audiobooks")
            .await
            .unwrap_err();
        match err {
            GatewayError::UpstreamUnavailable {
                upstream,
                status,
                message,
            } => {
                assert_eq!(upstream, Upstream::DownloadClientAdd);
                assert_eq!(status, Some(403));
                assert_eq!(message, "Forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

use super::AppState;
use crate::api::extract::ApiJson;
use crate::api::models::{AddTorrentRequest, AddTorrentResponse};
use crate::auth::AuthUser;
use crate::core::error::Result;
use axum::{extract::State, Json};

/// Handler for POST /api/add - send a torrent to the download client
pub async fn add_torrent(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<AddTorrentRequest>,
) -> Result<Json<AddTorrentResponse>> {
    tracing::info!(user = %user.username, tid = req.tid, "Add torrent requested");

    let receipt = state
        .dispatch_service
        .dispatch(&user.username, req.tid, req.title)
        .await?;

    Ok(Json(AddTorrentResponse {
        status: "ok".to_string(),
        detail: receipt.detail(),
    }))
}

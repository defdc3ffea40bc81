use super::AppState;
use crate::api::extract::ApiQuery;
use crate::api::models::{CoverParams, CoverResponse, SearchParams};
use crate::auth::AuthUser;
use crate::core::error::Result;
use axum::{extract::State, response::IntoResponse, Json};

/// Handler for GET /api/search?q=&field=
pub async fn search(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<impl IntoResponse> {
    let results = state
        .search_service
        .search(&params.q, &params.field, &user.username)
        .await?;
    Ok(Json(results))
}

/// Handler for GET /api/cover?title=&author=
pub async fn resolve_cover(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CoverParams>,
) -> Json<CoverResponse> {
    let cover = state
        .cover_resolver
        .resolve(&params.title, &params.author)
        .await;
    Json(CoverResponse { cover })
}

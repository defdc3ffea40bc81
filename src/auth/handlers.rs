//! Authentication API handlers

use crate::api::extract::ApiJson;
use crate::api::handlers::AppState;
use crate::auth::jwt::generate_token;
use crate::auth::middleware::AuthUser;
use crate::auth::models::{LoginRequest, RegisterRequest, TokenResponse, UserInfo};
use crate::auth::password::{hash_password, verify_password};
use crate::core::error::{GatewayError, Result};
use crate::db::models::User;
use axum::{
    extract::{FromRequest, Request, State},
    http::header,
    response::IntoResponse,
    Form, Json,
};
use uuid::Uuid;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 4;

/// Handler for POST /api/register - invite-only registration
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!(username = %req.username, "User registration attempt");

    if req.invite_code != state.config.security.invite_code {
        tracing::warn!(username = %req.username, "Registration with invalid invite code");
        return Err(GatewayError::PermissionDenied("Invalid invite code".to_string()));
    }

    if req.username.chars().count() < MIN_USERNAME_LEN
        || req.password.chars().count() < MIN_PASSWORD_LEN
    {
        return Err(GatewayError::ValidationError(
            "Username or password too short".to_string(),
        ));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        username: req.username.clone(),
        password_hash: hash_password(&req.password)?,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    if !state.user_repo.insert_unique(&user).await? {
        tracing::warn!(username = %req.username, "Registration failed: username taken");
        return Err(GatewayError::InvalidRequest(
            "Username already exists".to_string(),
        ));
    }

    let token = generate_token(
        &user.username,
        &state.jwt_secret,
        state.config.security.token_ttl_days,
    )?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered successfully");
    Ok(Json(TokenResponse::bearer(token)))
}

/// Handler for POST /api/login - accepts JSON or a urlencoded form
pub async fn login(State(state): State<AppState>, request: Request) -> Result<impl IntoResponse> {
    let req = read_login_request(request).await?;
    if req.username.is_empty() || req.password.is_empty() {
        return Err(GatewayError::ValidationError(
            "Missing username or password".to_string(),
        ));
    }

    tracing::info!(username = %req.username, "Login attempt");

    let user = state
        .user_repo
        .find_by_username(&req.username)
        .await?
        .ok_or_else(|| GatewayError::AuthenticationError("Invalid credentials".to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(username = %req.username, "Invalid password");
        return Err(GatewayError::AuthenticationError("Invalid credentials".to_string()));
    }

    let token = generate_token(
        &user.username,
        &state.jwt_secret,
        state.config.security.token_ttl_days,
    )?;

    tracing::info!(username = %user.username, "Login successful");
    Ok(Json(TokenResponse::bearer(token)))
}

async fn read_login_request(request: Request) -> Result<LoginRequest> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);

    if is_form {
        let Form(req) = Form::<LoginRequest>::from_request(request, &())
            .await
            .map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
        Ok(req)
    } else {
        let Json(req) = Json::<LoginRequest>::from_request(request, &())
            .await
            .map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
        Ok(req)
    }
}

/// Handler for GET /api/me - Get current user info
pub async fn get_me(user: AuthUser) -> Json<UserInfo> {
    Json(UserInfo {
        username: user.username,
        created_at: user.created_at,
    })
}

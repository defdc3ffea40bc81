//! Authentication middleware

use crate::api::handlers::AppState;
use crate::auth::jwt::validate_token;
use crate::core::error::{GatewayError, Result};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Authenticated user stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
    pub created_at: String,
}

/// Authentication middleware
///
/// Expects `Authorization: Bearer <token>` and a user that still exists.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    let Some(token) = token else {
        return GatewayError::AuthenticationError("Missing authentication token".to_string())
            .into_response();
    };

    let claims = match validate_token(&token, &state.jwt_secret) {
        Ok(c) => c,
        Err(e) => return e.into_response(),
    };

    let user = match state.user_repo.find_by_username(&claims.sub).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return GatewayError::AuthenticationError("User no longer exists".to_string())
                .into_response();
        }
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(AuthUser {
        username: user.username,
        created_at: user.created_at,
    });

    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| GatewayError::AuthenticationError("User not authenticated".to_string()))
    }
}

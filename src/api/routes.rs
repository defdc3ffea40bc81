//! API routes

use crate::api::handlers::{add_torrent, api_test, health_check, resolve_cover, search, AppState};
use crate::auth::handlers::{get_me, login, register};
use crate::auth::middleware::authenticate;
use crate::core::error::GatewayError;
use axum::{
    error_handling::HandleErrorLayer,
    middleware,
    routing::{get, post},
    BoxError, Router,
};
use std::time::Duration;
use tower::ServiceBuilder;

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    let request_timeout = state.config.server.request_timeout();

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/test", get(api_test))
        .route("/api/register", post(register))
        .route("/api/login", post(login));

    let account_routes = Router::new()
        .route("/api/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    // Each upstream call below carries its own timeout; a router-wide one
    // would drop a dispatch between steps.
    let upstream_routes = Router::new()
        .route("/api/search", get(search))
        .route("/api/cover", get(resolve_cover))
        .route("/api/add", post(add_torrent))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .merge(with_request_timeout(
            public_routes.merge(account_routes),
            request_timeout,
        ))
        .merge(upstream_routes)
        .with_state(state)
}

/// Bound every route of `router` by `timeout`, answering with a JSON 408
pub fn with_request_timeout<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                request_timeout_error(err, timeout)
            }))
            .timeout(timeout),
    )
}

fn request_timeout_error(err: BoxError, timeout: Duration) -> GatewayError {
    if err.is::<tower::timeout::error::Elapsed>() {
        GatewayError::RequestTimeout(timeout)
    } else {
        GatewayError::TaskError(err.to_string())
    }
}

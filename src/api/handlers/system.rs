use axum::Json;
use serde_json::{json, Value};

/// Handler for GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}

/// Handler for GET /api/test - liveness check used by the frontend
pub async fn api_test() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

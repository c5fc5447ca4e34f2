use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

/// Handler for `GET /healthz` — liveness check. Uses the same
/// `{success, code, msg}` body shape as the API responses.
pub async fn healthz() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "code": 200, "msg": "ok" })),
    )
}

/// Handler for `GET /readyz` — readiness check (override per service as needed).
pub async fn readyz() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "code": 200, "msg": "ready" })),
    )
}

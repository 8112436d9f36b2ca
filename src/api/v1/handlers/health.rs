/*
 * Responsibility
 * - GET /health (疎通用)
 * - identity middleware の外に置く (LB からの probe は trusted proxy 経由ではない)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

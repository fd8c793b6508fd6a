use axum::Json;

/// GET /health: liveness check.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

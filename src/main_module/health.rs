//! Health check handler

use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

pub const SERVICE_NAME: &str = "Customer Service CRM API";

pub async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "timestamp": Utc::now(),
        })),
    )
}

//! `GET /health`: liveness probe.

use axum::Json;
use chrono::Utc;
use serde_json::{Value, json};

pub async fn handler() -> Json<Value> {
  Json(json!({
    "status":    "healthy",
    "service":   "kin-api",
    "timestamp": Utc::now().to_rfc3339(),
  }))
}

//! Health check endpoint

use axum::Json;
use serde_json::{json, Value};

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "module": "artcc-web",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

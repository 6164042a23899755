// src/handlers/health.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::storage::Storage;

/// Liveness plus storage readiness. Always 200.
pub async fn health(State(storage): State<Storage>) -> impl IntoResponse {
    let storage_state = if storage.is_connected() {
        "connected"
    } else {
        "unavailable"
    };

    Json(json!({
        "status": "ok",
        "storage": storage_state,
    }))
}

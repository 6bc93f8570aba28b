// src/handlers/health.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

/// Liveness probe. Reports the bank size so a misloaded bank is visible.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "questions": state.engine.total_questions(),
    }))
}

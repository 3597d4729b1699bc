use axum::{Json, extract::State};
use serde_json::{Value, json};

use super::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Presentation Coach API is running",
        "status": "healthy",
    }))
}

/// Reports whether the provider API keys are configured.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "deepgram_configured": state.deepgram_configured,
        "groq_configured": state.groq_configured,
    }))
}

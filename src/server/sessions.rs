//! Practice-session endpoints: create, list, and per-session recordings.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

use super::{ApiResponse, AppState, authenticate, error_body};
use crate::db;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub title: Option<String>,
}

fn session_json(session: &db::PracticeSession) -> Value {
    json!({
        "id": session.id,
        "title": session.title,
        "created_at": session.created_at,
    })
}

pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResponse {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let title = request
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Practice Session".to_string());
    let session_id = uuid::Uuid::new_v4().to_string();

    if let Err(e) = db::create_session(&state.db, &session_id, &user.id, &title).await {
        error!("Failed to create session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("Internal error"),
        );
    }

    match db::get_session(&state.db, &session_id, &user.id).await {
        Ok(Some(session)) => (StatusCode::CREATED, Json(session_json(&session))),
        Ok(None) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("Internal error"),
        ),
        Err(e) => {
            error!("Failed to load session: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Internal error"),
            )
        }
    }
}

pub async fn list_sessions(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match db::list_sessions(&state.db, &user.id).await {
        Ok(sessions) => {
            let body: Vec<Value> = sessions.iter().map(session_json).collect();
            (StatusCode::OK, Json(json!(body)))
        }
        Err(e) => {
            error!("Failed to list sessions: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Internal error"),
            )
        }
    }
}

/// Recordings of one session, newest first, with parsed metrics.
pub async fn session_recordings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> ApiResponse {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match db::get_session(&state.db, &session_id, &user.id).await {
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, error_body("Session not found")),
        Err(e) => {
            error!("Failed to load session: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Internal error"),
            );
        }
    }

    match db::list_recordings(&state.db, &session_id).await {
        Ok(recordings) => {
            let body: Vec<Value> = recordings
                .iter()
                .map(|r| {
                    let metrics: Value =
                        serde_json::from_str(&r.metrics_json).unwrap_or(Value::Null);
                    json!({
                        "id": r.id,
                        "created_at": r.created_at,
                        "metrics": metrics,
                        "ai_feedback": r.feedback,
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!(body)))
        }
        Err(e) => {
            error!("Failed to list recordings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Internal error"),
            )
        }
    }
}

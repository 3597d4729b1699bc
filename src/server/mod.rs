//! HTTP surface of the service.
//!
//! One handler module per route group; shared state and helpers live here.

pub mod analyze;
pub mod auth_routes;
pub mod health;
pub mod sessions;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::analysis::Analyzer;
use crate::auth;
use crate::db::{self, DbPool};
use crate::feedback::FeedbackGenerator;
use crate::transcription::SpeechToText;

/// Uploads over this size are rejected before buffering.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub stt: Arc<dyn SpeechToText>,
    pub feedback: Arc<dyn FeedbackGenerator>,
    pub analyzer: Arc<Analyzer>,
    pub deepgram_configured: bool,
    pub groq_configured: bool,
}

/// A handler response: status plus a JSON body.
pub type ApiResponse = (StatusCode, Json<Value>);

pub(crate) fn error_body(message: &str) -> Json<Value> {
    Json(json!({ "error": message }))
}

/// Resolve the caller from the `Authorization: Bearer` header.
pub(crate) async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<db::User, ApiResponse> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = auth::bearer_token(header).ok_or((
        StatusCode::UNAUTHORIZED,
        error_body("Missing bearer token"),
    ))?;

    match db::get_user_for_token(&state.db, token).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err((StatusCode::UNAUTHORIZED, error_body("Invalid token"))),
        Err(e) => {
            error!("Token lookup failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Internal error"),
            ))
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/api/health", get(health::health_check))
        .route("/api/auth/register", post(auth_routes::register))
        .route("/api/auth/login", post(auth_routes::login))
        .route("/api/auth/logout", post(auth_routes::logout))
        .route("/api/auth/me", get(auth_routes::me))
        .route(
            "/api/sessions",
            post(sessions::create_session).get(sessions::list_sessions),
        )
        .route(
            "/api/sessions/{id}/recordings",
            get(sessions::session_recordings),
        )
        .route("/api/analyze", post(analyze::analyze_audio))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    info!("Starting API server on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Registration, login and the current-user endpoint.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::{ApiResponse, AppState, authenticate, error_body};
use crate::auth;
use crate::db;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

fn token_response(access_token: String) -> serde_json::Value {
    json!({ "access_token": access_token, "token_type": "bearer" })
}

pub async fn register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> ApiResponse {
    let email = credentials.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return (StatusCode::BAD_REQUEST, error_body("Invalid email address"));
    }
    if credentials.password.len() < 8 {
        return (
            StatusCode::BAD_REQUEST,
            error_body("Password must be at least 8 characters"),
        );
    }

    match db::get_user_by_email(&state.db, &email).await {
        Ok(Some(_)) => {
            return (StatusCode::CONFLICT, error_body("Email already registered"));
        }
        Ok(None) => {}
        Err(e) => {
            error!("User lookup failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Internal error"),
            );
        }
    }

    let user_id = uuid::Uuid::new_v4().to_string();
    let salt = auth::generate_salt();
    let password_hash = auth::hash_password(&credentials.password, &salt);

    if let Err(e) = db::create_user(&state.db, &user_id, &email, &password_hash, &salt).await {
        error!("Failed to create user: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("Internal error"),
        );
    }

    let token = auth::generate_token();
    if let Err(e) = db::insert_token(&state.db, &token, &user_id).await {
        error!("Failed to store token: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("Internal error"),
        );
    }

    info!("Registered user {}", email);
    (StatusCode::CREATED, Json(token_response(token)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> ApiResponse {
    let email = credentials.email.trim().to_lowercase();

    let user = match db::get_user_by_email(&state.db, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                error_body("Invalid email or password"),
            );
        }
        Err(e) => {
            error!("User lookup failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Internal error"),
            );
        }
    };

    if !auth::verify_password(&credentials.password, &user.salt, &user.password_hash) {
        return (
            StatusCode::UNAUTHORIZED,
            error_body("Invalid email or password"),
        );
    }

    let token = auth::generate_token();
    if let Err(e) = db::insert_token(&state.db, &token, &user.id).await {
        error!("Failed to store token: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("Internal error"),
        );
    }

    (StatusCode::OK, Json(token_response(token)))
}

/// Invalidate the presented token. Idempotent: an unknown token still
/// yields success.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let Some(token) = auth::bearer_token(header) else {
        return (
            StatusCode::UNAUTHORIZED,
            error_body("Missing bearer token"),
        );
    };

    if let Err(e) = db::delete_token(&state.db, token).await {
        error!("Failed to delete token: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("Internal error"),
        );
    }

    (StatusCode::OK, Json(json!({ "status": "logged out" })))
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResponse {
    let user = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    (
        StatusCode::OK,
        Json(json!({
            "id": user.id,
            "email": user.email,
            "created_at": user.created_at,
        })),
    )
}

//! SQLite persistence for users, practice sessions and recordings.

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;

pub type DbPool = SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PracticeSession {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: String,
}

/// One analyzed upload: the serialized metrics plus the coaching feedback.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Recording {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub metrics_json: String,
    pub feedback: String,
    pub created_at: String,
}

pub async fn init_db(database_url: &str) -> Result<DbPool, sqlx::Error> {
    if let Some(path) = database_url.strip_prefix("sqlite:") {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub async fn create_user(
    pool: &DbPool,
    id: &str,
    email: &str,
    password_hash: &str,
    salt: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, salt, created_at)
        VALUES (?, ?, ?, ?, datetime('now'))
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(password_hash)
    .bind(salt)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn insert_token(pool: &DbPool, token: &str, user_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO auth_tokens (token, user_id, created_at)
        VALUES (?, ?, datetime('now'))
        "#,
    )
    .bind(token)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_token(pool: &DbPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM auth_tokens WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;

    Ok(())
}

/// Resolve a bearer token to its user, if the token exists.
pub async fn get_user_for_token(pool: &DbPool, token: &str) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT u.* FROM users u
        JOIN auth_tokens t ON t.user_id = u.id
        WHERE t.token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn create_session(
    pool: &DbPool,
    id: &str,
    user_id: &str,
    title: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, title, created_at)
        VALUES (?, ?, ?, datetime('now'))
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(title)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_sessions(
    pool: &DbPool,
    user_id: &str,
) -> Result<Vec<PracticeSession>, sqlx::Error> {
    let sessions = sqlx::query_as::<_, PracticeSession>(
        "SELECT * FROM sessions WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(sessions)
}

/// Fetch a session only if it belongs to `user_id`.
pub async fn get_session(
    pool: &DbPool,
    id: &str,
    user_id: &str,
) -> Result<Option<PracticeSession>, sqlx::Error> {
    let session =
        sqlx::query_as::<_, PracticeSession>("SELECT * FROM sessions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    Ok(session)
}

pub async fn insert_recording(pool: &DbPool, recording: &Recording) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO recordings (id, session_id, user_id, metrics_json, feedback, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&recording.id)
    .bind(&recording.session_id)
    .bind(&recording.user_id)
    .bind(&recording.metrics_json)
    .bind(&recording.feedback)
    .bind(&recording.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// All recordings of a session, newest first.
pub async fn list_recordings(
    pool: &DbPool,
    session_id: &str,
) -> Result<Vec<Recording>, sqlx::Error> {
    let recordings = sqlx::query_as::<_, Recording>(
        "SELECT * FROM recordings WHERE session_id = ? ORDER BY created_at DESC, rowid DESC",
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(recordings)
}

/// The `limit` most recent recordings of a session, newest first. Feeds the
/// feedback generator's sliding history window.
pub async fn recent_recordings(
    pool: &DbPool,
    session_id: &str,
    limit: i64,
) -> Result<Vec<Recording>, sqlx::Error> {
    let recordings = sqlx::query_as::<_, Recording>(
        "SELECT * FROM recordings WHERE session_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?",
    )
    .bind(session_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(recordings)
}

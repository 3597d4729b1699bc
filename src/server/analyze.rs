//! The main endpoint: upload audio, get metrics plus coaching feedback.
//!
//! Transcribes through the speech-to-text collaborator, runs the analyzer,
//! asks the feedback generator for coaching text (with the session's recent
//! history when one is given), and persists the result to the session.

use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::{ApiResponse, AppState, authenticate, error_body};
use crate::analysis::Metrics;
use crate::db;
use crate::feedback::{MAX_HISTORY, PriorRecording};

const ALLOWED_EXTENSIONS: &[&str] = &[".mp3", ".mp4", ".mpeg", ".mpga", ".m4a", ".wav", ".webm"];

fn file_extension(filename: &str) -> Option<String> {
    filename
        .rfind('.')
        .map(|index| filename[index..].to_lowercase())
}

/// Content type forwarded to the transcription provider.
fn content_type_for(extension: &str) -> &'static str {
    match extension {
        ".mp3" | ".mpeg" | ".mpga" => "audio/mpeg",
        ".mp4" | ".m4a" => "audio/mp4",
        ".wav" => "audio/wav",
        ".webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}

pub async fn analyze_audio(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResponse {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename = String::new();
    let mut session_id: Option<String> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().unwrap_or("").to_string();
                match field.bytes().await {
                    Ok(bytes) => file_bytes = Some(bytes.to_vec()),
                    Err(e) => {
                        warn!("Failed to read upload: {}", e);
                        return (StatusCode::BAD_REQUEST, error_body("Failed to read upload"));
                    }
                }
            }
            "session_id" => {
                if let Ok(text) = field.text().await {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        session_id = Some(text);
                    }
                }
            }
            _ => {}
        }
    }

    let Some(audio) = file_bytes else {
        return (StatusCode::BAD_REQUEST, error_body("No file provided"));
    };

    let extension = match file_extension(&filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => ext,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                error_body(&format!(
                    "Unsupported file type. Allowed: {}",
                    ALLOWED_EXTENSIONS.join(", ")
                )),
            );
        }
    };

    // A session upload must come from the session's owner; anonymous
    // one-shot analysis needs no account.
    let target_session = match &session_id {
        Some(sid) => {
            let user = match authenticate(&state, &headers).await {
                Ok(user) => user,
                Err(response) => return response,
            };
            match db::get_session(&state.db, sid, &user.id).await {
                Ok(Some(session)) => Some((user, session)),
                Ok(None) => {
                    return (StatusCode::NOT_FOUND, error_body("Session not found"));
                }
                Err(e) => {
                    error!("Failed to load session: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        error_body("Internal error"),
                    );
                }
            }
        }
        None => None,
    };

    info!(
        "Analyzing upload '{}' ({} bytes, session: {})",
        filename,
        audio.len(),
        session_id.as_deref().unwrap_or("none")
    );

    let transcription = match state
        .stt
        .transcribe(audio, content_type_for(&extension))
        .await
    {
        Ok(transcription) => transcription,
        Err(e) => {
            error!("Transcription failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Analysis failed"),
            );
        }
    };

    let metrics = state
        .analyzer
        .analyze(&transcription.text, &transcription.words);

    let history = match &target_session {
        Some((_, session)) => load_history(&state, &session.id).await,
        None => Vec::new(),
    };

    let ai_feedback = state.feedback.generate(&metrics, &history).await;

    if let Some((user, session)) = &target_session {
        let metrics_json = match serde_json::to_string(&metrics) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize metrics: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_body("Analysis failed"),
                );
            }
        };

        let recording = db::Recording {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session.id.clone(),
            user_id: user.id.clone(),
            metrics_json,
            feedback: ai_feedback.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        if let Err(e) = db::insert_recording(&state.db, &recording).await {
            error!("Failed to persist recording: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Analysis failed"),
            );
        }
    }

    let mut body = match serde_json::to_value(&metrics) {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to serialize metrics: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Analysis failed"),
            );
        }
    };
    body["ai_feedback"] = json!(ai_feedback);

    (StatusCode::OK, Json(body))
}

/// Last few analyzed recordings of the session, newest first, for the
/// feedback generator's longitudinal comparison. Unreadable rows are
/// skipped rather than failing the request.
async fn load_history(state: &AppState, session_id: &str) -> Vec<PriorRecording> {
    match db::recent_recordings(&state.db, session_id, MAX_HISTORY as i64).await {
        Ok(rows) => rows
            .iter()
            .filter_map(|row| {
                serde_json::from_str::<Metrics>(&row.metrics_json)
                    .ok()
                    .map(|metrics| PriorRecording {
                        metrics,
                        feedback: row.feedback.clone(),
                    })
            })
            .collect(),
        Err(e) => {
            warn!("Failed to load recording history: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension_is_lowercased() {
        assert_eq!(file_extension("Talk.WAV"), Some(".wav".to_string()));
        assert_eq!(file_extension("talk.tar.mp3"), Some(".mp3".to_string()));
        assert_eq!(file_extension("noextension"), None);
    }

    #[test]
    fn test_allowed_extensions_match_upload_policy() {
        for ext in ALLOWED_EXTENSIONS {
            assert!(ext.starts_with('.'));
            assert_ne!(content_type_for(ext), "application/octet-stream");
        }
        assert_eq!(content_type_for(".wav"), "audio/wav");
        assert_eq!(content_type_for(".m4a"), "audio/mp4");
        assert_eq!(content_type_for(".ogg"), "application/octet-stream");
    }
}

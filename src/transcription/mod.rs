//! Speech-to-text integration.
//!
//! The service talks to the transcription provider through the
//! [`SpeechToText`] trait so the concrete provider stays swappable; the
//! shipped implementation calls the Deepgram prerecorded API.

pub mod deepgram;

pub use deepgram::{DeepgramClient, DeepgramConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::WordToken;

/// A finished transcription in the shape the analyzer consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Full transcript text
    pub text: String,
    /// Word-level timings, in temporal order as the provider emitted them
    pub words: Vec<WordToken>,
    /// End timestamp of the last word, or 0 without words
    pub duration_seconds: f64,
}

impl Transcription {
    pub fn new(text: String, words: Vec<WordToken>) -> Self {
        let duration_seconds = words.last().map(|w| w.end).unwrap_or(0.0);
        Self {
            text,
            words,
            duration_seconds,
        }
    }
}

/// Errors from the transcription stage, distinct from analysis (which
/// cannot fail) and feedback (which degrades instead of failing).
#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("transcription API key is not configured")]
    MissingApiKey,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("provider response contained no transcript")]
    EmptyResponse,
}

/// Boundary to the speech-to-text provider.
///
/// Implementations own authentication, request formatting and translation
/// of the provider's wire format into [`Transcription`].
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        content_type: &str,
    ) -> Result<Transcription, TranscriptionError>;
}

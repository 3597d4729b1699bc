//! Deepgram prerecorded-audio client.
//!
//! Sends the uploaded audio as-is to `POST /v1/listen` and maps the first
//! channel's best alternative into the neutral [`Transcription`] shape.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{SpeechToText, Transcription, TranscriptionError};
use crate::analysis::WordToken;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings for the Deepgram API.
#[derive(Debug, Clone)]
pub struct DeepgramConfig {
    pub api_key: String,
    pub base_url: String,
    /// Transcription model to request
    pub model: String,
}

impl DeepgramConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.deepgram.com".to_string(),
            model: "nova-2".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Deepgram REST response, reduced to the fields we consume.
#[derive(Debug, Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    channels: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    transcript: String,
    #[serde(default)]
    words: Vec<DeepgramWord>,
}

#[derive(Debug, Deserialize)]
struct DeepgramWord {
    word: String,
    start: f64,
    end: f64,
}

pub struct DeepgramClient {
    config: DeepgramConfig,
    http: reqwest::Client,
}

impl DeepgramClient {
    pub fn new(config: DeepgramConfig) -> Result<Self, TranscriptionError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { config, http })
    }

    fn listen_url(&self) -> String {
        format!(
            "{}/v1/listen?model={}&smart_format=true&punctuate=true",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl SpeechToText for DeepgramClient {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        content_type: &str,
    ) -> Result<Transcription, TranscriptionError> {
        if self.config.api_key.trim().is_empty() {
            return Err(TranscriptionError::MissingApiKey);
        }

        let url = self.listen_url();
        debug!("Sending {} bytes to {}", audio.len(), url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Token {}", self.config.api_key))
            .header("Content-Type", content_type)
            .body(audio)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(TranscriptionError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let listen: ListenResponse = response.json().await?;

        let alternative = listen
            .results
            .channels
            .into_iter()
            .next()
            .and_then(|c| c.alternatives.into_iter().next())
            .ok_or(TranscriptionError::EmptyResponse)?;

        let words: Vec<WordToken> = alternative
            .words
            .into_iter()
            .map(|w| WordToken::new(w.word, w.start, w.end))
            .collect();

        info!(
            "Transcribed {} words ({} chars of text)",
            words.len(),
            alternative.transcript.len()
        );

        Ok(Transcription::new(alternative.transcript, words))
    }
}

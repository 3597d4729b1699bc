//! Coaching-feedback generation.
//!
//! Builds a coaching prompt from the metrics (plus a bounded history of
//! earlier attempts for longitudinal comparison) and asks an LLM for tips.
//! This boundary never fails: provider errors degrade into a visible
//! message string so a recording always carries some feedback.

pub mod groq;

pub use groq::{GroqClient, GroqConfig};

use async_trait::async_trait;

use crate::analysis::Metrics;

/// Persona handed to the model as the system prompt.
pub const SYSTEM_PROMPT: &str = "You are a professional presentation coach \
    who gives specific, actionable feedback in a friendly tone.";

/// Sliding window of prior attempts the caller may pass in.
pub const MAX_HISTORY: usize = 3;

/// Transcript excerpt cap for the prompt.
pub const EXCERPT_MAX_CHARS: usize = 500;

/// An earlier analyzed recording with the feedback it received.
#[derive(Debug, Clone)]
pub struct PriorRecording {
    pub metrics: Metrics,
    pub feedback: String,
}

/// Boundary to the feedback LLM.
#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    /// Generate coaching text for `metrics`. `history` is ordered
    /// most-recent-first and is truncated to [`MAX_HISTORY`] entries.
    /// Failures become a degraded-but-present message, never an error.
    async fn generate(&self, metrics: &Metrics, history: &[PriorRecording]) -> String;
}

/// First `max_chars` characters of the transcript, with a trailing ellipsis
/// marker when truncated.
pub fn transcript_excerpt(transcript: &str, max_chars: usize) -> String {
    if transcript.chars().count() > max_chars {
        let cut: String = transcript.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        transcript.to_string()
    }
}

/// Assemble the coaching prompt the model sees.
pub fn build_prompt(metrics: &Metrics, history: &[PriorRecording]) -> String {
    let excerpt = transcript_excerpt(&metrics.transcript, EXCERPT_MAX_CHARS);

    let mut prompt = format!(
        "You are an expert presentation coach. Analyze this practice \
         presentation and provide constructive, actionable feedback.\n\n\
         PRESENTATION METRICS:\n\
         • Duration: {:.1} seconds\n\
         • Filler Words: {} instances\n\
         • Speaking Pace: {:.1} words/minute (ideal: 120-160)\n\
         • Long Pauses: {} instances\n\
         • Clarity Score: {:.1}/10\n\n\
         TRANSCRIPT EXCERPT:\n{}\n\n\
         Provide 3-4 specific, actionable tips to improve this presentation. \
         Be encouraging but honest. Focus on what they can practice right now.",
        metrics.duration_seconds,
        metrics.total_fillers,
        metrics.words_per_minute,
        metrics.long_pauses.len(),
        metrics.clarity_score,
        excerpt,
    );

    if !history.is_empty() {
        prompt.push_str("\n\nPREVIOUS ATTEMPTS (most recent first):");
        for (i, prior) in history.iter().take(MAX_HISTORY).enumerate() {
            prompt.push_str(&format!(
                "\n{}. Clarity {:.1}/10, {:.1} WPM, {} filler words",
                i + 1,
                prior.metrics.clarity_score,
                prior.metrics.words_per_minute,
                prior.metrics.total_fillers,
            ));
        }
        prompt.push_str("\n\nComment briefly on how this attempt compares with the previous ones.");
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Analyzer, WordToken};

    fn sample_metrics() -> Metrics {
        let words = vec![
            WordToken::new("um", 0.0, 0.5),
            WordToken::new("hello", 0.6, 1.0),
        ];
        Analyzer::default().analyze("um hello", &words)
    }

    #[test]
    fn test_excerpt_below_cap_is_unchanged() {
        assert_eq!(transcript_excerpt("short talk", 500), "short talk");
    }

    #[test]
    fn test_excerpt_truncates_with_ellipsis() {
        let long = "a".repeat(600);
        let excerpt = transcript_excerpt(&long, 500);
        assert_eq!(excerpt.chars().count(), 503);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let long = "ä".repeat(501);
        let excerpt = transcript_excerpt(&long, 500);
        assert_eq!(excerpt.chars().count(), 503);
    }

    #[test]
    fn test_prompt_contains_metrics_and_excerpt() {
        let metrics = sample_metrics();
        let prompt = build_prompt(&metrics, &[]);

        assert!(prompt.contains("Filler Words: 1 instances"));
        assert!(prompt.contains("(ideal: 120-160)"));
        assert!(prompt.contains("um hello"));
        assert!(!prompt.contains("PREVIOUS ATTEMPTS"));
    }

    #[test]
    fn test_prompt_history_is_bounded() {
        let metrics = sample_metrics();
        let prior = PriorRecording {
            metrics: sample_metrics(),
            feedback: "keep practicing".to_string(),
        };
        let history = vec![prior.clone(), prior.clone(), prior.clone(), prior.clone()];

        let prompt = build_prompt(&metrics, &history);
        assert!(prompt.contains("PREVIOUS ATTEMPTS (most recent first):"));
        assert!(prompt.contains("\n3. Clarity"));
        assert!(!prompt.contains("\n4. Clarity"));
    }
}

//! Metric types produced by the transcript analyzer.
//!
//! Serde field names follow the JSON shape the API serves, so a `Metrics`
//! value can be persisted and returned to clients without a translation
//! layer.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// One transcribed word with timing in seconds from recording start.
///
/// Providers may emit overlapping or identical timestamps between adjacent
/// words, so no cross-token ordering invariant is assumed anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordToken {
    /// The word text
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl WordToken {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// Verdict on overall speaking pace.
///
/// Serialized as the fixed human-readable strings clients display verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaceFeedback {
    #[serde(rename = "Too slow - aim for 120-160 WPM")]
    TooSlow,
    #[serde(rename = "Too fast - slow down to 120-160 WPM")]
    TooFast,
    #[serde(rename = "Good pace!")]
    Good,
}

impl std::fmt::Display for PaceFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaceFeedback::TooSlow => write!(f, "Too slow - aim for 120-160 WPM"),
            PaceFeedback::TooFast => write!(f, "Too fast - slow down to 120-160 WPM"),
            PaceFeedback::Good => write!(f, "Good pace!"),
        }
    }
}

/// A silence between adjacent words long enough to call out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongPause {
    /// When the pause began (end of the preceding word), in seconds
    #[serde(rename = "timestamp")]
    pub timestamp_seconds: f64,
    /// Pause length in seconds, rounded to two decimals
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
    /// The word spoken right before the pause
    pub after_word: String,
}

/// One point on the WPM-over-time curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingSegment {
    /// Segment start, whole seconds from recording start
    #[serde(rename = "time")]
    pub time_seconds: i64,
    /// Words per minute across the segment, rounded to one decimal
    pub wpm: f64,
}

/// Everything the analyzer derives from a single transcript.
///
/// Values are kept at full precision in memory; duration, WPM and clarity
/// are rounded to one decimal on serialization, matching the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// The input transcript, unmodified
    pub transcript: String,
    /// End timestamp of the last word, or 0 with no words
    #[serde(rename = "duration", serialize_with = "round_tenths")]
    pub duration_seconds: f64,
    /// Occurrence count per matched filler phrase (only counts > 0)
    #[serde(rename = "filler_words")]
    pub filler_counts: BTreeMap<String, u32>,
    /// Sum of all filler counts
    pub total_fillers: u32,
    #[serde(serialize_with = "round_tenths")]
    pub words_per_minute: f64,
    pub pace_feedback: PaceFeedback,
    /// Pauses over the threshold, in transcript order
    pub long_pauses: Vec<LongPause>,
    /// Composite score in [1.0, 10.0]
    #[serde(serialize_with = "round_tenths")]
    pub clarity_score: f64,
    /// Coarse WPM curve; empty unless the recording has more than 10 words
    pub pacing_segments: Vec<PacingSegment>,
}

fn round_tenths<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64((value * 10.0).round() / 10.0)
}

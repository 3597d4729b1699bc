//! Transcript analysis engine.
//!
//! Turns a word-timed transcript into presentation metrics: filler-word
//! counts, speaking pace, long pauses, a composite clarity score, and a
//! pacing-over-time curve. Pure computation, no I/O.

pub mod analyzer;
pub mod metrics;

pub use analyzer::{Analyzer, AnalyzerConfig, DEFAULT_FILLER_WORDS};
pub use metrics::{LongPause, Metrics, PaceFeedback, PacingSegment, WordToken};

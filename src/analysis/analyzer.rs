//! The analyzer itself: a single deterministic pass over the transcript
//! and its word timings.
//!
//! Every tunable constant lives in [`AnalyzerConfig`]; the algorithm never
//! reads anything else. The scoring is an intentionally simple, explainable
//! heuristic, not a fitted model.

use std::collections::BTreeMap;

use super::metrics::{LongPause, Metrics, PaceFeedback, PacingSegment, WordToken};

/// Filler words and phrases tracked by default.
///
/// Matched case-insensitively against the raw transcript, bounded by word
/// boundaries on both sides, so "like" never matches inside "likely".
pub const DEFAULT_FILLER_WORDS: &[&str] = &[
    "um",
    "uh",
    "like",
    "so",
    "you know",
    "basically",
    "actually",
    "kind of",
    "sort of",
    "i mean",
];

/// Tunable thresholds and coefficients for the analyzer.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Filler phrases to count, matched case-insensitively
    pub filler_catalog: Vec<String>,
    /// Gaps strictly longer than this many seconds count as long pauses
    pub long_pause_secs: f64,
    /// Lower bound of the comfortable pace band, inclusive
    pub slow_wpm: f64,
    /// Upper bound of the comfortable pace band, inclusive
    pub fast_wpm: f64,
    /// Clarity points lost per filler word
    pub filler_penalty_per_word: f64,
    /// Maximum clarity points the filler penalty can remove
    pub filler_penalty_cap: f64,
    /// Flat clarity penalty for pacing outside the band
    pub pace_penalty: f64,
    /// Clarity points lost per long pause
    pub pause_penalty_per_pause: f64,
    /// Maximum clarity points the pause penalty can remove
    pub pause_penalty_cap: f64,
    /// Clarity score is clamped to [min, max]
    pub clarity_min: f64,
    pub clarity_max: f64,
    /// Length of a non-trailing pacing segment in seconds
    pub pacing_window_secs: f64,
    /// Pacing segmentation only runs with strictly more words than this
    pub pacing_min_words: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            filler_catalog: DEFAULT_FILLER_WORDS.iter().map(|s| s.to_string()).collect(),
            long_pause_secs: 2.0,
            slow_wpm: 120.0,
            fast_wpm: 160.0,
            filler_penalty_per_word: 0.5,
            filler_penalty_cap: 4.0,
            pace_penalty: 2.0,
            pause_penalty_per_pause: 0.5,
            pause_penalty_cap: 2.0,
            clarity_min: 1.0,
            clarity_max: 10.0,
            pacing_window_secs: 10.0,
            pacing_min_words: 10,
        }
    }
}

/// Stateless transcript analyzer.
///
/// Thread-safe by construction; a single instance can serve concurrent
/// requests. Identical input always yields identical [`Metrics`].
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a transcript with word-level timings.
    ///
    /// Never fails for well-typed input: empty text, an empty word list and
    /// zero-duration or overlapping timestamps all produce a well-defined
    /// `Metrics` value with zeroed collections.
    pub fn analyze(&self, transcript_text: &str, words: &[WordToken]) -> Metrics {
        let filler_counts = self.count_fillers(transcript_text);
        let total_fillers: u32 = filler_counts.values().sum();

        // Pace: duration comes from the last word's end timestamp, the word
        // count from the plain text. The two sources may legitimately
        // disagree; both feed the formula as-is.
        let (duration_seconds, words_per_minute) = match words.last() {
            Some(last) => {
                let duration = last.end;
                let total_words = transcript_text.split_whitespace().count();
                let wpm = if duration > 0.0 {
                    total_words as f64 / (duration / 60.0)
                } else {
                    0.0
                };
                (duration, wpm)
            }
            None => (0.0, 0.0),
        };

        let pace_feedback = self.classify_pace(words_per_minute);
        let long_pauses = self.detect_pauses(words);
        let clarity_score = self.clarity_score(total_fillers, words_per_minute, long_pauses.len());
        let pacing_segments = self.pacing_segments(words);

        Metrics {
            transcript: transcript_text.to_string(),
            duration_seconds,
            filler_counts,
            total_fillers,
            words_per_minute,
            pace_feedback,
            long_pauses,
            clarity_score,
            pacing_segments,
        }
    }

    /// Count non-overlapping, whole-word occurrences of each catalog phrase
    /// in the raw transcript. Independent of the word-timing sequence.
    fn count_fillers(&self, transcript_text: &str) -> BTreeMap<String, u32> {
        let text_lower = transcript_text.to_lowercase();
        let mut counts = BTreeMap::new();

        for phrase in &self.config.filler_catalog {
            let count = count_phrase(&text_lower, &phrase.to_lowercase());
            if count > 0 {
                counts.insert(phrase.clone(), count);
            }
        }

        counts
    }

    /// Band boundaries are inclusive of Good.
    pub fn classify_pace(&self, wpm: f64) -> PaceFeedback {
        if wpm < self.config.slow_wpm {
            PaceFeedback::TooSlow
        } else if wpm > self.config.fast_wpm {
            PaceFeedback::TooFast
        } else {
            PaceFeedback::Good
        }
    }

    /// Scan adjacent word pairs for gaps over the threshold, in transcript
    /// order. Negative gaps (overlapping timestamps) are legal input and
    /// simply never exceed the threshold.
    fn detect_pauses(&self, words: &[WordToken]) -> Vec<LongPause> {
        let mut pauses = Vec::new();

        for pair in words.windows(2) {
            let gap = pair[1].start - pair[0].end;
            if gap > self.config.long_pause_secs {
                pauses.push(LongPause {
                    timestamp_seconds: pair[0].end,
                    duration_seconds: round2(gap),
                    after_word: pair[0].text.clone(),
                });
            }
        }

        pauses
    }

    /// Composite score: start at the maximum, subtract capped penalties for
    /// fillers, out-of-band pace and pauses, clamp to [min, max].
    fn clarity_score(&self, total_fillers: u32, wpm: f64, num_long_pauses: usize) -> f64 {
        let config = &self.config;
        let mut score = config.clarity_max;

        score -= (total_fillers as f64 * config.filler_penalty_per_word)
            .min(config.filler_penalty_cap);

        if wpm < config.slow_wpm || wpm > config.fast_wpm {
            score -= config.pace_penalty;
        }

        score -= (num_long_pauses as f64 * config.pause_penalty_per_pause)
            .min(config.pause_penalty_cap);

        score.clamp(config.clarity_min, config.clarity_max)
    }

    /// Partition words into ~10 s windows measured from recording start and
    /// compute per-window WPM. Non-trailing windows always divide by the
    /// fixed window length even when their words span slightly more or less;
    /// only the trailing window uses its actual elapsed duration.
    fn pacing_segments(&self, words: &[WordToken]) -> Vec<PacingSegment> {
        let config = &self.config;
        let mut segments = Vec::new();

        if words.len() <= config.pacing_min_words {
            return segments;
        }

        let window = config.pacing_window_secs;
        let mut segment_start = 0.0_f64;
        let mut words_in_segment = 0_usize;

        for word in words {
            if word.start - segment_start >= window {
                if words_in_segment > 0 {
                    let wpm = (words_in_segment as f64 / window) * 60.0;
                    segments.push(PacingSegment {
                        time_seconds: segment_start.floor() as i64,
                        wpm: round1(wpm),
                    });
                }
                words_in_segment = 0;
                segment_start = word.start;
            }
            words_in_segment += 1;
        }

        if words_in_segment > 0 {
            // words is non-empty here, so last() always yields a token
            if let Some(last) = words.last() {
                let remaining = last.end - segment_start;
                if remaining > 0.0 {
                    let wpm = (words_in_segment as f64 / remaining) * 60.0;
                    segments.push(PacingSegment {
                        time_seconds: segment_start.floor() as i64,
                        wpm: round1(wpm),
                    });
                }
            }
        }

        segments
    }
}

/// Count non-overlapping occurrences of `needle` in `haystack`, both already
/// lowercased, requiring a non-word character (or string edge) on each side.
fn count_phrase(haystack: &str, needle: &str) -> u32 {
    if needle.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut from = 0;

    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();

        let boundary_before = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !is_word_char(c));
        let boundary_after = haystack[end..].chars().next().is_none_or(|c| !is_word_char(c));

        if boundary_before && boundary_after {
            count += 1;
            from = end;
        } else {
            // Step one character forward and keep scanning
            from = start
                + haystack[start..]
                    .chars()
                    .next()
                    .map_or(1, |c| c.len_utf8());
        }
    }

    count
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One token per whitespace word, evenly spaced across [0, duration].
    fn evenly_spaced(text: &str, duration: f64) -> Vec<WordToken> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let step = duration / tokens.len() as f64;
        tokens
            .iter()
            .enumerate()
            .map(|(i, t)| WordToken::new(*t, i as f64 * step, (i + 1) as f64 * step))
            .collect()
    }

    #[test]
    fn test_empty_input_yields_zero_metrics() {
        let analyzer = Analyzer::default();
        let metrics = analyzer.analyze("", &[]);

        assert_eq!(metrics.duration_seconds, 0.0);
        assert_eq!(metrics.words_per_minute, 0.0);
        assert_eq!(metrics.total_fillers, 0);
        assert!(metrics.filler_counts.is_empty());
        assert!(metrics.long_pauses.is_empty());
        assert!(metrics.pacing_segments.is_empty());
        assert_eq!(metrics.pace_feedback, PaceFeedback::TooSlow);
        // 10.0 - 2.0 pace penalty, still within range
        assert_eq!(metrics.clarity_score, 8.0);
    }

    #[test]
    fn test_zero_duration_words_do_not_divide_by_zero() {
        let analyzer = Analyzer::default();
        let words = vec![WordToken::new("hi", 0.0, 0.0), WordToken::new("there", 0.0, 0.0)];
        let metrics = analyzer.analyze("hi there", &words);

        assert_eq!(metrics.duration_seconds, 0.0);
        assert_eq!(metrics.words_per_minute, 0.0);
    }

    #[test]
    fn test_filler_matching_is_whole_phrase() {
        let analyzer = Analyzer::default();

        let metrics = analyzer.analyze("I likely will", &[]);
        assert!(!metrics.filler_counts.contains_key("like"));

        let metrics = analyzer.analyze("I like it", &[]);
        assert_eq!(metrics.filler_counts.get("like"), Some(&1));
    }

    #[test]
    fn test_filler_matching_is_case_insensitive() {
        let analyzer = Analyzer::default();
        let metrics = analyzer.analyze("Um, SO I think... You Know.", &[]);

        assert_eq!(metrics.filler_counts.get("um"), Some(&1));
        assert_eq!(metrics.filler_counts.get("so"), Some(&1));
        assert_eq!(metrics.filler_counts.get("you know"), Some(&1));
    }

    #[test]
    fn test_multi_word_fillers_need_the_exact_sequence() {
        let analyzer = Analyzer::default();

        // "mean" alone is not "i mean"
        let metrics = analyzer.analyze("that is mean", &[]);
        assert!(!metrics.filler_counts.contains_key("i mean"));

        let metrics = analyzer.analyze("i mean, that is kind of fine", &[]);
        assert_eq!(metrics.filler_counts.get("i mean"), Some(&1));
        assert_eq!(metrics.filler_counts.get("kind of"), Some(&1));
    }

    #[test]
    fn test_total_fillers_is_sum_of_counts() {
        let analyzer = Analyzer::default();
        let metrics = analyzer.analyze("um um uh like basically like um", &[]);

        let sum: u32 = metrics.filler_counts.values().sum();
        assert_eq!(metrics.total_fillers, sum);
        assert_eq!(metrics.filler_counts.get("um"), Some(&3));
        assert_eq!(metrics.filler_counts.get("like"), Some(&2));
    }

    #[test]
    fn test_pause_over_threshold_is_reported() {
        let analyzer = Analyzer::default();
        let words = vec![
            WordToken::new("hello", 0.0, 1.0),
            WordToken::new("world", 4.0, 5.0),
        ];
        let metrics = analyzer.analyze("hello world", &words);

        assert_eq!(metrics.long_pauses.len(), 1);
        let pause = &metrics.long_pauses[0];
        assert_eq!(pause.timestamp_seconds, 1.0);
        assert_eq!(pause.duration_seconds, 3.0);
        assert_eq!(pause.after_word, "hello");
    }

    #[test]
    fn test_pause_threshold_is_strict() {
        let analyzer = Analyzer::default();
        let words = vec![
            WordToken::new("hello", 0.0, 1.0),
            WordToken::new("world", 3.0, 4.0),
        ];
        // gap is exactly 2.0s
        let metrics = analyzer.analyze("hello world", &words);
        assert!(metrics.long_pauses.is_empty());
    }

    #[test]
    fn test_overlapping_timestamps_are_tolerated() {
        let analyzer = Analyzer::default();
        let words = vec![
            WordToken::new("one", 0.0, 2.0),
            WordToken::new("two", 1.0, 3.0),
            WordToken::new("three", 1.0, 3.0),
        ];
        let metrics = analyzer.analyze("one two three", &words);

        assert!(metrics.long_pauses.is_empty());
        assert_eq!(metrics.duration_seconds, 3.0);
    }

    #[test]
    fn test_pace_band_boundaries_are_inclusive() {
        let analyzer = Analyzer::default();

        assert_eq!(analyzer.classify_pace(120.0), PaceFeedback::Good);
        assert_eq!(analyzer.classify_pace(160.0), PaceFeedback::Good);
        assert_eq!(analyzer.classify_pace(119.9), PaceFeedback::TooSlow);
        assert_eq!(analyzer.classify_pace(160.1), PaceFeedback::TooFast);
    }

    #[test]
    fn test_wpm_formula_uses_text_word_count() {
        let analyzer = Analyzer::default();
        // 4 text words over 60 seconds of audio timed by 2 tokens
        let words = vec![
            WordToken::new("alpha", 0.0, 30.0),
            WordToken::new("beta", 30.0, 60.0),
        ];
        let metrics = analyzer.analyze("alpha beta gamma delta", &words);

        assert_eq!(metrics.words_per_minute, 4.0);
        assert_eq!(metrics.duration_seconds, 60.0);
    }

    #[test]
    fn test_clarity_score_penalties_and_caps() {
        let analyzer = Analyzer::default();

        // 2 fillers, good pace, no pauses: 10 - 1 = 9
        assert_eq!(analyzer.clarity_score(2, 140.0, 0), 9.0);

        // filler penalty caps at 4 even for 50 fillers
        assert_eq!(analyzer.clarity_score(50, 140.0, 0), 6.0);

        // pace penalty is flat regardless of distance from the band
        assert_eq!(analyzer.clarity_score(0, 500.0, 0), 8.0);
        assert_eq!(analyzer.clarity_score(0, 119.0, 0), 8.0);

        // pause penalty caps at 2
        assert_eq!(analyzer.clarity_score(0, 140.0, 3), 8.5);
        assert_eq!(analyzer.clarity_score(0, 140.0, 20), 8.0);

        // worst case clamps to the floor, never below 1.0
        assert_eq!(analyzer.clarity_score(50, 500.0, 20), 2.0);
    }

    #[test]
    fn test_clarity_score_always_in_range() {
        let analyzer = Analyzer::default();
        for fillers in [0u32, 1, 5, 8, 100] {
            for wpm in [0.0, 90.0, 130.0, 200.0] {
                for pauses in [0usize, 1, 4, 50] {
                    let score = analyzer.clarity_score(fillers, wpm, pauses);
                    assert!((1.0..=10.0).contains(&score), "score {score} out of range");
                }
            }
        }
    }

    #[test]
    fn test_no_pacing_segments_at_ten_words_or_fewer() {
        let analyzer = Analyzer::default();
        let words = evenly_spaced("one two three four five six seven eight nine ten", 60.0);
        assert_eq!(words.len(), 10);

        let metrics = analyzer.analyze("one two three four five six seven eight nine ten", &words);
        assert!(metrics.pacing_segments.is_empty());
    }

    #[test]
    fn test_pacing_segments_fixed_window_then_trailing() {
        let analyzer = Analyzer::default();

        // 8 words inside the first 10s window, then 4 words from t=10 to
        // t=14. 12 words total, so segmentation runs.
        let mut words: Vec<WordToken> = (0..8)
            .map(|i| WordToken::new(format!("w{i}"), i as f64, i as f64 + 0.5))
            .collect();
        for i in 0..4 {
            let start = 10.0 + i as f64;
            words.push(WordToken::new(format!("t{i}"), start, start + 1.0));
        }
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let metrics = analyzer.analyze(&text, &words);

        assert_eq!(metrics.pacing_segments.len(), 2);

        // non-trailing window divides by the fixed 10s
        assert_eq!(metrics.pacing_segments[0].time_seconds, 0);
        assert_eq!(metrics.pacing_segments[0].wpm, 48.0);

        // trailing window divides by actual elapsed time: 4 words / 4s
        assert_eq!(metrics.pacing_segments[1].time_seconds, 10);
        assert_eq!(metrics.pacing_segments[1].wpm, 60.0);
    }

    #[test]
    fn test_trailing_segment_with_zero_elapsed_is_dropped() {
        let analyzer = Analyzer::default();

        // 11 words at t=0..11, then a final word whose start triggers a new
        // segment but whose end equals the segment start.
        let mut words: Vec<WordToken> = (0..11)
            .map(|i| WordToken::new(format!("w{i}"), i as f64 * 0.5, i as f64 * 0.5 + 0.4))
            .collect();
        words.push(WordToken::new("last", 12.0, 12.0));
        let text = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let metrics = analyzer.analyze(&text, &words);

        // only the closed leading window survives
        assert_eq!(metrics.pacing_segments.len(), 1);
        assert_eq!(metrics.pacing_segments[0].time_seconds, 0);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let analyzer = Analyzer::default();
        let text = "um so basically I think this works you know";
        let words = evenly_spaced(text, 12.0);

        let first = analyzer.analyze(text, &words);
        let second = analyzer.analyze(text, &words);
        assert_eq!(first, second);
    }

    #[test]
    fn test_end_to_end_short_recording() {
        let analyzer = Analyzer::default();
        let text = "um so I think this is like a good idea";
        let words = evenly_spaced(text, 6.0);
        assert_eq!(words.len(), 10);

        let metrics = analyzer.analyze(text, &words);

        assert_eq!(metrics.total_fillers, 3);
        assert_eq!(metrics.filler_counts.get("um"), Some(&1));
        assert_eq!(metrics.filler_counts.get("so"), Some(&1));
        assert_eq!(metrics.filler_counts.get("like"), Some(&1));

        // 10 words over 6 seconds
        assert_eq!(metrics.duration_seconds, 6.0);
        assert!((metrics.words_per_minute - 100.0).abs() < 1e-9);
        assert_eq!(metrics.pace_feedback, PaceFeedback::TooSlow);

        assert!(metrics.long_pauses.is_empty());
        // exactly 10 words, not more than 10
        assert!(metrics.pacing_segments.is_empty());

        // 10 - 1.5 (fillers) - 2 (pace) = 6.5
        assert!((metrics.clarity_score - 6.5).abs() < 1e-9);
    }
}

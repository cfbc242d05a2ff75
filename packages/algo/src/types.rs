//! Common Types and Constants
//!
//! Shared data structures used across all algorithm modules.

use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Number of fields in a feature vector
pub const FEATURE_COUNT: usize = 17;

/// Feature names in training order. The position of each name is part of
/// the persisted artifact format and must never be reordered.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "item_difficulty",
    "user_mastery",
    "days_since_last_review",
    "response_time_seconds",
    "quality_rating",
    "repetition_count",
    "current_ease_factor",
    "current_interval",
    "hour_of_day",
    "day_of_week",
    "time_since_learning_start",
    "previous_interval",
    "learning_pace",
    "cluster_mastery",
    "is_quiz",
    "quiz_score",
    "quiz_questions_count",
];

/// Default substituted for each absent field, aligned with [`FEATURE_NAMES`]
pub const FEATURE_DEFAULTS: [f64; FEATURE_COUNT] = [
    0.5,  // item_difficulty
    0.5,  // user_mastery
    0.0,  // days_since_last_review
    5.0,  // response_time_seconds
    3.0,  // quality_rating
    0.0,  // repetition_count
    2.5,  // current_ease_factor
    1.0,  // current_interval
    12.0, // hour_of_day
    3.0,  // day_of_week
    0.0,  // time_since_learning_start
    0.0,  // previous_interval
    1.0,  // learning_pace (medium)
    0.5,  // cluster_mastery
    0.0,  // is_quiz
    0.0,  // quiz_score
    0.0,  // quiz_questions_count
];

/// Index of `current_interval` inside a feature vector
pub const CURRENT_INTERVAL_INDEX: usize = 7;

/// Shortest interval the service will ever recommend (days)
pub const MIN_INTERVAL_DAYS: f64 = 1.0;

/// Longest interval the service will ever recommend (days)
pub const MAX_INTERVAL_DAYS: f64 = 180.0;

/// Confidence floor
pub const MIN_CONFIDENCE: f64 = 0.5;

/// Confidence ceiling
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Numerical stability epsilon
pub const EPSILON: f64 = 1e-10;

// ==================== Learning Pace ====================

/// Categorical learning pace of a learner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningPace {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl LearningPace {
    /// Exact, case-sensitive match on the stored labels.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "slow" => Some(LearningPace::Slow),
            "medium" => Some(LearningPace::Medium),
            "fast" => Some(LearningPace::Fast),
            _ => None,
        }
    }

    /// Numeric encoding used in the feature vector
    pub fn encode(self) -> f64 {
        match self {
            LearningPace::Slow => 0.0,
            LearningPace::Medium => 1.0,
            LearningPace::Fast => 2.0,
        }
    }
}

// ==================== Interval helpers ====================

/// Clips a raw model output into the serviceable interval range.
///
/// `+inf` clips to the ceiling and `-inf` to the floor; NaN is passed through
/// unchanged so callers can treat it as an inference failure.
pub fn clip_interval(raw: f64) -> f64 {
    if raw.is_nan() {
        return raw;
    }
    raw.clamp(MIN_INTERVAL_DAYS, MAX_INTERVAL_DAYS)
}

/// Trust heuristic for a single prediction.
///
/// Predictions close to twice the current interval are trusted most. The
/// result always lies in `[MIN_CONFIDENCE, MAX_CONFIDENCE]`; a non-positive or
/// non-finite `current_interval` yields the floor.
pub fn interval_confidence(predicted: f64, current_interval: f64) -> f64 {
    let typical = current_interval * 2.0;
    if !typical.is_finite() || typical <= EPSILON || !predicted.is_finite() {
        return MIN_CONFIDENCE;
    }
    let uncertainty = (predicted - typical).abs() / typical;
    (1.0 - 0.5 * uncertainty).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

//! Feature Encoding
//!
//! Turns a loosely-structured review observation into the fixed-order
//! 17-field vector the regressor is trained on.
//!
//! Decoding is lenient: numbers, booleans, numeric strings and `null` are
//! accepted for every numeric field, unknown keys are ignored, and anything
//! unreadable counts as absent and takes the documented default.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::sanitize::sanitize_with_defaults;
use crate::types::{
    LearningPace, CURRENT_INTERVAL_INDEX, FEATURE_COUNT, FEATURE_DEFAULTS, FEATURE_NAMES,
};

/// One review event as reported by the application layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureObservation {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub item_difficulty: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub user_mastery: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub days_since_last_review: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub response_time_seconds: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quality_rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub repetition_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_ease_factor: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_interval: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub hour_of_day: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub day_of_week: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub time_since_learning_start: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub previous_interval: Option<f64>,
    #[serde(default, deserialize_with = "lenient_pace")]
    pub learning_pace: Option<LearningPace>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cluster_mastery: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub is_quiz: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quiz_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quiz_questions_count: Option<f64>,
}

impl FeatureObservation {
    /// Decodes an observation from a JSON document. Anything other than an
    /// object (including `null`) is treated as an empty observation.
    pub fn from_json_value(value: &Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(_) => Self::deserialize(value),
            _ => Ok(Self::default()),
        }
    }

    fn fields(&self) -> [Option<f64>; FEATURE_COUNT] {
        [
            self.item_difficulty,
            self.user_mastery,
            self.days_since_last_review,
            self.response_time_seconds,
            self.quality_rating,
            self.repetition_count,
            self.current_ease_factor,
            self.current_interval,
            self.hour_of_day,
            self.day_of_week,
            self.time_since_learning_start,
            self.previous_interval,
            self.learning_pace.map(LearningPace::encode),
            self.cluster_mastery,
            self.is_quiz,
            self.quiz_score,
            self.quiz_questions_count,
        ]
    }
}

/// Fixed-order numeric encoding of a [`FeatureObservation`].
///
/// Always finite; the order follows [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl Default for FeatureVector {
    fn default() -> Self {
        Self(FEATURE_DEFAULTS)
    }
}

impl FeatureVector {
    pub fn from_observation(observation: &FeatureObservation) -> Self {
        let mut values = FEATURE_DEFAULTS;
        for (slot, field) in values.iter_mut().zip(observation.fields()) {
            if let Some(v) = field {
                *slot = v;
            }
        }
        sanitize_with_defaults(&mut values, &FEATURE_DEFAULTS);
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    pub fn current_interval(&self) -> f64 {
        self.0[CURRENT_INTERVAL_INDEX]
    }

    /// Looks a field up by its training-time name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.0[idx])
    }
}

// ==================== Lenient decoders ====================

/// Reads a JSON scalar as a number the same way observation fields are read.
pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64))
}

fn lenient_pace<'de, D>(deserializer: D) -> Result<Option<LearningPace>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => LearningPace::from_str(&s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(value: Value) -> FeatureVector {
        let obs = FeatureObservation::from_json_value(&value).expect("decode");
        FeatureVector::from_observation(&obs)
    }

    #[test]
    fn test_empty_mapping_gives_defaults() {
        let v = build(json!({}));
        assert_eq!(v.as_slice(), &FEATURE_DEFAULTS[..]);
        assert_eq!(v, FeatureVector::default());
    }

    #[test]
    fn test_non_object_gives_defaults() {
        assert_eq!(build(json!(null)), FeatureVector::default());
        assert_eq!(build(json!([1, 2, 3])), FeatureVector::default());
    }

    #[test]
    fn test_fields_land_in_order() {
        let v = build(json!({
            "item_difficulty": 0.9,
            "current_interval": 10,
            "quiz_questions_count": 12,
        }));
        assert_eq!(v.as_slice()[0], 0.9);
        assert_eq!(v.as_slice()[7], 10.0);
        assert_eq!(v.as_slice()[16], 12.0);
        assert_eq!(v.current_interval(), 10.0);
        assert_eq!(v.get("quiz_questions_count"), Some(12.0));
        assert_eq!(v.get("unknown"), None);
    }

    #[test]
    fn test_learning_pace_mapping() {
        assert_eq!(build(json!({"learning_pace": "fast"})).as_slice()[12], 2.0);
        assert_eq!(build(json!({"learning_pace": "medium"})).as_slice()[12], 1.0);
        assert_eq!(build(json!({"learning_pace": "slow"})).as_slice()[12], 0.0);
        assert_eq!(build(json!({"learning_pace": "sluggish"})).as_slice()[12], 1.0);
        assert_eq!(build(json!({"learning_pace": 2})).as_slice()[12], 1.0);
        assert_eq!(build(json!({"learning_pace": null})).as_slice()[12], 1.0);
    }

    #[test]
    fn test_lenient_values() {
        let v = build(json!({
            "is_quiz": true,
            "quiz_score": "85",
            "user_mastery": null,
            "hour_of_day": {"nested": 1},
            "extra_field": "ignored",
        }));
        assert_eq!(v.get("is_quiz"), Some(1.0));
        assert_eq!(v.get("quiz_score"), Some(85.0));
        assert_eq!(v.get("user_mastery"), Some(0.5));
        assert_eq!(v.get("hour_of_day"), Some(12.0));
    }

    #[test]
    fn test_non_finite_replaced_by_default() {
        let obs = FeatureObservation {
            current_interval: Some(f64::NAN),
            quality_rating: Some(f64::INFINITY),
            ..Default::default()
        };
        let v = FeatureVector::from_observation(&obs);
        assert_eq!(v.current_interval(), 1.0);
        assert_eq!(v.get("quality_rating"), Some(3.0));
    }
}

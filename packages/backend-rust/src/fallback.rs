//! Handoff to the deterministic scheduler when the model cannot answer.

use nsm_algo::FeatureObservation;
use serde::Serialize;

use crate::prediction::PredictionService;

/// The rule-based interval scheduler the application already owns.
pub trait FallbackPolicy: Send + Sync {
    fn next_interval(&self, observation: &FeatureObservation) -> f64;
}

impl<F> FallbackPolicy for F
where
    F: Fn(&FeatureObservation) -> f64 + Send + Sync,
{
    fn next_interval(&self, observation: &FeatureObservation) -> f64 {
        self(observation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalSource {
    NeuralNetwork,
    Rules,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledReview {
    pub interval_days: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub source: IntervalSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<&'static str>,
}

/// Asks the model first and the rules otherwise.
pub fn schedule_next_review(
    service: &PredictionService,
    policy: &dyn FallbackPolicy,
    observation: &FeatureObservation,
) -> ScheduledReview {
    match service.try_predict(observation) {
        Ok(prediction) => ScheduledReview {
            interval_days: prediction.predicted_interval,
            confidence: Some(prediction.confidence),
            source: IntervalSource::NeuralNetwork,
            fallback_reason: None,
        },
        Err(err) => {
            tracing::debug!(reason = err.kind(), "scheduling with rules");
            ScheduledReview {
                interval_days: policy.next_interval(observation),
                confidence: None,
                source: IntervalSource::Rules,
                fallback_reason: Some(err.kind()),
            }
        }
    }
}

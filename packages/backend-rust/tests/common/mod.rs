#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use nsm_algo::{
    AlgoResult, FeatureObservation, FeatureVector, IntervalPredictor, StandardScaler,
    CURRENT_INTERVAL_INDEX, FEATURE_COUNT,
};
use nsm_backend::artifact::{ArtifactError, BundleMetadata, BUNDLE_VERSION};
use nsm_backend::data_source::TrainingExample;
use nsm_backend::prediction::{BundleLoader, LoadedBundle};

/// Returns the (scaled) `current_interval` column unchanged.
pub struct PassthroughModel;

impl IntervalPredictor for PassthroughModel {
    fn input_dim(&self) -> usize {
        FEATURE_COUNT
    }

    fn predict(&self, features: &[f64]) -> AlgoResult<f64> {
        Ok(features[CURRENT_INTERVAL_INDEX])
    }
}

/// Serves a passthrough model behind an identity scaler, counting loads.
#[derive(Default)]
pub struct PassthroughLoader {
    pub loads: Arc<AtomicUsize>,
    pub delay_ms: u64,
}

impl PassthroughLoader {
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl BundleLoader for PassthroughLoader {
    fn load_bundle(&self) -> Result<LoadedBundle, ArtifactError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(self.delay_ms));
        }
        Ok(LoadedBundle {
            predictor: Arc::new(PassthroughModel),
            scaler: StandardScaler::identity(FEATURE_COUNT),
            metadata: BundleMetadata {
                trained_at: Utc::now(),
                training_samples: 800,
                validation_samples: 200,
                val_mae: 1.25,
                val_loss: 2.5,
                model_version: BUNDLE_VERSION.to_string(),
                feature_count: FEATURE_COUNT,
            },
        })
    }
}

pub fn observation(json: serde_json::Value) -> FeatureObservation {
    FeatureObservation::from_json_value(&json).unwrap()
}

/// Synthetic reviews whose outcome grows with the current interval and
/// the quality rating.
pub fn synthetic_examples(n: usize) -> Vec<TrainingExample> {
    let now = Utc::now();
    (0..n)
        .map(|i| {
            let current_interval = 1.0 + (i % 20) as f64;
            let quality = (i % 6) as f64;
            let observation = observation(serde_json::json!({
                "current_interval": current_interval,
                "quality_rating": quality,
                "repetition_count": i % 8,
                "item_difficulty": (i % 10) as f64 / 10.0,
            }));
            TrainingExample::new(
                FeatureVector::from_observation(&observation),
                current_interval * (1.0 + quality / 5.0),
                now - Duration::minutes(i as i64),
            )
        })
        .collect()
}

//! Online interval prediction with a lazily loaded, process-wide model bundle.
//!
//! Handle lifecycle:
//!
//! ```text
//! Uninitialized ──first use──▶ Loading ──ok──▶ Ready
//!                                 └──error──▶ Unavailable
//! Ready / Unavailable ──reload()──▶ Loading ...
//! any ──unload()──▶ Uninitialized
//! ```
//!
//! Every failure is folded into a [`ServingError`]; callers see it as a
//! response with `fallback_to_rules = true` and hand over to the rule-based
//! scheduler.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use nsm_algo::sanitize::has_invalid_values;
use nsm_algo::{
    clip_interval, interval_confidence, FeatureObservation, FeatureVector, IntervalPredictor,
    StandardScaler,
};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use thiserror::Error;

use crate::artifact::{ArtifactBundle, ArtifactError, BundleMetadata, FsArtifactStore};
use crate::response::{PredictionResponse, StatusResponse};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServingError {
    #[error("Model not trained yet")]
    NotTrained,
    #[error("Model artifact unusable: {0}")]
    CorruptArtifact(String),
    #[error("Prediction failed: {0}")]
    InferenceFailure(String),
}

impl ServingError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotTrained => "not_trained",
            Self::CorruptArtifact(_) => "corrupt_artifact",
            Self::InferenceFailure(_) => "inference_failure",
        }
    }
}

impl From<&ArtifactError> for ServingError {
    fn from(err: &ArtifactError) -> Self {
        if err.is_not_trained() {
            Self::NotTrained
        } else {
            Self::CorruptArtifact(err.to_string())
        }
    }
}

/// A bundle ready to serve. The model sits behind [`IntervalPredictor`].
pub struct LoadedBundle {
    pub predictor: Arc<dyn IntervalPredictor>,
    pub scaler: StandardScaler,
    pub metadata: BundleMetadata,
}

impl fmt::Debug for LoadedBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedBundle")
            .field("input_dim", &self.predictor.input_dim())
            .field("scaler_width", &self.scaler.width())
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl From<ArtifactBundle> for LoadedBundle {
    fn from(bundle: ArtifactBundle) -> Self {
        Self {
            predictor: Arc::new(bundle.model),
            scaler: bundle.scaler,
            metadata: bundle.metadata,
        }
    }
}

/// Source of the bundle the service serves.
pub trait BundleLoader: Send + Sync {
    fn load_bundle(&self) -> Result<LoadedBundle, ArtifactError>;
}

impl BundleLoader for FsArtifactStore {
    fn load_bundle(&self) -> Result<LoadedBundle, ArtifactError> {
        self.load().map(LoadedBundle::from)
    }
}

#[derive(Debug, Clone)]
pub enum HandleState {
    Uninitialized,
    Loading,
    Ready(Arc<LoadedBundle>),
    Unavailable(ServingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlePhase {
    Uninitialized,
    Loading,
    Ready,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub predicted_interval: f64,
    pub confidence: f64,
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
}

pub struct PredictionService {
    loader: Box<dyn BundleLoader>,
    model_dir: Option<PathBuf>,
    state: RwLock<HandleState>,
    load_lock: Mutex<()>,
}

impl PredictionService {
    pub fn new(loader: Box<dyn BundleLoader>) -> Self {
        Self {
            loader,
            model_dir: None,
            state: RwLock::new(HandleState::Uninitialized),
            load_lock: Mutex::new(()),
        }
    }

    pub fn from_dir(model_dir: impl Into<PathBuf>) -> Self {
        let model_dir = model_dir.into();
        Self {
            model_dir: Some(model_dir.clone()),
            ..Self::new(Box::new(FsArtifactStore::new(model_dir)))
        }
    }

    /// Directory the bundles come from; `None` for custom loaders.
    pub fn model_dir(&self) -> Option<&Path> {
        self.model_dir.as_deref()
    }

    pub fn phase(&self) -> HandlePhase {
        match &*self.state.read() {
            HandleState::Uninitialized => HandlePhase::Uninitialized,
            HandleState::Loading => HandlePhase::Loading,
            HandleState::Ready(_) => HandlePhase::Ready,
            HandleState::Unavailable(_) => HandlePhase::Unavailable,
        }
    }

    /// The active bundle, loading it on first use. Concurrent first callers
    /// wait for a single load.
    pub fn bundle(&self) -> Result<Arc<LoadedBundle>, ServingError> {
        if let Some(settled) = self.settled() {
            return settled;
        }

        let _guard = self.load_lock.lock();
        if let Some(settled) = self.settled() {
            return settled;
        }
        self.load_locked()
    }

    /// Re-reads the bundle from storage, e.g. after a training run.
    pub fn reload(&self) -> Result<(), ServingError> {
        let _guard = self.load_lock.lock();
        self.load_locked().map(|_| ())
    }

    /// Drops the cached bundle; the next request loads again.
    pub fn unload(&self) {
        let _guard = self.load_lock.lock();
        *self.state.write() = HandleState::Uninitialized;
        tracing::debug!("model bundle unloaded");
    }

    pub fn try_predict(&self, observation: &FeatureObservation) -> Result<Prediction, ServingError> {
        let bundle = self.bundle()?;
        let vector = FeatureVector::from_observation(observation);

        let scaled = bundle
            .scaler
            .transform_one(vector.as_slice())
            .map_err(|err| ServingError::InferenceFailure(err.to_string()))?;
        if has_invalid_values(&scaled) {
            return Err(ServingError::InferenceFailure(
                "scaled features are not finite".to_string(),
            ));
        }
        let raw = bundle
            .predictor
            .predict(&scaled)
            .map_err(|err| ServingError::InferenceFailure(err.to_string()))?;
        if raw.is_nan() {
            return Err(ServingError::InferenceFailure("model produced NaN".to_string()));
        }

        let predicted_interval = clip_interval(raw);
        Ok(Prediction {
            predicted_interval,
            confidence: interval_confidence(predicted_interval, vector.current_interval()),
            model_version: bundle.metadata.model_version.clone(),
            trained_at: bundle.metadata.trained_at,
        })
    }

    /// Never fails: errors come back as a fallback response.
    pub fn predict(&self, observation: &FeatureObservation) -> PredictionResponse {
        let result = self.try_predict(observation);
        if let Err(err) = &result {
            log_serving_error(err);
        }
        PredictionResponse::from(result)
    }

    /// Like [`predict`](Self::predict) for a raw JSON feature document.
    pub fn predict_json(&self, features: &Value) -> PredictionResponse {
        match FeatureObservation::from_json_value(features) {
            Ok(observation) => self.predict(&observation),
            Err(err) => {
                let err = ServingError::InferenceFailure(format!("unreadable features: {err}"));
                log_serving_error(&err);
                PredictionResponse::fallback(&err)
            }
        }
    }

    pub fn status(&self) -> StatusResponse {
        match self.bundle() {
            Ok(bundle) => StatusResponse {
                success: true,
                model_available: true,
                model_version: Some(bundle.metadata.model_version.clone()),
                trained_at: Some(bundle.metadata.trained_at.to_rfc3339()),
                training_samples: Some(bundle.metadata.training_samples),
                validation_mae: Some(bundle.metadata.val_mae),
                message: None,
            },
            Err(err) => StatusResponse::unavailable(&err),
        }
    }

    fn settled(&self) -> Option<Result<Arc<LoadedBundle>, ServingError>> {
        match &*self.state.read() {
            HandleState::Ready(bundle) => Some(Ok(Arc::clone(bundle))),
            HandleState::Unavailable(err) => Some(Err(err.clone())),
            HandleState::Uninitialized | HandleState::Loading => None,
        }
    }

    /// Caller must hold `load_lock`.
    fn load_locked(&self) -> Result<Arc<LoadedBundle>, ServingError> {
        *self.state.write() = HandleState::Loading;

        let (next, result) = match self.loader.load_bundle() {
            Ok(bundle) => {
                tracing::info!(
                    model_version = %bundle.metadata.model_version,
                    trained_at = %bundle.metadata.trained_at,
                    training_samples = bundle.metadata.training_samples,
                    "model bundle ready"
                );
                let bundle = Arc::new(bundle);
                (HandleState::Ready(Arc::clone(&bundle)), Ok(bundle))
            }
            Err(err) => {
                let serving = ServingError::from(&err);
                tracing::warn!(reason = serving.kind(), error = %err, "model bundle unavailable");
                (HandleState::Unavailable(serving.clone()), Err(serving))
            }
        };

        *self.state.write() = next;
        result
    }
}

fn log_serving_error(err: &ServingError) {
    match err {
        ServingError::InferenceFailure(_) => {
            tracing::warn!(reason = err.kind(), error = %err, "prediction failed, falling back to rules")
        }
        _ => tracing::debug!(reason = err.kind(), "model unavailable, falling back to rules"),
    }
}

static GLOBAL_SERVICE: OnceLock<Arc<PredictionService>> = OnceLock::new();

/// Process-wide service over `model_dir`. The first initialisation wins;
/// a later call naming another directory is logged and gets the existing
/// service.
pub fn init_prediction_service(model_dir: impl Into<PathBuf>) -> Arc<PredictionService> {
    let model_dir = model_dir.into();
    let service = GLOBAL_SERVICE
        .get_or_init(|| Arc::new(PredictionService::from_dir(model_dir.clone())))
        .clone();
    if service.model_dir() != Some(model_dir.as_path()) {
        tracing::warn!(
            requested = %model_dir.display(),
            active = %service.model_dir().map(|dir| dir.display().to_string()).unwrap_or_default(),
            "prediction service already initialised for another model directory"
        );
    }
    service
}

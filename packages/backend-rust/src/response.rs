//! JSON envelopes printed by the CLI and returned by the prediction service.
//!
//! Every envelope carries `success`; callers branch on it first, then on
//! `fallback_to_rules` / `model_available`.

use serde::Serialize;

use crate::prediction::{Prediction, ServingError};
use crate::training::{TrainingError, TrainingSummary};

pub const NEURAL_NETWORK_METHOD: &str = "neural_network";
pub const NOT_TRAINED_MESSAGE: &str = "Model not trained yet. Using rule-based fallback.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSuccess {
    pub success: bool,
    pub predicted_interval: f64,
    pub confidence: f64,
    pub model_version: String,
    pub trained_at: String,
    pub method: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackResponse {
    pub success: bool,
    pub error: String,
    pub reason: &'static str,
    pub fallback_to_rules: bool,
}

impl From<&ServingError> for FallbackResponse {
    fn from(err: &ServingError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            reason: err.kind(),
            fallback_to_rules: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Success(PredictionSuccess),
    Fallback(FallbackResponse),
}

impl PredictionResponse {
    pub fn fallback(err: &ServingError) -> Self {
        Self::Fallback(FallbackResponse::from(err))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn fallback_to_rules(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

impl From<Result<Prediction, ServingError>> for PredictionResponse {
    fn from(result: Result<Prediction, ServingError>) -> Self {
        match result {
            Ok(prediction) => Self::Success(PredictionSuccess {
                success: true,
                predicted_interval: prediction.predicted_interval,
                confidence: prediction.confidence,
                model_version: prediction.model_version,
                trained_at: prediction.trained_at.to_rfc3339(),
                method: NEURAL_NETWORK_METHOD,
            }),
            Err(err) => Self::fallback(&err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub model_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_mae: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn unavailable(err: &ServingError) -> Self {
        let message = match err {
            ServingError::NotTrained => NOT_TRAINED_MESSAGE.to_string(),
            other => format!("{other}. Using rule-based fallback."),
        };
        Self {
            success: true,
            model_available: false,
            model_version: None,
            trained_at: None,
            training_samples: None,
            validation_mae: None,
            message: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TrainingResponse {
    Trained {
        success: bool,
        training_samples: usize,
        validation_samples: usize,
        val_mae: f64,
        val_loss: f64,
        model_path: String,
    },
    InsufficientData {
        success: bool,
        error: String,
        samples_collected: usize,
        samples_needed: usize,
    },
    Failed {
        success: bool,
        error: String,
    },
}

impl TrainingResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Trained { .. })
    }
}

impl From<&Result<TrainingSummary, TrainingError>> for TrainingResponse {
    fn from(result: &Result<TrainingSummary, TrainingError>) -> Self {
        match result {
            Ok(summary) => Self::Trained {
                success: true,
                training_samples: summary.training_samples,
                validation_samples: summary.validation_samples,
                val_mae: summary.val_mae,
                val_loss: summary.val_loss,
                model_path: summary.model_path.display().to_string(),
            },
            Err(err) => match err {
                TrainingError::InsufficientData {
                    collected,
                    required,
                } => Self::InsufficientData {
                    success: false,
                    error: err.to_string(),
                    samples_collected: *collected,
                    samples_needed: *required,
                },
                _ => Self::Failed {
                    success: false,
                    error: err.to_string(),
                },
            },
        }
    }
}

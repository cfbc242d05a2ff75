//! Offline training: fetch → split → scale → fit → persist.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use nsm_algo::{
    train_validation_split, AlgoError, IntervalRegressor, StandardScaler, TrainingReport,
    FEATURE_COUNT,
};
use thiserror::Error;

use crate::artifact::{ArtifactBundle, ArtifactError, BundleMetadata, FsArtifactStore, BUNDLE_VERSION};
use crate::config::{ConfigError, TrainingConfig};
use crate::data_source::{PgTrainingDataSource, TrainingDataSource};
use crate::prediction::{PredictionService, ServingError};

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("Not enough training data. Need {required}, have {collected}")]
    InsufficientData { collected: usize, required: usize },
    #[error("training data source failed: {0}")]
    DataSource(#[from] sqlx::Error),
    #[error("model training failed: {0}")]
    Model(#[from] AlgoError),
    #[error("saving model bundle failed: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("training task aborted: {0}")]
    Aborted(String),
    #[error("trained bundle could not be served: {0}")]
    Reload(#[from] ServingError),
}

#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub training_samples: usize,
    pub validation_samples: usize,
    pub val_mae: f64,
    pub val_loss: f64,
    pub model_path: PathBuf,
    pub report: TrainingReport,
}

/// Runs one training job against an artifact store. Runs are expected to be
/// serialized by the caller.
pub struct TrainingPipeline {
    config: TrainingConfig,
    store: FsArtifactStore,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig, store: FsArtifactStore) -> Self {
        Self { config, store }
    }

    pub async fn run(&self, source: &dyn TrainingDataSource) -> Result<TrainingSummary, TrainingError> {
        self.config.validate()?;

        tracing::info!(source = source.name(), "fetching training data");
        let examples = source.fetch_examples().await?;
        let fetched = examples.len();

        let (x, y): (Vec<Vec<f64>>, Vec<f64>) = examples
            .into_iter()
            .filter(|example| example.has_valid_outcome())
            .map(|example| (example.features.to_vec(), example.outcome_interval))
            .unzip();

        let dropped = fetched - x.len();
        if dropped > 0 {
            tracing::warn!(dropped, "examples with unusable outcome intervals dropped");
        }

        if x.len() < self.config.min_samples {
            tracing::warn!(
                collected = x.len(),
                required = self.config.min_samples,
                "not enough training data"
            );
            return Err(TrainingError::InsufficientData {
                collected: x.len(),
                required: self.config.min_samples,
            });
        }

        let config = self.config.clone();
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || fit_and_persist(&config, &store, x, y))
            .await
            .map_err(|err| TrainingError::Aborted(err.to_string()))?
    }
}

fn fit_and_persist(
    config: &TrainingConfig,
    store: &FsArtifactStore,
    x: Vec<Vec<f64>>,
    y: Vec<f64>,
) -> Result<TrainingSummary, TrainingError> {
    let seed = config.regressor.seed;
    let (x_train, y_train, x_val, y_val) =
        train_validation_split(&x, &y, config.validation_split, seed)?;
    tracing::info!(
        training_samples = x_train.len(),
        validation_samples = x_val.len(),
        seed,
        "dataset split"
    );

    // validation rows must not leak into the scaler statistics
    let scaler = StandardScaler::fit(&x_train)?;
    let x_train = scaler.transform(&x_train)?;
    let x_val = scaler.transform(&x_val)?;

    let (model, report) = IntervalRegressor::fit(&x_train, &y_train, &x_val, &y_val, &config.regressor)?;
    for epoch in &report.history {
        tracing::debug!(
            epoch = epoch.epoch,
            train_loss = epoch.train_loss,
            val_loss = epoch.val_loss,
            val_mae = epoch.val_mae,
            "epoch finished"
        );
    }
    tracing::info!(
        epochs_run = report.epochs_run,
        best_epoch = report.best_epoch,
        stopped_early = report.stopped_early,
        val_loss = report.validation.loss,
        val_mae = report.validation.mae,
        "model trained"
    );

    let bundle = ArtifactBundle {
        model,
        scaler,
        metadata: BundleMetadata {
            trained_at: Utc::now(),
            training_samples: x_train.len(),
            validation_samples: x_val.len(),
            val_mae: report.validation.mae,
            val_loss: report.validation.loss,
            model_version: BUNDLE_VERSION.to_string(),
            feature_count: FEATURE_COUNT,
        },
    };
    let model_path = store.save(&bundle)?;

    Ok(TrainingSummary {
        training_samples: bundle.metadata.training_samples,
        validation_samples: bundle.metadata.validation_samples,
        val_mae: bundle.metadata.val_mae,
        val_loss: bundle.metadata.val_loss,
        model_path,
        report,
    })
}

/// A full training run against Postgres with settings read through `lookup`
/// (normally the process environment). Configuration errors are reported
/// before anything touches `model_dir`.
pub async fn run_configured(
    lookup: impl Fn(&str) -> Option<String>,
    model_dir: PathBuf,
    min_samples: Option<usize>,
) -> Result<TrainingSummary, TrainingError> {
    let mut config = TrainingConfig::from_lookup(lookup)?;
    if let Some(min_samples) = min_samples {
        config.min_samples = min_samples;
    }

    let source = PgTrainingDataSource::new(config.database_url.clone());
    tracing::info!(model_dir = %model_dir.display(), min_samples = config.min_samples, "training started");
    TrainingPipeline::new(config, FsArtifactStore::new(model_dir))
        .run(&source)
        .await
}

/// Trains, then makes `service` serve the new bundle.
pub async fn retrain_and_reload(
    pipeline: &TrainingPipeline,
    source: &dyn TrainingDataSource,
    service: &Arc<PredictionService>,
) -> Result<TrainingSummary, TrainingError> {
    let summary = pipeline.run(source).await?;
    service.reload()?;
    Ok(summary)
}

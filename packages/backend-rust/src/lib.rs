//! Neural Spaced Mastery service layer: artifact storage, training pipeline,
//! prediction service and the fallback handoff.

pub mod artifact;
pub mod config;
pub mod data_source;
pub mod fallback;
pub mod logging;
pub mod prediction;
pub mod response;
pub mod training;

pub use artifact::{ArtifactBundle, ArtifactError, BundleMetadata, FsArtifactStore};
pub use config::{Config, ConfigError, TrainingConfig};
pub use data_source::{
    InMemoryTrainingDataSource, PgTrainingDataSource, TrainingDataSource, TrainingExample,
};
pub use fallback::{schedule_next_review, FallbackPolicy, IntervalSource, ScheduledReview};
pub use prediction::{
    init_prediction_service, BundleLoader, HandlePhase, LoadedBundle,
    Prediction, PredictionService, ServingError,
};
pub use response::{PredictionResponse, StatusResponse, TrainingResponse};
pub use training::{retrain_and_reload, TrainingError, TrainingPipeline, TrainingSummary};

//! Where training examples come from.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nsm_algo::{value_to_f64, FeatureObservation, FeatureVector};
use serde_json::Value;
use sqlx::{Connection, PgConnection, Row};

/// Outcome interval used when the stored outcome has no `next_interval`.
pub const DEFAULT_OUTCOME_INTERVAL: f64 = 1.0;

const SELECT_TRAINING_DATA: &str = r#"SELECT feature_data, outcome_data, recorded_at
    FROM ml_training_data
    ORDER BY recorded_at DESC"#;

/// A logged review: its features and the interval that turned out right.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub features: FeatureVector,
    pub outcome_interval: f64,
    pub recorded_at: DateTime<Utc>,
}

impl TrainingExample {
    pub fn new(features: FeatureVector, outcome_interval: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            features,
            outcome_interval,
            recorded_at,
        }
    }

    /// Builds an example from the stored feature and outcome documents.
    /// Missing documents behave like empty objects.
    pub fn from_documents(
        feature_data: Option<&Value>,
        outcome_data: Option<&Value>,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        let observation = match feature_data {
            Some(value) => FeatureObservation::from_json_value(value)?,
            None => FeatureObservation::default(),
        };
        let outcome_interval = outcome_data
            .and_then(|outcome| outcome.get("next_interval"))
            .filter(|value| !value.is_null())
            .map(|value| value_to_f64(value).unwrap_or(f64::NAN))
            .unwrap_or(DEFAULT_OUTCOME_INTERVAL);

        Ok(Self::new(
            FeatureVector::from_observation(&observation),
            outcome_interval,
            recorded_at,
        ))
    }

    /// Outcome intervals must be positive finite days to be learnable.
    pub fn has_valid_outcome(&self) -> bool {
        self.outcome_interval.is_finite() && self.outcome_interval > 0.0
    }
}

/// Fetches every training example, most recent first.
#[async_trait]
pub trait TrainingDataSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_examples(&self) -> Result<Vec<TrainingExample>, sqlx::Error>;
}

/// Reads `ml_training_data` over a single connection opened per call.
pub struct PgTrainingDataSource {
    database_url: String,
}

impl PgTrainingDataSource {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }
}

#[async_trait]
impl TrainingDataSource for PgTrainingDataSource {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn fetch_examples(&self) -> Result<Vec<TrainingExample>, sqlx::Error> {
        let mut conn = PgConnection::connect(&self.database_url).await?;
        let rows = sqlx::query(SELECT_TRAINING_DATA).fetch_all(&mut conn).await;
        if let Err(err) = conn.close().await {
            tracing::debug!(error = %err, "closing training data connection failed");
        }
        let rows = rows?;

        let mut examples = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;
        for row in &rows {
            let feature_data: Option<Value> = row.try_get("feature_data")?;
            let outcome_data: Option<Value> = row.try_get("outcome_data")?;
            let recorded_at: DateTime<Utc> = row.try_get("recorded_at")?;

            match TrainingExample::from_documents(
                feature_data.as_ref(),
                outcome_data.as_ref(),
                recorded_at,
            ) {
                Ok(example) => examples.push(example),
                Err(err) => {
                    skipped += 1;
                    tracing::debug!(error = %err, "unreadable feature document");
                }
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, "training rows with unreadable features skipped");
        }
        tracing::info!(rows = rows.len(), examples = examples.len(), "training data fetched");
        Ok(examples)
    }
}

/// Fixed set of examples, served most recent first.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTrainingDataSource {
    examples: Vec<TrainingExample>,
}

impl InMemoryTrainingDataSource {
    pub fn new(mut examples: Vec<TrainingExample>) -> Self {
        examples.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Self { examples }
    }
}

#[async_trait]
impl TrainingDataSource for InMemoryTrainingDataSource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_examples(&self) -> Result<Vec<TrainingExample>, sqlx::Error> {
        Ok(self.examples.clone())
    }
}

use std::path::PathBuf;

use nsm_algo::RegressorConfig;
use thiserror::Error;

pub const DEFAULT_MODEL_DIR: &str = "./models";
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const DEFAULT_LOG_LEVEL: &str = "info,sqlx=warn";
pub const DEFAULT_LOG_MAX_FILES: usize = 7;
pub const DEFAULT_MIN_SAMPLES: usize = 500;
pub const DEFAULT_VALIDATION_SPLIT: f64 = 0.2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required env var: {key}")]
    Missing { key: &'static str },
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Config {
    pub model_dir: PathBuf,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    /// `EnvFilter` directives, e.g. `info,nsm_backend=debug`.
    pub level: String,
    /// Daily-rotated file logs are written here when set.
    pub file_dir: Option<PathBuf>,
    pub max_files: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file_dir: None,
            max_files: DEFAULT_LOG_MAX_FILES,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let model_dir = non_blank(&lookup, "NSM_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR));

        let file_logs = non_blank(&lookup, "ENABLE_FILE_LOGS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);
        let log = LogSettings {
            level: non_blank(&lookup, "RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            file_dir: file_logs.then(|| {
                non_blank(&lookup, "LOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
            }),
            max_files: parsed(&lookup, "LOG_MAX_FILES", DEFAULT_LOG_MAX_FILES).max(1),
        };

        Self { model_dir, log }
    }
}

/// Settings for a training run. Only the training pipeline needs a database.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub database_url: String,
    pub min_samples: usize,
    pub validation_split: f64,
    pub regressor: RegressorConfig,
}

impl TrainingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the training settings from any key/value source. Unparseable
    /// numbers keep their defaults; the result is validated before return.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = non_blank(&lookup, "DATABASE_URL").ok_or(ConfigError::Missing {
            key: "DATABASE_URL",
        })?;

        let defaults = RegressorConfig::default();
        let regressor = RegressorConfig {
            max_epochs: parsed(&lookup, "NSM_MAX_EPOCHS", defaults.max_epochs),
            batch_size: parsed(&lookup, "NSM_BATCH_SIZE", defaults.batch_size),
            patience: parsed(&lookup, "NSM_PATIENCE", defaults.patience),
            seed: parsed(&lookup, "NSM_SEED", defaults.seed),
            ..defaults
        };

        let config = Self {
            database_url,
            min_samples: parsed(&lookup, "NSM_MIN_SAMPLES", DEFAULT_MIN_SAMPLES),
            validation_split: parsed(&lookup, "NSM_VALIDATION_SPLIT", DEFAULT_VALIDATION_SPLIT),
            regressor,
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration for callers that bring their own data source.
    pub fn with_source(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            min_samples: DEFAULT_MIN_SAMPLES,
            validation_split: DEFAULT_VALIDATION_SPLIT,
            regressor: RegressorConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.validation_split > 0.0 && self.validation_split < 1.0) {
            return Err(ConfigError::Invalid {
                key: "NSM_VALIDATION_SPLIT",
                reason: format!("{} is outside (0, 1)", self.validation_split),
            });
        }
        if self.min_samples < 2 {
            return Err(ConfigError::Invalid {
                key: "NSM_MIN_SAMPLES",
                reason: "at least 2 samples are needed to hold out a validation split".to_string(),
            });
        }
        self.regressor
            .validate()
            .map_err(|err| ConfigError::Invalid {
                key: "regressor",
                reason: err.to_string(),
            })
    }
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn training_defaults_are_valid() {
        let config = TrainingConfig::with_source("postgres://localhost/nsm");
        assert_eq!(config.min_samples, 500);
        assert_eq!(config.validation_split, 0.2);
        assert_eq!(config.regressor.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_split() {
        let mut config = TrainingConfig::with_source("postgres://localhost/nsm");
        config.validation_split = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                key: "NSM_VALIDATION_SPLIT",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let mut config = TrainingConfig::with_source("postgres://localhost/nsm");
        config.regressor.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_database_url() {
        let err = TrainingConfig::from_lookup(vars(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "DATABASE_URL" }));
        assert_eq!(err.to_string(), "Missing required env var: DATABASE_URL");
    }

    #[test]
    fn blank_database_url_counts_as_missing() {
        let err = TrainingConfig::from_lookup(vars(&[("DATABASE_URL", "   ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key: "DATABASE_URL" }));
    }

    #[test]
    fn training_overrides_and_bad_numbers() {
        let config = TrainingConfig::from_lookup(vars(&[
            ("DATABASE_URL", "postgres://db/nsm"),
            ("NSM_MIN_SAMPLES", " 50 "),
            ("NSM_SEED", "7"),
            ("NSM_BATCH_SIZE", "lots"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "postgres://db/nsm");
        assert_eq!(config.min_samples, 50);
        assert_eq!(config.regressor.seed, 7);
        assert_eq!(config.regressor.batch_size, RegressorConfig::default().batch_size);

        let err = TrainingConfig::from_lookup(vars(&[
            ("DATABASE_URL", "postgres://db/nsm"),
            ("NSM_VALIDATION_SPLIT", "1.5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "NSM_VALIDATION_SPLIT", .. }));
    }

    #[test]
    fn shared_defaults() {
        let config = Config::from_lookup(vars(&[("NSM_MODEL_DIR", "  ")]));
        assert_eq!(config.model_dir, PathBuf::from(DEFAULT_MODEL_DIR));
        assert_eq!(config.log, LogSettings::default());
    }

    #[test]
    fn file_logs_opt_in() {
        let config = Config::from_lookup(vars(&[
            ("ENABLE_FILE_LOGS", "TRUE"),
            ("LOG_MAX_FILES", "0"),
            ("RUST_LOG", "nsm_backend=debug"),
        ]));
        assert_eq!(config.log.file_dir, Some(PathBuf::from(DEFAULT_LOG_DIR)));
        assert_eq!(config.log.max_files, 1);
        assert_eq!(config.log.level, "nsm_backend=debug");

        let config = Config::from_lookup(vars(&[("ENABLE_FILE_LOGS", "no"), ("LOG_DIR", "/var/log/nsm")]));
        assert_eq!(config.log.file_dir, None);
    }
}

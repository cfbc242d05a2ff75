//! On-disk model bundles.
//!
//! ```text
//! <root>/
//!   CURRENT                  name of the active bundle directory
//!   bundle-<ts>-<id>/
//!     nsm_model.json
//!     scaler.json
//!     metadata.json
//! ```
//!
//! A bundle is written into a fresh directory and only becomes visible when
//! `CURRENT` is swapped by rename, so readers never see a model next to a
//! scaler from another run.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use nsm_algo::{IntervalRegressor, ScalerRecord, StandardScaler, FEATURE_COUNT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CURRENT_POINTER: &str = "CURRENT";
pub const MODEL_FILE: &str = "nsm_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const METADATA_FILE: &str = "metadata.json";
pub const BUNDLE_VERSION: &str = "1.0";

const BUNDLE_PREFIX: &str = "bundle-";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("no trained model under {}", root.display())]
    MissingPointer { root: PathBuf },
    #[error("bundle file missing: {}", path.display())]
    MissingFile { path: PathBuf },
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("incompatible bundle: {0}")]
    Incompatible(String),
}

impl ArtifactError {
    /// True when nothing has been trained yet, as opposed to a broken bundle.
    pub fn is_not_trained(&self) -> bool {
        matches!(self, Self::MissingPointer { .. })
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub trained_at: DateTime<Utc>,
    pub training_samples: usize,
    pub validation_samples: usize,
    pub val_mae: f64,
    pub val_loss: f64,
    pub model_version: String,
    pub feature_count: usize,
}

/// A fitted model together with the scaler it was trained behind.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub model: IntervalRegressor,
    pub scaler: StandardScaler,
    pub metadata: BundleMetadata,
}

impl ArtifactBundle {
    fn check_compatible(&self) -> Result<(), ArtifactError> {
        if self.metadata.feature_count != FEATURE_COUNT {
            return Err(ArtifactError::Incompatible(format!(
                "metadata declares {} features, expected {FEATURE_COUNT}",
                self.metadata.feature_count
            )));
        }
        if self.model.input_dim != FEATURE_COUNT {
            return Err(ArtifactError::Incompatible(format!(
                "model expects {} features, expected {FEATURE_COUNT}",
                self.model.input_dim
            )));
        }
        if self.scaler.width() != FEATURE_COUNT {
            return Err(ArtifactError::Incompatible(format!(
                "scaler covers {} features, expected {FEATURE_COUNT}",
                self.scaler.width()
            )));
        }
        self.model
            .validate()
            .map_err(|err| ArtifactError::Incompatible(err.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the directory `CURRENT` points at.
    pub fn active_dir(&self) -> Result<PathBuf, ArtifactError> {
        let pointer = self.root.join(CURRENT_POINTER);
        let name = match fs::read_to_string(&pointer) {
            Ok(content) => content.trim().to_string(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArtifactError::MissingPointer {
                    root: self.root.clone(),
                })
            }
            Err(source) => return Err(ArtifactError::io(&pointer, source)),
        };

        if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') || name == "." || name == ".." {
            return Err(ArtifactError::Incompatible(format!(
                "{CURRENT_POINTER} holds an invalid bundle name {name:?}"
            )));
        }
        Ok(self.root.join(name))
    }

    pub fn load(&self) -> Result<ArtifactBundle, ArtifactError> {
        let dir = self.active_dir()?;

        let metadata: BundleMetadata = read_json(&dir.join(METADATA_FILE))?;
        let record: ScalerRecord = read_json(&dir.join(SCALER_FILE))?;
        let model: IntervalRegressor = read_json(&dir.join(MODEL_FILE))?;
        let scaler = StandardScaler::from_record(record)
            .map_err(|err| ArtifactError::Incompatible(err.to_string()))?;

        let bundle = ArtifactBundle {
            model,
            scaler,
            metadata,
        };
        bundle.check_compatible()?;

        tracing::debug!(dir = %dir.display(), "model bundle loaded");
        Ok(bundle)
    }

    /// Writes `bundle` as the new active bundle and removes older ones.
    /// Returns the bundle directory.
    pub fn save(&self, bundle: &ArtifactBundle) -> Result<PathBuf, ArtifactError> {
        bundle.check_compatible()?;
        fs::create_dir_all(&self.root).map_err(|source| ArtifactError::io(&self.root, source))?;

        let name = format!(
            "{BUNDLE_PREFIX}{}-{}",
            bundle.metadata.trained_at.format("%Y%m%dT%H%M%S"),
            &uuid::Uuid::new_v4().simple().to_string()[..8]
        );
        let dir = self.root.join(&name);
        fs::create_dir(&dir).map_err(|source| ArtifactError::io(&dir, source))?;

        if let Err(err) = self.write_and_activate(&dir, &name, bundle) {
            if let Err(cleanup) = fs::remove_dir_all(&dir) {
                tracing::warn!(dir = %dir.display(), error = %cleanup, "failed to remove incomplete bundle");
            }
            return Err(err);
        }

        self.prune(&name);
        tracing::info!(dir = %dir.display(), "model bundle activated");
        Ok(dir)
    }

    fn write_and_activate(
        &self,
        dir: &Path,
        name: &str,
        bundle: &ArtifactBundle,
    ) -> Result<(), ArtifactError> {
        write_json(&dir.join(MODEL_FILE), &bundle.model)?;
        write_json(&dir.join(SCALER_FILE), &bundle.scaler.to_record())?;
        write_json(&dir.join(METADATA_FILE), &bundle.metadata)?;

        let tmp = self
            .root
            .join(format!(".{CURRENT_POINTER}.{}", uuid::Uuid::new_v4().simple()));
        write_bytes(&tmp, name.as_bytes())?;
        let pointer = self.root.join(CURRENT_POINTER);
        if let Err(source) = fs::rename(&tmp, &pointer) {
            let _ = fs::remove_file(&tmp);
            return Err(ArtifactError::io(&pointer, source));
        }
        Ok(())
    }

    /// Removes every bundle directory except `keep`. Failures are only logged;
    /// a stale directory is harmless because `CURRENT` decides what is read.
    fn prune(&self, keep: &str) {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, "failed to list bundle directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(BUNDLE_PREFIX) || name == keep {
                continue;
            }
            if let Err(err) = fs::remove_dir_all(entry.path()) {
                tracing::warn!(bundle = name, error = %err, "failed to remove superseded bundle");
            } else {
                tracing::debug!(bundle = name, "superseded bundle removed");
            }
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::io(path, source))?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_bytes(path, &bytes)
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let mut file = File::create(path).map_err(|source| ArtifactError::io(path, source))?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|source| ArtifactError::io(path, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsm_algo::RegressorConfig;
    use rand::SeedableRng;

    fn sample_bundle() -> ArtifactBundle {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        ArtifactBundle {
            model: IntervalRegressor::new(FEATURE_COUNT, &RegressorConfig::default(), &mut rng),
            scaler: StandardScaler::identity(FEATURE_COUNT),
            metadata: BundleMetadata {
                trained_at: Utc::now(),
                training_samples: 40,
                validation_samples: 10,
                val_mae: 1.5,
                val_loss: 3.25,
                model_version: BUNDLE_VERSION.to_string(),
                feature_count: FEATURE_COUNT,
            },
        }
    }

    #[test]
    fn empty_root_is_not_trained() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsArtifactStore::new(dir.path()).load().unwrap_err();
        assert!(err.is_not_trained());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path().join("models"));
        let bundle = sample_bundle();

        let bundle_dir = store.save(&bundle).unwrap();
        assert!(bundle_dir.join(MODEL_FILE).exists());
        assert!(bundle_dir.join(SCALER_FILE).exists());
        assert!(bundle_dir.join(METADATA_FILE).exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.metadata, bundle.metadata);
        let x = vec![0.3; FEATURE_COUNT];
        assert_eq!(loaded.model.predict(&x).unwrap(), bundle.model.predict(&x).unwrap());
    }

    #[test]
    fn second_save_replaces_and_prunes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());

        let first = store.save(&sample_bundle()).unwrap();
        let mut next = sample_bundle();
        next.metadata.training_samples = 99;
        let second = store.save(&next).unwrap();

        assert!(!first.exists());
        assert!(second.exists());
        assert_eq!(store.active_dir().unwrap(), second);
        assert_eq!(store.load().unwrap().metadata.training_samples, 99);
    }

    #[test]
    fn missing_scaler_is_corrupt_not_untrained() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let bundle_dir = store.save(&sample_bundle()).unwrap();
        fs::remove_file(bundle_dir.join(SCALER_FILE)).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, ArtifactError::MissingFile { .. }));
        assert!(!err.is_not_trained());
    }

    #[test]
    fn garbage_model_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let bundle_dir = store.save(&sample_bundle()).unwrap();
        fs::write(bundle_dir.join(MODEL_FILE), b"{not json").unwrap();

        assert!(matches!(store.load(), Err(ArtifactError::Json { .. })));
    }

    #[test]
    fn pointer_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CURRENT_POINTER), "../elsewhere").unwrap();
        let err = FsArtifactStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ArtifactError::Incompatible(_)));
    }

    #[test]
    fn wrong_feature_count_is_rejected_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut bundle = sample_bundle();
        bundle.metadata.feature_count = 5;
        assert!(FsArtifactStore::new(dir.path()).save(&bundle).is_err());
        assert!(!dir.path().join(CURRENT_POINTER).exists());
    }

    #[test]
    fn failed_save_leaves_no_bundle_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path());
        let active = store.save(&sample_bundle()).unwrap();

        // A non-empty directory in place of the pointer makes the swap fail.
        fs::remove_file(dir.path().join(CURRENT_POINTER)).unwrap();
        fs::create_dir(dir.path().join(CURRENT_POINTER)).unwrap();
        fs::write(dir.path().join(CURRENT_POINTER).join("keep"), b"x").unwrap();

        assert!(store.save(&sample_bundle()).is_err());

        let bundles: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(BUNDLE_PREFIX))
            })
            .collect();
        assert_eq!(bundles, vec![active]);
    }
}

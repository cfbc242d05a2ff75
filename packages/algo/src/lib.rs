//! # nsm-algo - Neural Spaced Mastery 核心算法库
//!
//! Pure Rust building blocks for predicting the next review interval of a
//! spaced-repetition item:
//!
//! - **Feature encoding** - fixed-order 17-field vector with per-field defaults
//! - **Standard scaler** - per-column mean/std normalization, portable format
//! - **Interval regressor** - feed-forward network with an exponential head,
//!   Adam, early stopping
//! - **Split** - seeded train/validation partition
//!
//! ## 模块结构
//!
//! - [`features`] - observation decoding and [`FeatureVector`]
//! - [`scaler`] - [`StandardScaler`]
//! - [`regressor`] - [`IntervalRegressor`] and the [`IntervalPredictor`] seam
//! - [`split`] - reproducible train/validation split
//! - [`sanitize`] - numerical health checks
//! - [`types`] - constants, clipping and the confidence heuristic
//!
//! ## 使用示例
//!
//! ```rust
//! use nsm_algo::{FeatureObservation, FeatureVector, StandardScaler};
//!
//! let obs: FeatureObservation =
//!     serde_json::from_str(r#"{"current_interval": 4, "learning_pace": "fast"}"#).unwrap();
//! let v = FeatureVector::from_observation(&obs);
//! assert_eq!(v.current_interval(), 4.0);
//!
//! let scaler = StandardScaler::identity(v.as_slice().len());
//! assert_eq!(scaler.transform_one(v.as_slice()).unwrap(), v.to_vec());
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod error;
pub mod features;
pub mod regressor;
pub mod sanitize;
pub mod scaler;
pub mod split;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

pub use error::{AlgoError, AlgoResult};
pub use features::{value_to_f64, FeatureObservation, FeatureVector};
pub use regressor::{
    EpochMetrics, Evaluation, HiddenLayerSpec, IntervalPredictor, IntervalRegressor,
    RegressorConfig, TrainingReport, MODEL_FORMAT_VERSION,
};
pub use scaler::{ColumnStats, ScalerRecord, StandardScaler, SCALER_FORMAT_VERSION};
pub use split::{split_indices, train_validation_split, SplitIndices};
pub use types::*;

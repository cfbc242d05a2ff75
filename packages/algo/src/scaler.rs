//! Standard Scaler
//!
//! Per-column standardization `(x - location) / scale` with location = mean
//! and scale = population standard deviation. Zero-variance columns get
//! scale 1 so transform never divides by zero.
//!
//! The persisted form is a versioned list of named location/scale pairs,
//! readable without this crate.

use serde::{Deserialize, Serialize};

use crate::error::{check_batch, AlgoError, AlgoResult};
use crate::types::{EPSILON, FEATURE_COUNT, FEATURE_NAMES};

pub const SCALER_FORMAT_VERSION: u32 = 1;

/// Location/scale statistics of one feature column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub location: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    columns: Vec<ColumnStats>,
}

impl StandardScaler {
    /// Builds a scaler from explicit statistics (e.g. an identity scaler).
    pub fn from_columns(columns: Vec<ColumnStats>) -> AlgoResult<Self> {
        if columns.is_empty() {
            return Err(AlgoError::EmptyBatch);
        }
        for (idx, col) in columns.iter().enumerate() {
            if !col.location.is_finite() || !col.scale.is_finite() || col.scale <= 0.0 {
                return Err(AlgoError::InvalidParameter {
                    name: "scale",
                    reason: format!(
                        "column {idx} has location {} and scale {}",
                        col.location, col.scale
                    ),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Identity transform over `width` columns.
    pub fn identity(width: usize) -> Self {
        Self {
            columns: vec![
                ColumnStats {
                    location: 0.0,
                    scale: 1.0,
                };
                width
            ],
        }
    }

    pub fn fit(x: &[Vec<f64>]) -> AlgoResult<Self> {
        let width = x.first().map(Vec::len).ok_or(AlgoError::EmptyBatch)?;
        check_batch(x, width)?;

        let n = x.len() as f64;
        let mut columns = Vec::with_capacity(width);
        for col in 0..width {
            let mean = x.iter().map(|row| row[col]).sum::<f64>() / n;
            let var = x.iter().map(|row| (row[col] - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            let scale = if std.is_finite() && std > EPSILON { std } else { 1.0 };
            columns.push(ColumnStats {
                location: mean,
                scale,
            });
        }

        Ok(Self { columns })
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ColumnStats] {
        &self.columns
    }

    pub fn transform_one(&self, x: &[f64]) -> AlgoResult<Vec<f64>> {
        if x.len() != self.columns.len() {
            return Err(AlgoError::ShapeMismatch {
                expected: self.columns.len(),
                actual: x.len(),
            });
        }
        Ok(x
            .iter()
            .zip(self.columns.iter())
            .map(|(v, c)| (v - c.location) / c.scale)
            .collect())
    }

    pub fn transform(&self, x: &[Vec<f64>]) -> AlgoResult<Vec<Vec<f64>>> {
        x.iter().map(|row| self.transform_one(row)).collect()
    }

    pub fn to_record(&self) -> ScalerRecord {
        ScalerRecord {
            format_version: SCALER_FORMAT_VERSION,
            columns: self
                .columns
                .iter()
                .enumerate()
                .map(|(idx, c)| NamedColumn {
                    name: column_name(idx, self.columns.len()),
                    location: c.location,
                    scale: c.scale,
                })
                .collect(),
        }
    }

    pub fn from_record(record: ScalerRecord) -> AlgoResult<Self> {
        if record.format_version != SCALER_FORMAT_VERSION {
            return Err(AlgoError::UnsupportedFormat {
                kind: "scaler",
                found: record.format_version,
                expected: SCALER_FORMAT_VERSION,
            });
        }
        let width = record.columns.len();
        if let Some((idx, column)) = record
            .columns
            .iter()
            .enumerate()
            .find(|(idx, c)| width == FEATURE_COUNT && c.name != FEATURE_NAMES[*idx])
        {
            return Err(AlgoError::InvalidParameter {
                name: "columns",
                reason: format!(
                    "column {idx} is named {:?}, expected {:?}",
                    column.name, FEATURE_NAMES[idx]
                ),
            });
        }
        Self::from_columns(
            record
                .columns
                .into_iter()
                .map(|c| ColumnStats {
                    location: c.location,
                    scale: c.scale,
                })
                .collect(),
        )
    }
}

fn column_name(idx: usize, width: usize) -> String {
    if width == FEATURE_COUNT {
        FEATURE_NAMES[idx].to_string()
    } else {
        format!("feature_{idx}")
    }
}

/// Portable on-disk form of a [`StandardScaler`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerRecord {
    pub format_version: u32,
    pub columns: Vec<NamedColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedColumn {
    pub name: String,
    pub location: f64,
    pub scale: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Vec<f64>> {
        vec![
            vec![1.0, 10.0, 5.0],
            vec![2.0, 20.0, 5.0],
            vec![3.0, 30.0, 5.0],
            vec![4.0, 40.0, 5.0],
        ]
    }

    #[test]
    fn test_fit_statistics() {
        let scaler = StandardScaler::fit(&sample()).unwrap();
        assert_eq!(scaler.width(), 3);
        assert!((scaler.columns()[0].location - 2.5).abs() < 1e-12);
        assert!((scaler.columns()[0].scale - 1.25f64.sqrt()).abs() < 1e-12);
        assert!((scaler.columns()[1].location - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_scale_is_one() {
        let scaler = StandardScaler::fit(&sample()).unwrap();
        assert_eq!(scaler.columns()[2].scale, 1.0);
        let t = scaler.transform(&sample()).unwrap();
        assert!(t.iter().all(|row| row[2] == 0.0));
    }

    #[test]
    fn test_transform_standardizes() {
        let data = sample();
        let scaler = StandardScaler::fit(&data).unwrap();
        let t = scaler.transform(&data).unwrap();
        for col in 0..2 {
            let n = t.len() as f64;
            let mean = t.iter().map(|r| r[col]).sum::<f64>() / n;
            let var = t.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / n;
            assert!(mean.abs() < 1e-9);
            assert!((var - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_shape_mismatch() {
        let scaler = StandardScaler::fit(&sample()).unwrap();
        let err = scaler.transform_one(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            AlgoError::ShapeMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_fit_rejects_empty_and_ragged() {
        assert_eq!(StandardScaler::fit(&[]).unwrap_err(), AlgoError::EmptyBatch);
        let ragged = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            StandardScaler::fit(&ragged),
            Err(AlgoError::RaggedBatch { row: 1, .. })
        ));
    }

    #[test]
    fn test_identity() {
        let scaler = StandardScaler::identity(4);
        let x = vec![1.5, -2.0, 0.0, 9.0];
        assert_eq!(scaler.transform_one(&x).unwrap(), x);
    }

    #[test]
    fn test_record_names_features() {
        let scaler = StandardScaler::identity(FEATURE_COUNT);
        let record = scaler.to_record();
        assert_eq!(record.format_version, SCALER_FORMAT_VERSION);
        assert_eq!(record.columns[7].name, "current_interval");
        assert_eq!(StandardScaler::from_record(record).unwrap(), scaler);
    }

    #[test]
    fn test_record_rejects_bad_version_and_scale() {
        let mut record = StandardScaler::identity(2).to_record();
        record.format_version = 99;
        assert!(matches!(
            StandardScaler::from_record(record),
            Err(AlgoError::UnsupportedFormat { found: 99, .. })
        ));

        let mut record = StandardScaler::identity(2).to_record();
        record.columns[1].scale = 0.0;
        assert!(matches!(
            StandardScaler::from_record(record),
            Err(AlgoError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_record_rejects_reordered_feature_names() {
        let mut record = StandardScaler::identity(FEATURE_COUNT).to_record();
        record.columns.swap(0, 7);
        let err = StandardScaler::from_record(record).unwrap_err();
        match err {
            AlgoError::InvalidParameter { name, reason } => {
                assert_eq!(name, "columns");
                assert!(reason.contains("current_interval"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Narrower records carry generic names and are not checked.
        let mut record = StandardScaler::identity(3).to_record();
        record.columns[0].name = "anything".to_string();
        assert!(StandardScaler::from_record(record).is_ok());
    }
}

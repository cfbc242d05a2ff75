//! Error type shared by every algorithm module.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlgoError {
    #[error("shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("empty batch")]
    EmptyBatch,
    #[error("ragged batch: row {row} has {actual} features, expected {expected}")]
    RaggedBatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("target count {targets} does not match row count {rows}")]
    TargetMismatch { rows: usize, targets: usize },
    #[error("invalid target at row {row}: {value}")]
    InvalidTarget { row: usize, value: f64 },
    #[error("unsupported {kind} format version {found}, expected {expected}")]
    UnsupportedFormat {
        kind: &'static str,
        found: u32,
        expected: u32,
    },
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type AlgoResult<T> = Result<T, AlgoError>;

/// Checks that every row of `x` has `width` columns.
pub fn check_batch(x: &[Vec<f64>], width: usize) -> AlgoResult<()> {
    if x.is_empty() {
        return Err(AlgoError::EmptyBatch);
    }
    for (row, values) in x.iter().enumerate() {
        if values.len() != width {
            return Err(AlgoError::RaggedBatch {
                row,
                expected: width,
                actual: values.len(),
            });
        }
    }
    Ok(())
}

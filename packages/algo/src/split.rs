//! Train/Validation Split
//!
//! Seeded Fisher-Yates shuffle followed by a cut, so the same data and seed
//! always produce the same partition. The validation share is rounded up
//! (`ceil(n * fraction)`) but at least one row is always left for training.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{AlgoError, AlgoResult};

/// Index sets of a train/validation partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

pub fn validation_len(total: usize, validation_fraction: f64) -> usize {
    let raw = (total as f64 * validation_fraction).ceil() as usize;
    raw.min(total.saturating_sub(1))
}

pub fn split_indices(total: usize, validation_fraction: f64, seed: u64) -> AlgoResult<SplitIndices> {
    if !(0.0..1.0).contains(&validation_fraction) {
        return Err(AlgoError::InvalidParameter {
            name: "validation_fraction",
            reason: format!("{validation_fraction} is outside [0, 1)"),
        });
    }

    let mut indices: Vec<usize> = (0..total).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_val = validation_len(total, validation_fraction);
    let train = indices.split_off(n_val);

    Ok(SplitIndices {
        train,
        validation: indices,
    })
}

/// Splits parallel feature/target arrays with [`split_indices`].
pub fn train_validation_split(
    x: &[Vec<f64>],
    y: &[f64],
    validation_fraction: f64,
    seed: u64,
) -> AlgoResult<(Vec<Vec<f64>>, Vec<f64>, Vec<Vec<f64>>, Vec<f64>)> {
    if x.len() != y.len() {
        return Err(AlgoError::TargetMismatch {
            rows: x.len(),
            targets: y.len(),
        });
    }
    let split = split_indices(x.len(), validation_fraction, seed)?;
    let take_x = |idx: &[usize]| idx.iter().map(|&i| x[i].clone()).collect::<Vec<_>>();
    let take_y = |idx: &[usize]| idx.iter().map(|&i| y[i]).collect::<Vec<_>>();

    Ok((
        take_x(&split.train),
        take_y(&split.train),
        take_x(&split.validation),
        take_y(&split.validation),
    ))
}

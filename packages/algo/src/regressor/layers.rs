//! Dense and batch-normalization layers over row-major `[batch × width]`
//! buffers.

use rand::Rng;
use serde::{Deserialize, Serialize};

// ==================== Dense ====================

/// Fully connected layer. `weights` is row-major `[input_dim × output_dim]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    pub input_dim: usize,
    pub output_dim: usize,
    pub weights: Vec<f64>,
    pub bias: Vec<f64>,
}

impl Dense {
    /// He-uniform init, suited to ReLU activations.
    pub fn he_uniform<R: Rng>(input_dim: usize, output_dim: usize, rng: &mut R) -> Self {
        let limit = (6.0 / input_dim.max(1) as f64).sqrt();
        Self::uniform(input_dim, output_dim, limit, rng)
    }

    /// Glorot-uniform init, used for the linear output head.
    pub fn glorot_uniform<R: Rng>(input_dim: usize, output_dim: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (input_dim + output_dim).max(1) as f64).sqrt();
        Self::uniform(input_dim, output_dim, limit, rng)
    }

    fn uniform<R: Rng>(input_dim: usize, output_dim: usize, limit: f64, rng: &mut R) -> Self {
        let weights = (0..input_dim * output_dim)
            .map(|_| rng.gen_range(-limit..=limit))
            .collect();
        Self {
            input_dim,
            output_dim,
            weights,
            bias: vec![0.0; output_dim],
        }
    }

    pub fn forward(&self, x: &[f64], batch: usize) -> Vec<f64> {
        let (n_in, n_out) = (self.input_dim, self.output_dim);
        let mut y = vec![0.0; batch * n_out];
        for b in 0..batch {
            let row = &x[b * n_in..(b + 1) * n_in];
            let out = &mut y[b * n_out..(b + 1) * n_out];
            out.copy_from_slice(&self.bias);
            for (i, xi) in row.iter().enumerate() {
                if *xi == 0.0 {
                    continue;
                }
                let w_row = &self.weights[i * n_out..(i + 1) * n_out];
                for (o, w) in out.iter_mut().zip(w_row) {
                    *o += xi * w;
                }
            }
        }
        y
    }

    /// Returns `(d_input, d_weights, d_bias)`.
    pub fn backward(&self, x: &[f64], dy: &[f64], batch: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let (n_in, n_out) = (self.input_dim, self.output_dim);
        let mut dx = vec![0.0; batch * n_in];
        let mut dw = vec![0.0; n_in * n_out];
        let mut db = vec![0.0; n_out];

        for b in 0..batch {
            let x_row = &x[b * n_in..(b + 1) * n_in];
            let dy_row = &dy[b * n_out..(b + 1) * n_out];
            for (d, g) in db.iter_mut().zip(dy_row) {
                *d += g;
            }
            for i in 0..n_in {
                let w_row = &self.weights[i * n_out..(i + 1) * n_out];
                let dw_row = &mut dw[i * n_out..(i + 1) * n_out];
                let mut acc = 0.0;
                for j in 0..n_out {
                    dw_row[j] += x_row[i] * dy_row[j];
                    acc += dy_row[j] * w_row[j];
                }
                dx[b * n_in + i] = acc;
            }
        }

        (dx, dw, db)
    }

    pub fn is_consistent(&self) -> bool {
        self.weights.len() == self.input_dim * self.output_dim && self.bias.len() == self.output_dim
    }
}

// ==================== Batch Normalization ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchNorm {
    pub dim: usize,
    pub gamma: Vec<f64>,
    pub beta: Vec<f64>,
    pub running_mean: Vec<f64>,
    pub running_var: Vec<f64>,
    pub momentum: f64,
    pub epsilon: f64,
}

/// Values kept from the training forward pass for backprop
#[derive(Debug, Clone)]
pub struct BatchNormCache {
    pub normalized: Vec<f64>,
    pub inv_std: Vec<f64>,
}

impl BatchNorm {
    pub fn new(dim: usize, momentum: f64, epsilon: f64) -> Self {
        Self {
            dim,
            gamma: vec![1.0; dim],
            beta: vec![0.0; dim],
            running_mean: vec![0.0; dim],
            running_var: vec![1.0; dim],
            momentum,
            epsilon,
        }
    }

    /// Normalizes with batch statistics and updates the running averages.
    pub fn forward_train(&mut self, x: &[f64], batch: usize) -> (Vec<f64>, BatchNormCache) {
        let d = self.dim;
        let n = batch as f64;
        let mut out = vec![0.0; batch * d];
        let mut normalized = vec![0.0; batch * d];
        let mut inv_std = vec![0.0; d];

        for j in 0..d {
            let mean = (0..batch).map(|b| x[b * d + j]).sum::<f64>() / n;
            let var = (0..batch).map(|b| (x[b * d + j] - mean).powi(2)).sum::<f64>() / n;
            let istd = 1.0 / (var + self.epsilon).sqrt();
            inv_std[j] = istd;

            for b in 0..batch {
                let xhat = (x[b * d + j] - mean) * istd;
                normalized[b * d + j] = xhat;
                out[b * d + j] = self.gamma[j] * xhat + self.beta[j];
            }

            self.running_mean[j] = self.momentum * self.running_mean[j] + (1.0 - self.momentum) * mean;
            self.running_var[j] = self.momentum * self.running_var[j] + (1.0 - self.momentum) * var;
        }

        (out, BatchNormCache { normalized, inv_std })
    }

    pub fn forward_infer(&self, x: &[f64], batch: usize) -> Vec<f64> {
        let d = self.dim;
        let mut out = vec![0.0; batch * d];
        for j in 0..d {
            let istd = 1.0 / (self.running_var[j] + self.epsilon).sqrt();
            for b in 0..batch {
                let xhat = (x[b * d + j] - self.running_mean[j]) * istd;
                out[b * d + j] = self.gamma[j] * xhat + self.beta[j];
            }
        }
        out
    }

    /// Returns `(d_input, d_gamma, d_beta)`.
    pub fn backward(
        &self,
        cache: &BatchNormCache,
        dy: &[f64],
        batch: usize,
    ) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let d = self.dim;
        let n = batch as f64;
        let mut dx = vec![0.0; batch * d];
        let mut dgamma = vec![0.0; d];
        let mut dbeta = vec![0.0; d];

        for j in 0..d {
            let mut sum_dxhat = 0.0;
            let mut sum_dxhat_xhat = 0.0;
            for b in 0..batch {
                let g = dy[b * d + j];
                let xhat = cache.normalized[b * d + j];
                dgamma[j] += g * xhat;
                dbeta[j] += g;
                let dxhat = g * self.gamma[j];
                sum_dxhat += dxhat;
                sum_dxhat_xhat += dxhat * xhat;
            }
            for b in 0..batch {
                let xhat = cache.normalized[b * d + j];
                let dxhat = dy[b * d + j] * self.gamma[j];
                dx[b * d + j] =
                    cache.inv_std[j] / n * (n * dxhat - sum_dxhat - xhat * sum_dxhat_xhat);
            }
        }

        (dx, dgamma, dbeta)
    }

    pub fn is_consistent(&self) -> bool {
        let d = self.dim;
        self.gamma.len() == d
            && self.beta.len() == d
            && self.running_mean.len() == d
            && self.running_var.len() == d
            && self.running_var.iter().all(|v| *v >= 0.0)
            && self.epsilon > 0.0
    }
}

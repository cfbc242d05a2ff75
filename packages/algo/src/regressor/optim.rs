//! Adam optimizer
//!
//! m = β1*m + (1-β1)*g
//! v = β2*v + (1-β2)*g²
//! θ = θ - lr * m̂ / (√v̂ + ε)

#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    first_moment: Vec<Vec<f64>>,
    second_moment: Vec<Vec<f64>>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            first_moment: Vec::new(),
            second_moment: Vec::new(),
        }
    }

    /// Applies one update. `params` and `grads` must come in the same order
    /// on every call.
    pub fn step(&mut self, params: Vec<&mut Vec<f64>>, grads: &[Vec<f64>]) {
        if self.first_moment.is_empty() {
            self.first_moment = grads.iter().map(|g| vec![0.0; g.len()]).collect();
            self.second_moment = grads.iter().map(|g| vec![0.0; g.len()]).collect();
        }

        self.step += 1;
        let bias1 = 1.0 - self.beta1.powi(self.step);
        let bias2 = 1.0 - self.beta2.powi(self.step);

        for (k, (param, grad)) in params.into_iter().zip(grads.iter()).enumerate() {
            let m = &mut self.first_moment[k];
            let v = &mut self.second_moment[k];
            for i in 0..param.len() {
                let g = grad[i];
                if !g.is_finite() {
                    continue;
                }
                m[i] = self.beta1 * m[i] + (1.0 - self.beta1) * g;
                v[i] = self.beta2 * v[i] + (1.0 - self.beta2) * g * g;
                let m_hat = m[i] / bias1;
                let v_hat = v[i] / bias2;
                param[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
    }
}

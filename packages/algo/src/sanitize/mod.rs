//! Data Sanitization
//!
//! Numerical stability utilities.
//!
//! Functions:
//! - Feature vector sanitization
//! - Parameter health diagnostics

use serde::{Deserialize, Serialize};

/// 检查数组是否包含无效值 (NaN 或 Inf)
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|&x| x.is_nan() || x.is_infinite())
}

/// Replaces every non-finite entry with the default at the same position.
///
/// Returns the number of replaced entries.
pub fn sanitize_with_defaults(x: &mut [f64], defaults: &[f64]) -> usize {
    let mut replaced = 0;
    for (val, default) in x.iter_mut().zip(defaults.iter()) {
        if !val.is_finite() {
            *val = *default;
            replaced += 1;
        }
    }
    replaced
}

/// Health report over a set of learned parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub is_healthy: bool,
    pub has_nan: bool,
    pub has_inf: bool,
    pub max_abs: f64,
    pub message: String,
}

/// 诊断参数健康状态
pub fn diagnose_parameters<'a, I>(groups: I) -> DiagnosticResult
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut has_nan = false;
    let mut has_inf = false;
    let mut max_abs: f64 = 0.0;

    for group in groups {
        for val in group {
            if val.is_nan() {
                has_nan = true;
            } else if val.is_infinite() {
                has_inf = true;
            } else {
                max_abs = max_abs.max(val.abs());
            }
        }
    }

    let is_healthy = !has_nan && !has_inf;
    let message = if is_healthy {
        "Parameters are healthy".to_string()
    } else if has_nan {
        "Parameters contain NaN values".to_string()
    } else {
        "Parameters contain infinite values".to_string()
    };

    DiagnosticResult {
        is_healthy,
        has_nan,
        has_inf,
        max_abs,
        message,
    }
}

//! Yeo-Johnson power transform
//!
//! The exponent is chosen by maximum likelihood over `[LAMBDA_MIN, LAMBDA_MAX]`
//! with a golden-section search, then the transformed column is standardized
//! to zero mean and unit variance on the fitting data.

use serde::{Deserialize, Serialize};

use super::{mean_and_std, TransformError};

pub const LAMBDA_MIN: f64 = -5.0;
pub const LAMBDA_MAX: f64 = 5.0;

const SEARCH_TOLERANCE: f64 = 1e-8;
const MAX_SEARCH_ITERATIONS: usize = 200;
const EPS: f64 = 1e-12;

/// Yeo-Johnson transform of one value.
pub fn yeo_johnson(x: f64, lambda: f64) -> f64 {
    if x >= 0.0 {
        if lambda.abs() < EPS {
            x.ln_1p()
        } else {
            ((x + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < EPS {
        -(-x).ln_1p()
    } else {
        -((1.0 - x).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    }
}

/// Profile log-likelihood of `lambda` under a normal model of the output.
pub fn log_likelihood(values: &[f64], lambda: f64) -> f64 {
    let n = values.len() as f64;
    let transformed: Vec<f64> = values.iter().map(|&x| yeo_johnson(x, lambda)).collect();
    let (_, std) = mean_and_std(&transformed);
    let var = std * std;
    if !var.is_finite() || var <= 0.0 {
        return f64::NEG_INFINITY;
    }
    let jacobian: f64 = values
        .iter()
        .map(|&x| x.signum() * x.abs().ln_1p())
        .sum();
    -n / 2.0 * var.ln() + (lambda - 1.0) * jacobian
}

/// Maximize `f` over `[lo, hi]`, assuming it is unimodal there.
fn golden_section_max(f: impl Fn(f64) -> f64, mut lo: f64, mut hi: f64) -> f64 {
    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
    let mut c = hi - inv_phi * (hi - lo);
    let mut d = lo + inv_phi * (hi - lo);
    let mut fc = f(c);
    let mut fd = f(d);

    for _ in 0..MAX_SEARCH_ITERATIONS {
        if (hi - lo).abs() < SEARCH_TOLERANCE {
            break;
        }
        if fc >= fd {
            hi = d;
            d = c;
            fd = fc;
            c = hi - inv_phi * (hi - lo);
            fc = f(c);
        } else {
            lo = c;
            c = d;
            fc = fd;
            d = lo + inv_phi * (hi - lo);
            fd = f(d);
        }
    }
    (lo + hi) / 2.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerTransformer {
    column: String,
    lambda: f64,
    mean: f64,
    scale: f64,
}

impl PowerTransformer {
    /// Fit the exponent and the output standardization on `values`.
    ///
    /// A constant column has no likelihood optimum and gets `lambda = 1`.
    pub fn fit(column: &str, values: &[f64]) -> Result<Self, TransformError> {
        if values.is_empty() {
            return Err(TransformError::EmptyFit {
                column: column.to_string(),
            });
        }

        let (_, raw_std) = mean_and_std(values);
        let lambda = if raw_std > 0.0 {
            golden_section_max(|l| log_likelihood(values, l), LAMBDA_MIN, LAMBDA_MAX)
        } else {
            1.0
        };

        let transformed: Vec<f64> = values.iter().map(|&x| yeo_johnson(x, lambda)).collect();
        let (mean, std) = mean_and_std(&transformed);
        tracing::debug!(column, lambda, "fitted power transform");

        Ok(Self {
            column: column.to_string(),
            lambda,
            mean,
            scale: if std > 0.0 { std } else { 1.0 },
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .map(|&x| (yeo_johnson(x, self.lambda) - self.mean) / self.scale)
            .collect()
    }
}

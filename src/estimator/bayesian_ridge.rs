//! Bayesian ridge regression
//!
//! Linear model with Gaussian weight prior, where the noise precision (alpha)
//! and weight precision (lambda) are re-estimated by evidence maximisation.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LoanError, Result};

/// Hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BayesianRidgeConfig {
    pub max_iter: usize,
    /// Stop once the summed absolute change in coefficients falls below this
    pub tol: f64,
    /// Gamma prior shape/rate over alpha
    pub alpha_1: f64,
    pub alpha_2: f64,
    /// Gamma prior shape/rate over lambda
    pub lambda_1: f64,
    pub lambda_2: f64,
}

impl Default for BayesianRidgeConfig {
    fn default() -> Self {
        Self {
            max_iter: 300,
            tol: 1e-3,
            alpha_1: 1e-6,
            alpha_2: 1e-6,
            lambda_1: 1e-6,
            lambda_2: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianRidge {
    coef: Array1<f64>,
    intercept: f64,
    /// Estimated noise precision
    alpha: f64,
    /// Estimated weight precision
    lambda: f64,
    n_iter: usize,
}

impl BayesianRidge {
    pub fn fit(x: &Array2<f64>, y: &[f64]) -> Result<Self> {
        Self::fit_with(x, y, BayesianRidgeConfig::default())
    }

    pub fn fit_with(x: &Array2<f64>, y: &[f64], config: BayesianRidgeConfig) -> Result<Self> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(LoanError::Estimator("cannot fit on zero samples".to_string()));
        }
        if n_samples != y.len() {
            return Err(LoanError::Estimator(format!(
                "{} feature rows but {} targets",
                n_samples,
                y.len()
            )));
        }

        // Centre so the intercept drops out of the evidence updates
        let x_offset = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_features));
        let y = Array1::from(y.to_vec());
        let y_offset = y.mean().unwrap_or(0.0);
        let xc = x - &x_offset;
        let yc = &y - y_offset;

        let xtx = xc.t().dot(&xc);
        let xty = xc.t().dot(&yc);

        let n = n_samples as f64;
        let p = n_features as f64;
        let mut alpha = 1.0 / (yc.var(0.0) + f64::EPSILON);
        let mut lambda = 1.0;
        let mut coef_old: Option<Array1<f64>> = None;
        let mut n_iter = 0;

        for iter in 0..config.max_iter {
            n_iter = iter + 1;
            let (coef, sigma) = posterior(&xtx, &xty, alpha, lambda)?;

            let residual = &yc - &xc.dot(&coef);
            let rmse = residual.dot(&residual);
            let gamma = p - lambda * sigma.diag().sum();

            lambda = (gamma + 2.0 * config.lambda_1)
                / (coef.dot(&coef) + 2.0 * config.lambda_2);
            alpha = (n - gamma + 2.0 * config.alpha_1) / (rmse + 2.0 * config.alpha_2);

            if let Some(old) = &coef_old {
                let change: f64 = (old - &coef).mapv(f64::abs).sum();
                if change < config.tol {
                    debug!("Bayesian ridge converged after {} iterations", n_iter);
                    break;
                }
            }
            coef_old = Some(coef);
        }

        let (coef, _) = posterior(&xtx, &xty, alpha, lambda)?;
        let intercept = y_offset - x_offset.dot(&coef);

        Ok(Self {
            coef,
            intercept,
            alpha,
            lambda,
            n_iter,
        })
    }

    pub fn n_features(&self) -> usize {
        self.coef.len()
    }

    pub fn coef(&self) -> &Array1<f64> {
        &self.coef
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn validate(&self) -> Result<()> {
        if self.coef.iter().all(|w| w.is_finite()) && self.intercept.is_finite() {
            Ok(())
        } else {
            Err(LoanError::Estimator(
                "regressor has non-finite coefficients".to_string(),
            ))
        }
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        self.coef
            .iter()
            .zip(x)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.intercept
    }
}

/// Posterior mean and covariance of the weights for fixed alpha and lambda
///
/// The precision matrix is scaled to a unit diagonal before the Cholesky
/// factorisation, since feature scales range from flags to incomes.
fn posterior(
    xtx: &Array2<f64>,
    xty: &Array1<f64>,
    alpha: f64,
    lambda: f64,
) -> Result<(Array1<f64>, Array2<f64>)> {
    let n = xtx.nrows();
    let precision = DMatrix::from_fn(n, n, |i, j| {
        alpha * xtx[[i, j]] + if i == j { lambda } else { 0.0 }
    });
    let scale = DVector::from_fn(n, |i, _| precision[(i, i)].sqrt().recip());
    let scaled = DMatrix::from_fn(n, n, |i, j| precision[(i, j)] * scale[i] * scale[j]);

    let inverse = scaled
        .cholesky()
        .ok_or_else(|| {
            LoanError::Estimator("posterior precision is not positive definite".to_string())
        })?
        .inverse();

    let sigma = Array2::from_shape_fn((n, n), |(i, j)| inverse[(i, j)] * scale[i] * scale[j]);
    let coef = sigma.dot(xty) * alpha;
    Ok((coef, sigma))
}

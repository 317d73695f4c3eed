//! Gaussian naive Bayes classifier

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{LoanError, Result};

/// Portion of the largest feature variance added to every variance
const VAR_SMOOTHING: f64 = 1e-9;

/// Per-class Gaussian likelihoods with class-frequency priors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNb {
    classes: Vec<usize>,
    class_priors: Vec<f64>,
    /// classes × features
    means: Array2<f64>,
    /// classes × features, smoothed
    variances: Array2<f64>,
}

impl GaussianNb {
    pub fn fit(x: &Array2<f64>, y: &[usize]) -> Result<Self> {
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

        let mut classes: Vec<usize> = y.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let max_variance = x
            .var_axis(Axis(0), 0.0)
            .iter()
            .cloned()
            .fold(0.0, f64::max);
        let epsilon = if max_variance > 0.0 {
            VAR_SMOOTHING * max_variance
        } else {
            VAR_SMOOTHING
        };

        let mut means = Array2::<f64>::zeros((classes.len(), n_features));
        let mut variances = Array2::<f64>::zeros((classes.len(), n_features));
        let mut class_priors = Vec::with_capacity(classes.len());

        for (c, class) in classes.iter().enumerate() {
            let rows: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, label)| *label == class)
                .map(|(i, _)| i)
                .collect();
            let subset = x.select(Axis(0), &rows);

            let mean = subset
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(n_features));
            let var = subset.var_axis(Axis(0), 0.0) + epsilon;

            means.row_mut(c).assign(&mean);
            variances.row_mut(c).assign(&var);
            class_priors.push(rows.len() as f64 / n_samples as f64);
        }

        Ok(Self {
            classes,
            class_priors,
            means,
            variances,
        })
    }

    pub fn n_features(&self) -> usize {
        self.means.ncols()
    }

    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Check that per-class parameters line up, as a deserialized model may not
    pub fn validate(&self) -> Result<()> {
        let n_classes = self.classes.len();
        if n_classes == 0 {
            return Err(LoanError::Estimator("classifier has no classes".to_string()));
        }
        if self.class_priors.len() != n_classes
            || self.means.nrows() != n_classes
            || self.variances.dim() != self.means.dim()
        {
            return Err(LoanError::Estimator(format!(
                "classifier parameters disagree: {} classes, {} priors, means {:?}, variances {:?}",
                n_classes,
                self.class_priors.len(),
                self.means.dim(),
                self.variances.dim()
            )));
        }
        if self.variances.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(LoanError::Estimator(
                "classifier variances must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Unnormalised log posterior for each class
    pub fn joint_log_likelihood(&self, x: &[f64]) -> Vec<f64> {
        self.classes
            .iter()
            .enumerate()
            .map(|(c, _)| {
                let mut log_likelihood = self.class_priors[c].ln();
                for (j, &value) in x.iter().enumerate() {
                    let mean = self.means[[c, j]];
                    let var = self.variances[[c, j]];
                    log_likelihood -= 0.5 * (2.0 * PI * var).ln();
                    log_likelihood -= 0.5 * (value - mean).powi(2) / var;
                }
                log_likelihood
            })
            .collect()
    }

    /// Posterior probability for each class, in `classes()` order
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let jll = self.joint_log_likelihood(x);
        let max = jll.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = jll.iter().map(|l| (l - max).exp()).collect();
        let sum: f64 = exp.iter().sum();
        exp.iter().map(|e| e / sum).collect()
    }

    /// Most probable class; ties go to the smaller class label
    pub fn predict(&self, x: &[f64]) -> usize {
        let jll = self.joint_log_likelihood(x);
        let mut best = 0;
        for (c, value) in jll.iter().enumerate() {
            if *value > jll[best] {
                best = c;
            }
        }
        self.classes[best]
    }
}

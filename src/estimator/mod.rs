//! Estimators consuming prepared feature vectors
//!
//! Every model implements [`Estimator`]: `fit` on a feature matrix at training
//! time, `predict` on a single prepared vector at inference time.

pub mod bayesian_ridge;
pub mod naive_bayes;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::FeatureVector;
use crate::error::Result;
use crate::models::Eligibility;

pub use bayesian_ridge::{BayesianRidge, BayesianRidgeConfig};
pub use naive_bayes::GaussianNb;

/// Uniform fit/predict contract
pub trait Estimator: Sized {
    type Target;
    type Prediction;

    /// Fit on a samples × features matrix
    fn fit(features: &Array2<f64>, targets: &[Self::Target]) -> Result<Self>;

    /// Predict from one raw feature row
    fn predict_row(&self, row: &[f64]) -> Self::Prediction;

    /// Width of the feature vectors this model was fit on
    fn n_features(&self) -> usize;

    /// Internal consistency of the fitted parameters
    fn validate(&self) -> Result<()>;

    fn predict(&self, features: &FeatureVector) -> Self::Prediction {
        self.predict_row(features.as_slice())
    }

    fn predict_batch(&self, features: &Array2<f64>) -> Vec<Self::Prediction> {
        features
            .rows()
            .into_iter()
            .map(|row| self.predict_row(&row.to_vec()))
            .collect()
    }
}

/// Eligible / Not Eligible classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EligibilityModel(GaussianNb);

impl EligibilityModel {
    /// Probability of the Eligible class
    pub fn eligible_probability(&self, features: &FeatureVector) -> f64 {
        let model = &self.0;
        model
            .classes()
            .iter()
            .zip(model.predict_proba(features.as_slice()))
            .find(|(class, _)| **class == 1)
            .map(|(_, p)| p)
            .unwrap_or(0.0)
    }
}

impl Estimator for EligibilityModel {
    type Target = bool;
    type Prediction = Eligibility;

    fn fit(features: &Array2<f64>, targets: &[bool]) -> Result<Self> {
        let labels: Vec<usize> = targets.iter().map(|&t| usize::from(t)).collect();
        Ok(Self(GaussianNb::fit(features, &labels)?))
    }

    fn predict_row(&self, row: &[f64]) -> Eligibility {
        Eligibility::from(self.0.predict(row) == 1)
    }

    fn n_features(&self) -> usize {
        self.0.n_features()
    }

    fn validate(&self) -> Result<()> {
        self.0.validate()
    }
}

/// Interest rate regressor (percent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterestRateModel(BayesianRidge);

impl Estimator for InterestRateModel {
    type Target = f64;
    type Prediction = f64;

    fn fit(features: &Array2<f64>, targets: &[f64]) -> Result<Self> {
        Ok(Self(BayesianRidge::fit(features, targets)?))
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.0.predict(row)
    }

    fn n_features(&self) -> usize {
        self.0.n_features()
    }

    fn validate(&self) -> Result<()> {
        self.0.validate()
    }
}

/// Loan tenure regressor (years)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenureModel(BayesianRidge);

impl Estimator for TenureModel {
    type Target = f64;
    type Prediction = f64;

    fn fit(features: &Array2<f64>, targets: &[f64]) -> Result<Self> {
        Ok(Self(BayesianRidge::fit(features, targets)?))
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.0.predict(row)
    }

    fn n_features(&self) -> usize {
        self.0.n_features()
    }

    fn validate(&self) -> Result<()> {
        self.0.validate()
    }
}

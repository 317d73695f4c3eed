//! Loan Eligibility - loan eligibility, interest rate and tenure prediction
//!
//! This library provides:
//! - Label encoding of categorical applicant attributes
//! - A feature pipeline shared by training and inference
//! - Gaussian naive Bayes eligibility and Bayesian ridge rate/tenure models
//! - Artifact persistence and an immutable inference context
//!
//! # Example
//!
//! ```no_run
//! use loan_eligibility::predictor::InferenceContext;
//! use loan_eligibility::data::LoanDataset;
//! use loan_eligibility::training::Trainer;
//! use loan_eligibility::artifacts::ArtifactStore;
//!
//! let dataset = LoanDataset::load("loan_eligibility_dataset.csv").unwrap();
//! let store = ArtifactStore::new("models");
//! let report = Trainer::with_defaults().train_and_save(&dataset, &store).unwrap();
//! println!("Eligibility {}", report.eligibility);
//!
//! let context = InferenceContext::load("models").unwrap();
//! println!("{:?}", context.registry().labels("Education"));
//! ```

pub mod artifacts;
pub mod data;
pub mod error;
pub mod estimator;
pub mod models;
pub mod predictor;
pub mod training;

// Re-export commonly used types
pub use data::{EncodingRegistry, FeaturePipeline, FeatureVector, LoanDataset, Record};
pub use error::{LoanError, Result};
pub use models::{
    Eligibility, LoanApplication, LoanAssessment, PredictResponse, RiskFactor,
};
pub use predictor::InferenceContext;

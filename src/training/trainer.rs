//! Training entry point
//!
//! Fits the encoders on the full dataset, splits rows into train/test with a
//! fixed seed, fits the three estimators on the training rows and evaluates
//! them on the held-out rows.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use super::metrics::{
    classification_metrics, regression_metrics, ClassificationMetrics, RegressionMetrics,
};
use crate::artifacts::{
    ArtifactStore, ModelArtifact, ELIGIBILITY_MODEL, INTEREST_MODEL, LABEL_ENCODERS,
    TENURE_MODEL, TRAINING_REPORT,
};
use crate::data::schema::categorical_columns;
use crate::data::{EncodingRegistry, FeaturePipeline, LoanDataset};
use crate::error::{LoanError, Result};
use crate::estimator::{EligibilityModel, Estimator, InterestRateModel, TenureModel};
use crate::predictor::InferenceContext;

/// Training configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_fraction: f64,
    /// Seed for the row shuffle
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Summary of a training run, persisted next to the models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub trained_at: DateTime<Utc>,
    pub config: TrainingConfig,
    pub total_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub eligibility: ClassificationMetrics,
    pub interest_rate: RegressionMetrics,
    pub tenure: RegressionMetrics,
}

/// Output of a training run
pub struct TrainedModels {
    pub registry: EncodingRegistry,
    pub eligibility: EligibilityModel,
    pub interest: InterestRateModel,
    pub tenure: TenureModel,
    pub report: TrainingReport,
}

impl TrainedModels {
    /// Persist every artifact under its stable name
    pub fn save(&self, store: &ArtifactStore) -> Result<Vec<PathBuf>> {
        Ok(vec![
            store.save(LABEL_ENCODERS, &self.registry)?,
            store.save(ELIGIBILITY_MODEL, &ModelArtifact::new(self.eligibility.clone()))?,
            store.save(INTEREST_MODEL, &ModelArtifact::new(self.interest.clone()))?,
            store.save(TENURE_MODEL, &ModelArtifact::new(self.tenure.clone()))?,
            store.save(TRAINING_REPORT, &self.report)?,
        ])
    }

    pub fn into_context(self) -> InferenceContext {
        InferenceContext::new(self.registry, self.eligibility, self.interest, self.tenure)
    }
}

pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(TrainingConfig::default())
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit one label encoder per categorical column
    pub fn fit_registry(dataset: &LoanDataset) -> EncodingRegistry {
        let mut registry = EncodingRegistry::new();
        for column in categorical_columns() {
            let encoder = registry.fit(column, dataset.labels(column));
            info!("Encoded {} with {} labels", column, encoder.len());
        }
        registry
    }

    /// Shuffled (train, test) row indices
    ///
    /// The test share is rounded up, but at least one row always stays in the
    /// training part.
    pub fn split(&self, n_rows: usize) -> (Vec<usize>, Vec<usize>) {
        let mut indices: Vec<usize> = (0..n_rows).collect();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        indices.shuffle(&mut rng);

        let fraction = self.config.test_fraction.clamp(0.0, 1.0);
        let n_test = ((n_rows as f64 * fraction).ceil() as usize).min(n_rows.saturating_sub(1));

        let train = indices.split_off(n_test);
        (train, indices)
    }

    pub fn train(&self, dataset: &LoanDataset) -> Result<TrainedModels> {
        if dataset.len() < 2 {
            return Err(LoanError::EmptyDataset(dataset.len()));
        }

        let registry = Self::fit_registry(dataset);
        let pipeline = FeaturePipeline::new(registry);

        let (train_idx, test_idx) = self.split(dataset.len());
        let train = dataset.select(&train_idx);
        let test = dataset.select(&test_idx);
        info!("Split {} rows into {} train / {} test", dataset.len(), train.len(), test.len());

        let x_train = pipeline.prepare_batch(&train.records)?;

        let eligibility = EligibilityModel::fit(&x_train, &train.eligibility)?;
        info!("Fitted eligibility model");
        let interest = InterestRateModel::fit(&x_train, &train.interest_rates)?;
        info!("Fitted interest rate model");
        let tenure = TenureModel::fit(&x_train, &train.tenures)?;
        info!("Fitted tenure model");

        let x_test = pipeline.prepare_batch(&test.records)?;
        let eligibility_metrics =
            classification_metrics(&eligibility.predict_batch(&x_test), &test.eligibility);
        let interest_metrics =
            regression_metrics(&interest.predict_batch(&x_test), &test.interest_rates);
        let tenure_metrics = regression_metrics(&tenure.predict_batch(&x_test), &test.tenures);

        info!("Eligibility: {}", eligibility_metrics);
        info!("Interest rate: {}", interest_metrics);
        info!("Tenure: {}", tenure_metrics);

        let report = TrainingReport {
            trained_at: Utc::now(),
            config: self.config,
            total_rows: dataset.len(),
            train_rows: train.len(),
            test_rows: test.len(),
            eligibility: eligibility_metrics,
            interest_rate: interest_metrics,
            tenure: tenure_metrics,
        };

        Ok(TrainedModels {
            registry: pipeline.registry().clone(),
            eligibility,
            interest,
            tenure,
            report,
        })
    }

    /// Train and write all artifacts to the store
    pub fn train_and_save(&self, dataset: &LoanDataset, store: &ArtifactStore) -> Result<TrainingReport> {
        let trained = self.train(dataset)?;
        trained.save(store)?;
        Ok(trained.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::HEADER;
    use crate::data::schema::{AGE, CIBIL_SCORE, EDUCATION};
    use crate::models::tests::sample_application;
    use crate::models::LoanApplication;
    use std::io::Write;

    const EMPLOYMENT_STABILITY: [&str; 3] = ["Permanent", "Contract Based", "New Joining"];
    const EMPLOYMENT_TYPE: [&str; 3] = ["Salaried", "Self-Employed", "Business Owner"];
    const LOAN_TYPE: [&str; 4] = ["Home Loan", "Personal Loan", "Car Loan", "Education Loan"];
    const PURPOSE: [&str; 5] = [
        "House Purchase",
        "Car Purchase",
        "Education",
        "Business Expansion",
        "Medical Emergency",
    ];
    const EDUCATION_LEVELS: [&str; 4] = ["High School", "Bachelor's", "Master's", "PhD"];
    const YES_NO: [&str; 2] = ["Yes", "No"];
    const TAX: [&str; 3] = ["Good", "Average", "Poor"];
    const RESIDENCE_TYPE: [&str; 3] = ["Owned", "Rented", "Company Provided"];
    const RESIDENCE: [&str; 3] = ["Urban", "Semi-Urban", "Rural"];

    /// Deterministic synthetic dataset where a good CIBIL score means eligibility
    fn synthetic_csv(rows: usize) -> String {
        let mut csv = String::from(HEADER);
        csv.push('\n');
        for i in 0..rows {
            let good = i % 2 == 0;
            let cibil = if good { 720 + (i * 7) % 150 } else { 420 + (i * 11) % 200 };
            let income = 300_000 + (i * 13_337) % 900_000;
            let debt = (income / 10) * (1 + i % 4);
            let assets = 500_000 + (i * 71_113) % 4_000_000;
            let loan = assets / (2 + i % 3);
            let experience = 1 + i % 20;
            let growth = i % 15;
            let rate = 18.0 - (cibil as f64 - 400.0) / 60.0;
            let tenure = 5.0 + (experience as f64) * 0.8;
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{:.1},{},{},{},{},{:.2},{},{},{},{},{}\n",
                21 + i % 40,
                income,
                10_000 + (i * 97) % 40_000,
                cibil,
                experience,
                EMPLOYMENT_STABILITY[i % 3],
                EMPLOYMENT_TYPE[(i / 3) % 3],
                LOAN_TYPE[i % 4],
                PURPOSE[i % 5],
                EDUCATION_LEVELS[(i / 2) % 4],
                loan,
                tenure,
                YES_NO[i % 2],
                YES_NO[(i / 2) % 2],
                TAX[i % 3],
                RESIDENCE_TYPE[(i / 5) % 3],
                rate,
                RESIDENCE[(i / 7) % 3],
                debt,
                growth,
                assets,
                if good { "Eligible" } else { "Not Eligible" },
            ));
        }
        csv
    }

    fn synthetic_dataset(rows: usize) -> (tempfile::NamedTempFile, LoanDataset) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(synthetic_csv(rows).as_bytes()).unwrap();
        file.flush().unwrap();
        let dataset = LoanDataset::load(file.path()).unwrap();
        (file, dataset)
    }

    #[test]
    fn test_split_is_reproducible() {
        let trainer = Trainer::with_defaults();
        let (train_a, test_a) = trainer.split(100);
        let (train_b, test_b) = trainer.split(100);

        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(test_a.len(), 20);
        assert_eq!(train_a.len(), 80);

        let mut all: Vec<usize> = train_a.iter().chain(&test_a).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_keeps_a_training_row() {
        let trainer = Trainer::new(TrainingConfig {
            test_fraction: 1.0,
            seed: 7,
        });
        let (train, test) = trainer.split(3);
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 2);
    }

    #[test]
    fn test_too_few_rows() {
        let (_file, dataset) = synthetic_dataset(1);
        assert!(matches!(
            Trainer::with_defaults().train(&dataset),
            Err(LoanError::EmptyDataset(1))
        ));
    }

    #[test]
    fn test_registry_fit_from_all_rows() {
        let (_file, dataset) = synthetic_dataset(40);
        let registry = Trainer::fit_registry(&dataset);

        assert_eq!(registry.fields().count(), 10);
        assert_eq!(
            registry.labels(EDUCATION).unwrap(),
            &["Bachelor's", "High School", "Master's", "PhD"]
        );
    }

    #[test]
    fn test_train_save_load_predict() {
        let (_file, dataset) = synthetic_dataset(120);
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let report = Trainer::with_defaults().train_and_save(&dataset, &store).unwrap();

        assert_eq!(report.total_rows, 120);
        assert_eq!(report.test_rows, 24);
        assert_eq!(report.train_rows, 96);
        assert!(report.eligibility.accuracy > 0.8, "{}", report.eligibility);
        assert!(store.missing().is_empty());
        assert!(store.exists(TRAINING_REPORT));

        let context = InferenceContext::from_store(&store).unwrap();

        let strong = LoanApplication {
            cibil_score: 850.0,
            ..sample_application()
        };
        let weak = LoanApplication {
            cibil_score: 430.0,
            ..sample_application()
        };
        let strong_assessment = context.assess(&strong).unwrap();
        let weak_assessment = context.assess(&weak).unwrap();

        assert!(strong_assessment.interest_rate < weak_assessment.interest_rate);
        assert!(weak_assessment.risk_factors.contains(&crate::models::RiskFactor::LowCibilScore));
    }

    #[test]
    fn test_training_and_inference_share_layout() {
        let (_file, dataset) = synthetic_dataset(30);
        let trained = Trainer::with_defaults().train(&dataset).unwrap();
        let training_pipeline = FeaturePipeline::new(trained.registry.clone());
        let training_vector = training_pipeline.prepare(&dataset.records[0]).unwrap();

        let context = trained.into_context();
        let inference_vector = context.pipeline().prepare(&dataset.records[0]).unwrap();

        assert_eq!(training_vector, inference_vector);
        assert_eq!(
            FeaturePipeline::feature_names().len(),
            inference_vector.len()
        );
        assert_eq!(inference_vector.get(AGE), dataset.records[0].number(AGE).ok());
        assert_eq!(
            inference_vector.get(CIBIL_SCORE),
            dataset.records[0].number(CIBIL_SCORE).ok()
        );
    }
}

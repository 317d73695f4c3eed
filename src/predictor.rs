use std::path::Path;
use tracing::{info, warn};

use crate::artifacts::{
    ArtifactStore, ModelArtifact, ELIGIBILITY_MODEL, INTEREST_MODEL, LABEL_ENCODERS,
    TENURE_MODEL,
};
use crate::data::schema::{CIBIL_SCORE, EXPERIENCE};
use crate::data::{DerivedFeatures, EncodingRegistry, FeaturePipeline, Record};
use crate::error::{LoanError, Result};
use crate::estimator::{EligibilityModel, Estimator, InterestRateModel, TenureModel};
use crate::models::{LoanApplication, LoanAssessment, RiskFactor};

/// CIBIL score below which an applicant is flagged
pub const LOW_CIBIL_THRESHOLD: f64 = 700.0;
/// Debt-to-income ratio above which an applicant is flagged
pub const HIGH_DEBT_TO_INCOME_THRESHOLD: f64 = 0.5;
/// Years of experience below which an applicant is flagged
pub const LIMITED_EXPERIENCE_THRESHOLD: f64 = 2.0;

/// Loaded encoders and models, built once and shared read-only
pub struct InferenceContext {
    pipeline: FeaturePipeline,
    eligibility: EligibilityModel,
    interest: InterestRateModel,
    tenure: TenureModel,
}

impl InferenceContext {
    pub fn new(
        registry: EncodingRegistry,
        eligibility: EligibilityModel,
        interest: InterestRateModel,
        tenure: TenureModel,
    ) -> Self {
        Self {
            pipeline: FeaturePipeline::new(registry),
            eligibility,
            interest,
            tenure,
        }
    }

    /// Load every trained artifact from a model directory
    pub fn load<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        Self::from_store(&ArtifactStore::new(model_dir))
    }

    pub fn from_store(store: &ArtifactStore) -> Result<Self> {
        let missing = store.missing();
        if !missing.is_empty() {
            warn!("Missing artifacts in {:?}: {:?}", store.dir(), missing);
        }

        let registry: EncodingRegistry = store.load(LABEL_ENCODERS)?;
        let eligibility = store
            .load::<ModelArtifact<EligibilityModel>>(ELIGIBILITY_MODEL)?
            .into_checked(ELIGIBILITY_MODEL)?;
        let interest = store
            .load::<ModelArtifact<InterestRateModel>>(INTEREST_MODEL)?
            .into_checked(INTEREST_MODEL)?;
        let tenure = store
            .load::<ModelArtifact<TenureModel>>(TENURE_MODEL)?
            .into_checked(TENURE_MODEL)?;

        info!("Loaded models and encoders from {:?}", store.dir());
        Ok(Self::new(registry, eligibility, interest, tenure))
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn registry(&self) -> &EncodingRegistry {
        self.pipeline.registry()
    }

    /// Validate an application and predict all three outcomes
    pub fn assess(&self, application: &LoanApplication) -> Result<LoanAssessment> {
        self.assess_record(&application.to_record())
    }

    /// Predict from a raw record keyed by column name
    ///
    /// Bounds are checked before any feature is computed, so a record that
    /// would fail form validation is rejected here too.
    pub fn assess_record(&self, record: &Record) -> Result<LoanAssessment> {
        record.validate_bounds()?;
        let features = self.pipeline.prepare(record)?;
        let derived = DerivedFeatures::from_record(record)?;

        let interest_rate = self.interest.predict(&features);
        let tenure_years = self.tenure.predict(&features);
        if !interest_rate.is_finite() || !tenure_years.is_finite() {
            return Err(LoanError::Estimator(
                "regressor produced a non-finite prediction".to_string(),
            ));
        }

        Ok(LoanAssessment {
            eligibility: self.eligibility.predict(&features),
            eligible_probability: self.eligibility.eligible_probability(&features),
            interest_rate,
            tenure_years,
            risk_factors: risk_factors(
                record.number(CIBIL_SCORE)?,
                &derived,
                record.number(EXPERIENCE)?,
            ),
        })
    }
}

/// Qualitative risk flags, in display order
pub fn risk_factors(cibil_score: f64, derived: &DerivedFeatures, experience: f64) -> Vec<RiskFactor> {
    let mut factors = Vec::new();
    if cibil_score < LOW_CIBIL_THRESHOLD {
        factors.push(RiskFactor::LowCibilScore);
    }
    if derived.debt_to_income > HIGH_DEBT_TO_INCOME_THRESHOLD {
        factors.push(RiskFactor::HighDebtToIncome);
    }
    if experience < LIMITED_EXPERIENCE_THRESHOLD {
        factors.push(RiskFactor::LimitedExperience);
    }
    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::features::tests::{sample_record, sample_registry};
    use crate::data::schema::{AGE, FEATURE_COUNT, INCOME, TOTAL_DEBT};
    use crate::models::tests::sample_application;
    use crate::models::Eligibility;
    use ndarray::Array2;

    /// Context whose models are fit on prepared copies of the sample record
    fn fitted_context() -> InferenceContext {
        let pipeline = FeaturePipeline::new(sample_registry());
        let records: Vec<Record> = (0..8)
            .map(|i| {
                sample_record()
                    .with(CIBIL_SCORE, 600.0 + 40.0 * i as f64)
                    .with("Age", 25.0 + i as f64)
            })
            .collect();
        let x: Array2<f64> = pipeline.prepare_batch(&records).unwrap();
        let eligible: Vec<bool> = (0..8).map(|i| i >= 4).collect();
        let rates: Vec<f64> = (0..8).map(|i| 14.0 - 0.5 * i as f64).collect();
        let years: Vec<f64> = (0..8).map(|i| 5.0 + 2.0 * i as f64).collect();

        InferenceContext::new(
            sample_registry(),
            EligibilityModel::fit(&x, &eligible).unwrap(),
            InterestRateModel::fit(&x, &rates).unwrap(),
            TenureModel::fit(&x, &years).unwrap(),
        )
    }

    #[test]
    fn test_all_three_risk_flags() {
        let record = sample_record()
            .with(CIBIL_SCORE, 650.0)
            .with(TOTAL_DEBT, 60_000.0)
            .with(INCOME, 100_000.0)
            .with(EXPERIENCE, 1.0);
        let derived = DerivedFeatures::from_record(&record).unwrap();

        let flags = risk_factors(650.0, &derived, 1.0);

        assert_eq!(
            flags,
            vec![
                RiskFactor::LowCibilScore,
                RiskFactor::HighDebtToIncome,
                RiskFactor::LimitedExperience
            ]
        );
        let labels: Vec<String> = flags.iter().map(|f| f.to_string()).collect();
        assert_eq!(
            labels,
            ["Low CIBIL Score", "High Debt-to-Income Ratio", "Limited Work Experience"]
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        let record = sample_record().with(TOTAL_DEBT, 50_000.0);
        let derived = DerivedFeatures::from_record(&record).unwrap();
        assert!(risk_factors(700.0, &derived, 2.0).is_empty());
    }

    #[test]
    fn test_assess_application() {
        let context = fitted_context();
        let assessment = context.assess(&sample_application()).unwrap();

        assert!(assessment.interest_rate.is_finite());
        assert!(assessment.tenure_years.is_finite());
        assert!((0.0..=1.0).contains(&assessment.eligible_probability));
        assert!(assessment.risk_factors.is_empty());
        assert_eq!(
            assessment.eligibility.is_eligible(),
            assessment.eligibility == Eligibility::Eligible
        );
    }

    #[test]
    fn test_assess_is_deterministic() {
        let context = fitted_context();
        let first = context.assess(&sample_application()).unwrap();
        let second = context.assess(&sample_application()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_assess_rejects_out_of_bounds_age() {
        let context = fitted_context();
        let application = LoanApplication {
            age: 17.0,
            ..sample_application()
        };
        assert!(matches!(
            context.assess(&application),
            Err(LoanError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_assess_unknown_category() {
        let context = fitted_context();
        let application = LoanApplication {
            education: "Diploma".to_string(),
            ..sample_application()
        };
        assert!(matches!(
            context.assess(&application),
            Err(LoanError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_assess_zero_income() {
        let context = fitted_context();
        let application = LoanApplication {
            income: 0.0,
            ..sample_application()
        };
        assert!(matches!(
            context.assess(&application),
            Err(LoanError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_assess_reports_all_three_risk_flags() {
        let context = fitted_context();
        let application = LoanApplication {
            cibil_score: 650.0,
            total_debt: 60_000.0,
            income: 100_000.0,
            experience: 1.0,
            ..sample_application()
        };

        let assessment = context.assess(&application).unwrap();

        assert_eq!(
            assessment.risk_factors,
            vec![
                RiskFactor::LowCibilScore,
                RiskFactor::HighDebtToIncome,
                RiskFactor::LimitedExperience
            ]
        );
    }

    #[test]
    fn test_assess_record_rejects_out_of_bounds_age() {
        let context = fitted_context();
        for age in [17.0, 101.0] {
            let result = context.assess_record(&sample_record().with(AGE, age));
            assert!(matches!(
                result,
                Err(LoanError::InvalidField { ref field, .. }) if field == AGE
            ));
        }
        assert!(context.assess_record(&sample_record().with(AGE, 18.0)).is_ok());
        assert!(context.assess_record(&sample_record().with(AGE, 100.0)).is_ok());
    }

    #[test]
    fn test_assess_record_rejects_negative_income() {
        let context = fitted_context();
        let record = sample_record()
            .with(INCOME, -100_000.0)
            .with(TOTAL_DEBT, 40_000.0);
        assert!(matches!(
            context.assess_record(&record),
            Err(LoanError::InvalidField { ref field, .. }) if field == INCOME
        ));
    }

    #[test]
    fn test_assess_record_subnormal_income_is_input_error() {
        let context = fitted_context();
        let record = sample_record()
            .with(INCOME, 1e-320)
            .with(TOTAL_DEBT, 1e10);
        let err = context.assess_record(&record).unwrap_err();
        assert!(matches!(err, LoanError::DivisionByZero { .. }));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_load_before_training_is_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let result = InferenceContext::load(dir.path());
        assert!(matches!(result, Err(LoanError::MissingArtifact { .. })));
    }

    #[test]
    fn test_feature_width_matches_models() {
        let context = fitted_context();
        let features = context.pipeline().prepare(&sample_record()).unwrap();
        assert_eq!(features.len(), FEATURE_COUNT);
        assert_eq!(context.interest.n_features(), FEATURE_COUNT);
    }
}

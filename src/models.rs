use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::schema::*;
use crate::data::Record;
use crate::error::Result;

/// Applicant data collected by the form or the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    #[serde(rename = "Age")]
    pub age: f64,
    #[serde(rename = "Income")]
    pub income: f64,
    #[serde(rename = "Expenses")]
    pub expenses: f64,
    #[serde(rename = "CIBIL_Score")]
    pub cibil_score: f64,
    #[serde(rename = "Experience")]
    pub experience: f64,
    #[serde(rename = "Employment_Stability")]
    pub employment_stability: String,
    #[serde(rename = "Employment_Type")]
    pub employment_type: String,
    #[serde(rename = "Loan_Type")]
    pub loan_type: String,
    #[serde(rename = "Purpose")]
    pub purpose: String,
    #[serde(rename = "Education")]
    pub education: String,
    #[serde(rename = "Loan_Amount")]
    pub loan_amount: f64,
    #[serde(rename = "Collateral")]
    pub collateral: String,
    #[serde(rename = "Insurance")]
    pub insurance: String,
    #[serde(rename = "Tax_History")]
    pub tax_history: String,
    #[serde(rename = "Residence_Type")]
    pub residence_type: String,
    #[serde(rename = "Residence")]
    pub residence: String,
    #[serde(rename = "Total_Debt")]
    pub total_debt: f64,
    #[serde(rename = "Salary_Growth")]
    pub salary_growth: f64,
    #[serde(rename = "Total_Assets")]
    pub total_assets: f64,
}

impl LoanApplication {
    /// Numeric fields paired with their column names
    pub fn numeric_fields(&self) -> [(&'static str, f64); 9] {
        [
            (AGE, self.age),
            (INCOME, self.income),
            (EXPENSES, self.expenses),
            (CIBIL_SCORE, self.cibil_score),
            (EXPERIENCE, self.experience),
            (LOAN_AMOUNT, self.loan_amount),
            (TOTAL_DEBT, self.total_debt),
            (SALARY_GROWTH, self.salary_growth),
            (TOTAL_ASSETS, self.total_assets),
        ]
    }

    /// Categorical fields paired with their column names
    pub fn categorical_fields(&self) -> [(&'static str, &str); 10] {
        [
            (EMPLOYMENT_STABILITY, self.employment_stability.as_str()),
            (EMPLOYMENT_TYPE, self.employment_type.as_str()),
            (LOAN_TYPE, self.loan_type.as_str()),
            (PURPOSE, self.purpose.as_str()),
            (EDUCATION, self.education.as_str()),
            (COLLATERAL, self.collateral.as_str()),
            (INSURANCE, self.insurance.as_str()),
            (TAX_HISTORY, self.tax_history.as_str()),
            (RESIDENCE_TYPE, self.residence_type.as_str()),
            (RESIDENCE, self.residence.as_str()),
        ]
    }

    /// Check the declared input bounds (inclusive)
    pub fn validate(&self) -> Result<()> {
        for (column, value) in self.numeric_fields() {
            check_bounds(column, value)?;
        }
        Ok(())
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        for (column, value) in self.numeric_fields() {
            record.insert(column, value);
        }
        for (column, label) in self.categorical_fields() {
            record.insert(column, label);
        }
        record
    }
}

/// Binary eligibility verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eligibility {
    #[serde(rename = "Eligible")]
    Eligible,
    #[serde(rename = "Not Eligible")]
    NotEligible,
}

impl Eligibility {
    pub fn is_eligible(self) -> bool {
        self == Eligibility::Eligible
    }
}

impl From<bool> for Eligibility {
    fn from(eligible: bool) -> Self {
        if eligible {
            Eligibility::Eligible
        } else {
            Eligibility::NotEligible
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::Eligible => write!(f, "{}", ELIGIBLE_LABEL),
            Eligibility::NotEligible => write!(f, "{}", NOT_ELIGIBLE_LABEL),
        }
    }
}

/// Qualitative risk flag shown next to the predictions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFactor {
    #[serde(rename = "Low CIBIL Score")]
    LowCibilScore,
    #[serde(rename = "High Debt-to-Income Ratio")]
    HighDebtToIncome,
    #[serde(rename = "Limited Work Experience")]
    LimitedExperience,
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskFactor::LowCibilScore => "Low CIBIL Score",
            RiskFactor::HighDebtToIncome => "High Debt-to-Income Ratio",
            RiskFactor::LimitedExperience => "Limited Work Experience",
        };
        write!(f, "{}", label)
    }
}

/// Outcome of running one application through the pipeline and all models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAssessment {
    pub eligibility: Eligibility,
    pub eligible_probability: f64,
    /// Percent per annum
    pub interest_rate: f64,
    pub tenure_years: f64,
    pub risk_factors: Vec<RiskFactor>,
}

impl LoanAssessment {
    pub fn interest_rate_display(&self) -> String {
        format!("{:.2}%", self.interest_rate)
    }

    pub fn tenure_display(&self) -> String {
        format!("{:.1} years", self.tenure_years)
    }
}

/// Prediction response
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub eligibility: Eligibility,
    pub eligible: bool,
    pub eligible_probability: f64,
    pub interest_rate: f64,
    pub interest_rate_display: String,
    pub tenure_years: f64,
    pub tenure_display: String,
    pub risk_factors: Vec<RiskFactor>,
}

impl From<LoanAssessment> for PredictResponse {
    fn from(assessment: LoanAssessment) -> Self {
        Self {
            eligible: assessment.eligibility.is_eligible(),
            interest_rate_display: assessment.interest_rate_display(),
            tenure_display: assessment.tenure_display(),
            eligibility: assessment.eligibility,
            eligible_probability: assessment.eligible_probability,
            interest_rate: assessment.interest_rate,
            tenure_years: assessment.tenure_years,
            risk_factors: assessment.risk_factors,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
    /// Length of the feature vector the models expect
    pub feature_count: usize,
    /// Categorical fields with a fitted encoder
    pub encoded_fields: Vec<String>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

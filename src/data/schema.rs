//! Dataset schema
//!
//! Column names and ordering shared by training and inference. The feature
//! vector layout is derived from `SCHEMA_COLUMNS` followed by `DERIVED_FEATURES`,
//! so both call sites see the same ordering.

use crate::error::{validate_non_negative, validate_range, Result};

/// Whether a schema column carries a number or a category label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

pub const AGE: &str = "Age";
pub const INCOME: &str = "Income";
pub const EXPENSES: &str = "Expenses";
pub const CIBIL_SCORE: &str = "CIBIL_Score";
pub const EXPERIENCE: &str = "Experience";
pub const EMPLOYMENT_STABILITY: &str = "Employment_Stability";
pub const EMPLOYMENT_TYPE: &str = "Employment_Type";
pub const LOAN_TYPE: &str = "Loan_Type";
pub const PURPOSE: &str = "Purpose";
pub const EDUCATION: &str = "Education";
pub const LOAN_AMOUNT: &str = "Loan_Amount";
pub const COLLATERAL: &str = "Collateral";
pub const INSURANCE: &str = "Insurance";
pub const TAX_HISTORY: &str = "Tax_History";
pub const RESIDENCE_TYPE: &str = "Residence_Type";
pub const RESIDENCE: &str = "Residence";
pub const TOTAL_DEBT: &str = "Total_Debt";
pub const SALARY_GROWTH: &str = "Salary_Growth";
pub const TOTAL_ASSETS: &str = "Total_Assets";

pub const DEBT_TO_INCOME: &str = "Debt-to-Income Ratio";
pub const LOAN_TO_VALUE: &str = "Loan-to-Value Ratio";
pub const EMPLOYMENT_STABILITY_SCORE: &str = "Employment_Stability_Score";

/// Target columns present only in the training dataset
pub const TARGET_ELIGIBILITY: &str = "Loan_Eligibility";
pub const TARGET_INTEREST_RATE: &str = "Interest_Rate";
pub const TARGET_TENURE: &str = "Loan_Tenure";

pub const ELIGIBLE_LABEL: &str = "Eligible";
pub const NOT_ELIGIBLE_LABEL: &str = "Not Eligible";

/// Input columns in their fixed training-time order
pub const SCHEMA_COLUMNS: [(&str, ColumnKind); 19] = [
    (AGE, ColumnKind::Numeric),
    (INCOME, ColumnKind::Numeric),
    (EXPENSES, ColumnKind::Numeric),
    (CIBIL_SCORE, ColumnKind::Numeric),
    (EXPERIENCE, ColumnKind::Numeric),
    (EMPLOYMENT_STABILITY, ColumnKind::Categorical),
    (EMPLOYMENT_TYPE, ColumnKind::Categorical),
    (LOAN_TYPE, ColumnKind::Categorical),
    (PURPOSE, ColumnKind::Categorical),
    (EDUCATION, ColumnKind::Categorical),
    (LOAN_AMOUNT, ColumnKind::Numeric),
    (COLLATERAL, ColumnKind::Categorical),
    (INSURANCE, ColumnKind::Categorical),
    (TAX_HISTORY, ColumnKind::Categorical),
    (RESIDENCE_TYPE, ColumnKind::Categorical),
    (RESIDENCE, ColumnKind::Categorical),
    (TOTAL_DEBT, ColumnKind::Numeric),
    (SALARY_GROWTH, ColumnKind::Numeric),
    (TOTAL_ASSETS, ColumnKind::Numeric),
];

/// Derived features, appended after the schema columns
pub const DERIVED_FEATURES: [&str; 3] = [DEBT_TO_INCOME, LOAN_TO_VALUE, EMPLOYMENT_STABILITY_SCORE];

/// Length of the feature vector consumed by every estimator
pub const FEATURE_COUNT: usize = SCHEMA_COLUMNS.len() + DERIVED_FEATURES.len();

/// Inclusive bounds accepted by input validation, `None` meaning unbounded
pub fn numeric_bounds(column: &str) -> (f64, Option<f64>) {
    match column {
        AGE => (18.0, Some(100.0)),
        CIBIL_SCORE => (300.0, Some(900.0)),
        EXPERIENCE => (0.0, Some(50.0)),
        SALARY_GROWTH => (0.0, Some(20.0)),
        _ => (0.0, None),
    }
}

/// Check a numeric column value against its bounds
pub fn check_bounds(column: &str, value: f64) -> Result<()> {
    match numeric_bounds(column) {
        (min, Some(max)) => validate_range(column, value, min, max),
        (_, None) => validate_non_negative(column, value),
    }
}

/// Names of the numeric input columns in schema order
pub fn numeric_columns() -> impl Iterator<Item = &'static str> {
    SCHEMA_COLUMNS
        .iter()
        .filter(|(_, kind)| *kind == ColumnKind::Numeric)
        .map(|(name, _)| *name)
}

/// Names of the categorical input columns in schema order
pub fn categorical_columns() -> impl Iterator<Item = &'static str> {
    SCHEMA_COLUMNS
        .iter()
        .filter(|(_, kind)| *kind == ColumnKind::Categorical)
        .map(|(name, _)| *name)
}

/// Feature column names in vector order
pub fn feature_names() -> Vec<&'static str> {
    SCHEMA_COLUMNS
        .iter()
        .map(|(name, _)| *name)
        .chain(DERIVED_FEATURES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_counts() {
        assert_eq!(numeric_columns().count(), 9);
        assert_eq!(categorical_columns().count(), 10);
        assert_eq!(FEATURE_COUNT, 22);
        assert_eq!(feature_names().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_derived_features_come_last() {
        let names = feature_names();
        assert_eq!(names[0], AGE);
        assert_eq!(names[5], EMPLOYMENT_STABILITY);
        assert_eq!(names[18], TOTAL_ASSETS);
        assert_eq!(&names[19..], &DERIVED_FEATURES);
    }

    #[test]
    fn test_numeric_bounds() {
        assert_eq!(numeric_bounds(AGE), (18.0, Some(100.0)));
        assert_eq!(numeric_bounds(CIBIL_SCORE), (300.0, Some(900.0)));
        assert_eq!(numeric_bounds(INCOME), (0.0, None));
    }
}

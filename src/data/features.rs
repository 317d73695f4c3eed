//! Feature Engineering
//!
//! Turns a raw `Record` into the fixed-order numeric vector consumed by the
//! estimators: schema columns (categoricals label-encoded in place) followed
//! by the derived ratios.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::encoding::EncodingRegistry;
use super::record::Record;
use super::schema::{
    self, ColumnKind, DEBT_TO_INCOME, EXPERIENCE, FEATURE_COUNT, INCOME, LOAN_AMOUNT,
    LOAN_TO_VALUE, SALARY_GROWTH, SCHEMA_COLUMNS, TOTAL_ASSETS, TOTAL_DEBT,
};
use crate::error::{LoanError, Result};

/// Ratios computed from a record, never stored on their own
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    pub debt_to_income: f64,
    pub loan_to_value: f64,
    pub employment_stability_score: f64,
}

impl DerivedFeatures {
    /// Compute the derived features
    ///
    /// A zero `Income` or `Total_Assets` is rejected with `DivisionByZero`
    /// instead of producing a non-finite ratio.
    pub fn from_record(record: &Record) -> Result<Self> {
        let income = record.number(INCOME)?;
        let total_debt = record.number(TOTAL_DEBT)?;
        let loan_amount = record.number(LOAN_AMOUNT)?;
        let total_assets = record.number(TOTAL_ASSETS)?;
        let experience = record.number(EXPERIENCE)?;
        let salary_growth = record.number(SALARY_GROWTH)?;

        Ok(Self {
            debt_to_income: ratio(total_debt, income, DEBT_TO_INCOME, INCOME)?,
            loan_to_value: ratio(loan_amount, total_assets, LOAN_TO_VALUE, TOTAL_ASSETS)?,
            employment_stability_score: experience * salary_growth,
        })
    }

    /// Values in `DERIVED_FEATURES` order
    pub fn to_array(&self) -> [f64; 3] {
        [
            self.debt_to_income,
            self.loan_to_value,
            self.employment_stability_score,
        ]
    }
}

fn ratio(
    numerator: f64,
    denominator: f64,
    ratio: &'static str,
    denominator_name: &'static str,
) -> Result<f64> {
    let value = numerator / denominator;
    // Subnormal denominators overflow to infinity just like zero ones
    if denominator == 0.0 || !value.is_finite() {
        return Err(LoanError::DivisionByZero {
            ratio,
            denominator: denominator_name,
        });
    }
    Ok(value)
}

/// Model input for a single record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of a named feature column
    pub fn get(&self, name: &str) -> Option<f64> {
        schema::feature_names()
            .iter()
            .position(|n| *n == name)
            .and_then(|idx| self.0.get(idx).copied())
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Validate → encode → derive → assemble
///
/// Holds the fitted encoders read-only; the same pipeline instance type is used
/// by the trainer and by inference, which keeps the column layout identical.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    registry: EncodingRegistry,
}

impl FeaturePipeline {
    pub fn new(registry: EncodingRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &EncodingRegistry {
        &self.registry
    }

    /// Column names of the produced vectors
    pub fn feature_names() -> Vec<&'static str> {
        schema::feature_names()
    }

    /// Prepare one record
    pub fn prepare(&self, record: &Record) -> Result<FeatureVector> {
        // Presence first, so a malformed record reports MissingField even when
        // one of its labels would also be unknown.
        for (column, kind) in SCHEMA_COLUMNS {
            match kind {
                ColumnKind::Numeric => {
                    let value = record.number(column)?;
                    if !value.is_finite() {
                        return Err(LoanError::InvalidField {
                            field: column.to_string(),
                            reason: format!("expected a finite number, got {}", value),
                        });
                    }
                }
                ColumnKind::Categorical => {
                    record.label(column)?;
                }
            }
        }

        let mut features = Vec::with_capacity(FEATURE_COUNT);
        for (column, kind) in SCHEMA_COLUMNS {
            let value = match kind {
                ColumnKind::Numeric => record.number(column)?,
                ColumnKind::Categorical => {
                    self.registry.encode(column, record.label(column)?)? as f64
                }
            };
            features.push(value);
        }

        features.extend(DerivedFeatures::from_record(record)?.to_array());

        debug_assert_eq!(features.len(), FEATURE_COUNT);
        Ok(FeatureVector(features))
    }

    /// Prepare many records into a row-major matrix
    pub fn prepare_batch(&self, records: &[Record]) -> Result<Array2<f64>> {
        let mut data = Vec::with_capacity(records.len() * FEATURE_COUNT);
        for record in records {
            data.extend(self.prepare(record)?.into_inner());
        }

        Array2::from_shape_vec((records.len(), FEATURE_COUNT), data)
            .map_err(|e| LoanError::Estimator(format!("feature matrix shape: {}", e)))
    }
}

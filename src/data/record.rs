//! Raw applicant records
//!
//! A `Record` is the untyped form every source is reduced to before feature
//! preparation: dataset rows, HTTP payloads and CLI input all end up here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::schema::{check_bounds, numeric_columns};
use crate::error::{LoanError, Result};

/// A single raw field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Label(String),
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Label(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Label(value)
    }
}

/// One loan application keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn remove(&mut self, column: &str) -> Option<FieldValue> {
        self.fields.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Numeric value of a column
    ///
    /// Absent columns yield `MissingField`; a label where a number is expected
    /// yields `InvalidField`.
    pub fn number(&self, column: &str) -> Result<f64> {
        match self.fields.get(column) {
            Some(FieldValue::Number(value)) => Ok(*value),
            Some(FieldValue::Label(label)) => Err(LoanError::InvalidField {
                field: column.to_string(),
                reason: format!("expected a number, got '{}'", label),
            }),
            None => Err(LoanError::MissingField(column.to_string())),
        }
    }

    /// Category label of a column
    pub fn label(&self, column: &str) -> Result<&str> {
        match self.fields.get(column) {
            Some(FieldValue::Label(label)) => Ok(label.as_str()),
            Some(FieldValue::Number(value)) => Err(LoanError::InvalidField {
                field: column.to_string(),
                reason: format!("expected a category label, got {}", value),
            }),
            None => Err(LoanError::MissingField(column.to_string())),
        }
    }

    /// Check every numeric input column against its declared bounds
    pub fn validate_bounds(&self) -> Result<()> {
        for column in numeric_columns() {
            check_bounds(column, self.number(column)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds() {
        use crate::data::features::tests::sample_record;
        use crate::data::schema::{AGE, INCOME};

        assert!(sample_record().validate_bounds().is_ok());
        assert!(sample_record().with(AGE, 18.0).validate_bounds().is_ok());
        assert!(sample_record().with(AGE, 100.0).validate_bounds().is_ok());

        for age in [17.0, 101.0] {
            assert!(matches!(
                sample_record().with(AGE, age).validate_bounds(),
                Err(LoanError::InvalidField { ref field, .. }) if field == AGE
            ));
        }
        assert!(matches!(
            sample_record().with(INCOME, -1.0).validate_bounds(),
            Err(LoanError::InvalidField { ref field, .. }) if field == INCOME
        ));

        let mut record = sample_record();
        record.remove(INCOME);
        assert!(matches!(
            record.validate_bounds(),
            Err(LoanError::MissingField(ref field)) if field == INCOME
        ));
    }

    #[test]
    fn test_number_and_label_lookup() {
        let record = Record::new().with("Age", 30.0).with("Education", "PhD");

        assert_eq!(record.number("Age").unwrap(), 30.0);
        assert_eq!(record.label("Education").unwrap(), "PhD");
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_missing_column() {
        let record = Record::new();
        assert!(matches!(
            record.number("Income"),
            Err(LoanError::MissingField(ref f)) if f == "Income"
        ));
        assert!(matches!(record.label("Residence"), Err(LoanError::MissingField(_))));
    }

    #[test]
    fn test_wrong_value_kind() {
        let record = Record::new().with("Age", "thirty").with("Education", 3.0);
        assert!(matches!(record.number("Age"), Err(LoanError::InvalidField { .. })));
        assert!(matches!(record.label("Education"), Err(LoanError::InvalidField { .. })));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"Age": 42, "Collateral": "Yes"}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.number("Age").unwrap(), 42.0);
        assert_eq!(record.label("Collateral").unwrap(), "Yes");
    }
}

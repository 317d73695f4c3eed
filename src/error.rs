//! Error taxonomy and input validation

use std::path::PathBuf;
use thiserror::Error;

#[cfg(feature = "api")]
use actix_web::{http::StatusCode, HttpResponse, ResponseError};

#[cfg(feature = "api")]
use crate::models::ErrorResponse;

/// Errors raised by the pipeline, the estimators and the artifact store
#[derive(Debug, Error)]
pub enum LoanError {
    /// A trained artifact is absent; the operator must run training first
    #[error("Artifact '{name}' not found at {}. Run `loan-cli train` first.", .path.display())]
    MissingArtifact { name: String, path: PathBuf },

    /// Label never seen while fitting the encoder for this field
    #[error("Unknown category '{label}' for field {field}")]
    UnknownCategory { field: String, label: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Division by zero computing {ratio}: {denominator} is 0")]
    DivisionByZero {
        ratio: &'static str,
        denominator: &'static str,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// Persisted model was trained on a different column layout
    #[error("Schema mismatch in '{artifact}': expected columns {expected:?}, found {found:?}")]
    SchemaMismatch {
        artifact: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("Dataset has too few rows: {0}")]
    EmptyDataset(usize),

    #[error("Estimator error: {0}")]
    Estimator(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Dataset error: {0}")]
    Dataset(#[from] polars::prelude::PolarsError),
}

impl LoanError {
    /// True for errors caused by the submitted record rather than the system
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            LoanError::MissingField(_)
                | LoanError::UnknownCategory { .. }
                | LoanError::InvalidField { .. }
                | LoanError::DivisionByZero { .. }
        )
    }
}

pub type Result<T, E = LoanError> = std::result::Result<T, E>;

/// Validation functions
pub fn validate_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(LoanError::InvalidField {
            field: field.to_string(),
            reason: format!("must be a non-negative number, got {}", value),
        });
    }
    Ok(())
}

/// Inclusive bounds check
pub fn validate_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    validate_non_negative(field, value)?;
    if !(min..=max).contains(&value) {
        return Err(LoanError::InvalidField {
            field: field.to_string(),
            reason: format!("must be between {} and {}, got {}", min, max, value),
        });
    }
    Ok(())
}

/// Handlers return `LoanError` directly; input errors are the client's fault
#[cfg(feature = "api")]
impl ResponseError for LoanError {
    fn status_code(&self) -> StatusCode {
        if self.is_input_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            e if e.is_input_error() => "validation_error",
            LoanError::Estimator(_) => "prediction_error",
            _ => "internal_error",
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error.to_string(),
            message: self.to_string(),
        })
    }
}

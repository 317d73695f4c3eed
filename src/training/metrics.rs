//! Hold-out evaluation metrics

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Eligibility;

/// Classifier accuracy on the hold-out rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
}

/// Regressor errors on the hold-out rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub total: usize,
    pub rmse: f64,
    pub mae: f64,
    /// Coefficient of determination; 0 when the targets have no variance
    pub r2: f64,
}

pub fn classification_metrics(predicted: &[Eligibility], actual: &[bool]) -> ClassificationMetrics {
    let total = predicted.len().min(actual.len());
    if total == 0 {
        return ClassificationMetrics::default();
    }

    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p.is_eligible() == **a)
        .count();

    ClassificationMetrics {
        total,
        correct,
        accuracy: correct as f64 / total as f64,
    }
}

pub fn regression_metrics(predicted: &[f64], actual: &[f64]) -> RegressionMetrics {
    let total = predicted.len().min(actual.len());
    if total == 0 {
        return RegressionMetrics::default();
    }
    let n = total as f64;

    let errors: Vec<f64> = predicted.iter().zip(actual).map(|(p, a)| p - a).collect();
    let sse: f64 = errors.iter().map(|e| e * e).sum();
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

    let mean = actual[..total].iter().sum::<f64>() / n;
    let sst: f64 = actual[..total].iter().map(|a| (a - mean).powi(2)).sum();
    let r2 = if sst > 0.0 { 1.0 - sse / sst } else { 0.0 };

    RegressionMetrics {
        total,
        rmse: (sse / n).sqrt(),
        mae,
        r2,
    }
}

impl fmt::Display for ClassificationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accuracy {:.1}% ({}/{})",
            self.accuracy * 100.0,
            self.correct,
            self.total
        )
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RMSE {:.3}, MAE {:.3}, R² {:.3} (n={})",
            self.rmse, self.mae, self.r2, self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        let predicted = [
            Eligibility::Eligible,
            Eligibility::NotEligible,
            Eligibility::Eligible,
            Eligibility::Eligible,
        ];
        let actual = [true, false, false, true];

        let metrics = classification_metrics(&predicted, &actual);
        assert_eq!(metrics.total, 4);
        assert_eq!(metrics.correct, 3);
        assert!((metrics.accuracy - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_regression_metrics() {
        let metrics = regression_metrics(&[2.0, 4.0, 6.0], &[1.0, 4.0, 7.0]);

        assert_eq!(metrics.total, 3);
        assert!((metrics.mae - 2.0 / 3.0).abs() < 1e-12);
        assert!((metrics.rmse - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        // sst = 9 + 0 + 9
        assert!((metrics.r2 - (1.0 - 2.0 / 18.0)).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_fit() {
        let metrics = regression_metrics(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.r2, 1.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(classification_metrics(&[], &[]), ClassificationMetrics::default());
        assert_eq!(regression_metrics(&[], &[]), RegressionMetrics::default());
    }
}

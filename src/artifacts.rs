//! Persistence of trained artifacts
//!
//! Every artifact is a JSON document stored as `<model_dir>/<name>.json` and
//! addressed by one of the stable names below.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::data::schema;
use crate::error::{LoanError, Result};
use crate::estimator::Estimator;

pub const ELIGIBILITY_MODEL: &str = "eligibility_model";
pub const INTEREST_MODEL: &str = "interest_model";
pub const TENURE_MODEL: &str = "tenure_model";
pub const LABEL_ENCODERS: &str = "label_encoders";
pub const TRAINING_REPORT: &str = "training_report";

/// Artifacts inference cannot run without
pub const REQUIRED_ARTIFACTS: [&str; 4] =
    [ELIGIBILITY_MODEL, INTEREST_MODEL, TENURE_MODEL, LABEL_ENCODERS];

/// Directory-backed store of named artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Required artifacts not present in the store
    pub fn missing(&self) -> Vec<&'static str> {
        REQUIRED_ARTIFACTS
            .into_iter()
            .filter(|name| !self.exists(name))
            .collect()
    }

    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)?;
        info!("Saved {} to {:?}", name, path);
        Ok(path)
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path(name);
        if !path.is_file() {
            return Err(LoanError::MissingArtifact {
                name: name.to_string(),
                path,
            });
        }

        debug!("Loading {} from {:?}", name, path);
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// A trained model together with the column layout it was fit on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact<M> {
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
    pub model: M,
}

impl<M: Estimator> ModelArtifact<M> {
    pub fn new(model: M) -> Self {
        Self {
            feature_names: schema::feature_names()
                .into_iter()
                .map(String::from)
                .collect(),
            trained_at: Utc::now(),
            model,
        }
    }

    /// Unwrap the model, rejecting artifacts fit on a different layout or
    /// carrying inconsistent parameters
    pub fn into_checked(self, name: &str) -> Result<M> {
        let expected: Vec<String> = schema::feature_names()
            .into_iter()
            .map(String::from)
            .collect();

        if self.feature_names != expected || self.model.n_features() != expected.len() {
            return Err(LoanError::SchemaMismatch {
                artifact: name.to_string(),
                expected,
                found: self.feature_names,
            });
        }
        self.model.validate()?;
        Ok(self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{EligibilityModel, InterestRateModel};
    use ndarray::Array2;

    fn tiny_model() -> InterestRateModel {
        let n = schema::FEATURE_COUNT;
        let x = Array2::from_shape_fn((4, n), |(i, j)| (i * n + j) as f64 % 7.0);
        InterestRateModel::fit(&x, &[8.0, 9.0, 10.0, 11.0]).unwrap()
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        assert_eq!(store.missing().len(), 4);
        let err = store
            .load::<serde_json::Value>(ELIGIBILITY_MODEL)
            .unwrap_err();
        assert!(matches!(err, LoanError::MissingArtifact { ref name, .. } if name == ELIGIBILITY_MODEL));
    }

    #[test]
    fn test_save_then_load_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("models"));

        let path = store.save(INTEREST_MODEL, &ModelArtifact::new(tiny_model())).unwrap();
        assert_eq!(path.file_name().unwrap(), "interest_model.json");
        assert!(store.exists(INTEREST_MODEL));

        let artifact: ModelArtifact<InterestRateModel> = store.load(INTEREST_MODEL).unwrap();
        let model = artifact.into_checked(INTEREST_MODEL).unwrap();
        let row = vec![1.0; schema::FEATURE_COUNT];
        assert!((model.predict_row(&row) - tiny_model().predict_row(&row)).abs() < 1e-9);
    }

    #[test]
    fn test_inconsistent_classifier_rejected_on_load() {
        let n = schema::FEATURE_COUNT;
        let x = Array2::from_shape_fn((4, n), |(i, j)| (i + j) as f64);
        let model = EligibilityModel::fit(&x, &[false, true, false, true]).unwrap();

        let mut json = serde_json::to_value(ModelArtifact::new(model)).unwrap();
        json["model"]["classes"] = serde_json::json!([]);
        json["model"]["class_priors"] = serde_json::json!([]);

        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(ELIGIBILITY_MODEL, &json).unwrap();

        let artifact: ModelArtifact<EligibilityModel> = store.load(ELIGIBILITY_MODEL).unwrap();
        assert!(matches!(
            artifact.into_checked(ELIGIBILITY_MODEL),
            Err(LoanError::Estimator(_))
        ));
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let mut artifact = ModelArtifact::new(tiny_model());
        artifact.feature_names.swap(0, 1);

        assert!(matches!(
            artifact.into_checked(INTEREST_MODEL),
            Err(LoanError::SchemaMismatch { .. })
        ));
    }
}

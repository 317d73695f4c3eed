//! Label encoding for categorical columns
//!
//! Each categorical column gets its own `LabelEncoder`, fit once from the
//! training labels. Codes follow sorted label order, so the same label set
//! always yields the same codes regardless of row order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{LoanError, Result};

/// Ordered bijection between the labels of one column and `0..k-1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit from every label observed in training
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();

        Self {
            classes: classes.into_iter().collect(),
        }
    }

    /// Code for a label, `None` if it was never seen during fit
    pub fn transform(&self, label: &str) -> Option<usize> {
        // classes are sorted at fit time
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .ok()
    }

    /// Known labels in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Label encoders for every categorical column, persisted as one artifact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodingRegistry {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl EncodingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the encoder for one column and return it
    ///
    /// Called once per column at training time. Refitting a column replaces its
    /// mapping, which is why inference only ever loads a persisted registry.
    pub fn fit<I, S>(&mut self, field: &str, labels: I) -> &LabelEncoder
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let encoder = LabelEncoder::fit(labels);
        self.encoders.insert(field.to_string(), encoder);
        &self.encoders[field]
    }

    /// Code previously assigned to `label` for `field`
    pub fn encode(&self, field: &str, label: &str) -> Result<usize> {
        self.encoders
            .get(field)
            .and_then(|encoder| encoder.transform(label))
            .ok_or_else(|| LoanError::UnknownCategory {
                field: field.to_string(),
                label: label.to_string(),
            })
    }

    /// Known labels for a field in code order
    pub fn labels(&self, field: &str) -> Option<&[String]> {
        self.encoders.get(field).map(LabelEncoder::classes)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.encoders.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }
}

//! CSV data loading for the training dataset

use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::record::Record;
use super::schema::{
    ColumnKind, ELIGIBLE_LABEL, NOT_ELIGIBLE_LABEL, SCHEMA_COLUMNS, TARGET_ELIGIBILITY,
    TARGET_INTEREST_RATE, TARGET_TENURE,
};
use crate::error::{LoanError, Result};

/// Training rows with their three targets
#[derive(Debug, Clone, Default)]
pub struct LoanDataset {
    pub records: Vec<Record>,
    pub eligibility: Vec<bool>,
    pub interest_rates: Vec<f64>,
    pub tenures: Vec<f64>,
}

impl LoanDataset {
    /// Load the dataset from a CSV file
    pub fn load<P: AsRef<Path>>(csv_path: P) -> Result<Self> {
        let csv_path = csv_path.as_ref();
        if !csv_path.exists() {
            return Err(LoanError::DatasetNotFound(csv_path.to_path_buf()));
        }

        info!("Loading dataset from {:?}", csv_path);
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(csv_path.to_path_buf()))?
            .finish()?;

        let dataset = Self::from_dataframe(&df)?;
        info!("Loaded {} rows", dataset.len());
        Ok(dataset)
    }

    /// Convert a DataFrame into records and targets
    ///
    /// Column names are matched after trimming surrounding whitespace. Every
    /// schema column and all three targets must be present.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let columns: HashMap<String, String> = df
            .get_column_names()
            .iter()
            .map(|name| (name.trim().to_string(), name.to_string()))
            .collect();

        let resolve = |name: &str| -> Result<&str> {
            columns
                .get(name)
                .map(String::as_str)
                .ok_or_else(|| LoanError::MissingField(name.to_string()))
        };

        // Fail on any missing column before reading values
        for (name, _) in SCHEMA_COLUMNS {
            resolve(name)?;
        }
        for target in [TARGET_ELIGIBILITY, TARGET_INTEREST_RATE, TARGET_TENURE] {
            resolve(target)?;
        }

        let height = df.height();
        let mut records = vec![Record::new(); height];

        for (name, kind) in SCHEMA_COLUMNS {
            let column = df.column(resolve(name)?)?;
            match kind {
                ColumnKind::Numeric => {
                    let values = numeric_column(column, name)?;
                    for (record, value) in records.iter_mut().zip(values) {
                        record.insert(name, value);
                    }
                }
                ColumnKind::Categorical => {
                    let values = label_column(column, name)?;
                    for (record, value) in records.iter_mut().zip(values) {
                        record.insert(name, value);
                    }
                }
            }
            debug!("Read column {}", name);
        }

        let eligibility = label_column(df.column(resolve(TARGET_ELIGIBILITY)?)?, TARGET_ELIGIBILITY)?
            .into_iter()
            .map(|label| parse_eligibility(&label))
            .collect::<Result<Vec<bool>>>()?;

        let interest_rates = numeric_column(
            df.column(resolve(TARGET_INTEREST_RATE)?)?,
            TARGET_INTEREST_RATE,
        )?;
        let tenures = numeric_column(df.column(resolve(TARGET_TENURE)?)?, TARGET_TENURE)?;

        Ok(Self {
            records,
            eligibility,
            interest_rates,
            tenures,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All labels of a categorical column, in row order
    pub fn labels<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.records
            .iter()
            .filter_map(move |record| record.label(column).ok())
    }

    /// Subset of rows by index, preserving the given order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
            eligibility: indices.iter().map(|&i| self.eligibility[i]).collect(),
            interest_rates: indices.iter().map(|&i| self.interest_rates[i]).collect(),
            tenures: indices.iter().map(|&i| self.tenures[i]).collect(),
        }
    }
}

/// Map the eligibility target label to a boolean
pub fn parse_eligibility(label: &str) -> Result<bool> {
    match label {
        ELIGIBLE_LABEL => Ok(true),
        NOT_ELIGIBLE_LABEL => Ok(false),
        other => Err(LoanError::UnknownCategory {
            field: TARGET_ELIGIBILITY.to_string(),
            label: other.to_string(),
        }),
    }
}

fn numeric_column(column: &Column, name: &str) -> Result<Vec<f64>> {
    let casted = column.cast(&DataType::Float64)?;
    let values = casted.f64()?;

    (0..values.len())
        .map(|i| {
            values
                .get(i)
                .ok_or_else(|| LoanError::MissingField(format!("{} (row {})", name, i + 1)))
        })
        .collect()
}

fn label_column(column: &Column, name: &str) -> Result<Vec<String>> {
    let casted = column.cast(&DataType::String)?;
    let values = casted.str()?;

    (0..values.len())
        .map(|i| {
            values
                .get(i)
                .map(|s| s.to_string())
                .ok_or_else(|| LoanError::MissingField(format!("{} (row {})", name, i + 1)))
        })
        .collect()
}

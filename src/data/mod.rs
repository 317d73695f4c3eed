//! Data loading, encoding and feature preparation

pub mod dataset;
pub mod encoding;
pub mod features;
pub mod record;
pub mod schema;

// Re-export commonly used types
pub use dataset::LoanDataset;
pub use encoding::{EncodingRegistry, LabelEncoder};
pub use features::{DerivedFeatures, FeaturePipeline, FeatureVector};
pub use record::{FieldValue, Record};

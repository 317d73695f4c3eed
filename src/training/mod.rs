//! Model training and hold-out evaluation

pub mod metrics;
pub mod trainer;

pub use metrics::{classification_metrics, regression_metrics, ClassificationMetrics, RegressionMetrics};
pub use trainer::{TrainedModels, Trainer, TrainingConfig, TrainingReport};

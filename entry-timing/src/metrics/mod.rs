//! Model quality and summary metrics.
//!
//! - Accuracy, Brier score, log-loss for the classifier
//! - Mean absolute error for the uplift regressor
//! - Mean / median / positive fraction for report summaries

pub mod calculator;

pub use calculator::{CalibrationComparison, ClassificationMetrics, MetricsCalculator};

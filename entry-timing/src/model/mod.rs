//! Leak-free modeling stack.
//!
//! Schema, scaler, segmented models, calibration and threshold are all
//! fitted from the slices they are given and nothing else.

pub mod artifact;
pub mod calibration;
pub mod linear;
pub mod schema;
pub mod segmented;

pub use artifact::{score_rows, ModelArtifact, ScoredRows};
pub use calibration::{PlattScaler, ThresholdSweep};
pub use linear::{fit_logistic, fit_ridge, sigmoid, LinearModel};
pub use schema::{FeatureSchema, ScalerStats, Vocabulary};
pub use segmented::{quantile, Prediction, SegmentModel, SegmentSummary, SegmentedModel, WinsorBounds};

//! Walk-forward evaluation.
//!
//! Slides a fixed train/valid/test window over the sorted rows:
//! - Train: 1400 rows (schema, scaler, segmented models)
//! - Valid: 300 rows (Platt scaling, threshold)
//! - Test: 250 rows (held-out decision metrics)
//! - Stride: 150 rows

pub mod runner;
pub mod windows;

pub use runner::{WalkForwardReport, WalkForwardRunner, WalkForwardSummary, WindowResult};
pub use windows::{WalkForwardWindow, WalkForwardWindows};

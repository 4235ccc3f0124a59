//! Single chronological train / valid / test run.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PipelineConfig;
use crate::data::ModelRow;
use crate::metrics::CalibrationComparison;
use crate::model::{ModelArtifact, SegmentSummary, WinsorBounds};

use super::evaluator::{evaluate, DecisionMetrics, OracleBound};
use super::pipeline::{
    calibration_comparison, regression_mae, reward_targets, train_policy, PipelineError,
};

/// Row counts for one slice of the split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceCounts {
    /// All rows in the slice
    pub rows: usize,
    /// Uncensored rows with a target
    pub trainable: usize,
}

impl SliceCounts {
    fn of(rows: &[ModelRow]) -> Self {
        Self {
            rows: rows.len(),
            trainable: rows.iter().filter(|r| r.is_trainable()).count(),
        }
    }
}

/// What was fitted, and how well it fits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelReport {
    pub train: SliceCounts,
    pub valid: SliceCounts,
    pub test: SliceCounts,
    /// Row minimum a segment needed for its own models
    pub min_segment_rows: usize,
    /// Winsorization bounds of the global regressor
    pub global_bounds: WinsorBounds,
    /// Segments with their own models
    pub segments: Vec<SegmentSummary>,
    /// Platt slope
    pub platt_a: f64,
    /// Platt intercept
    pub platt_b: f64,
    /// Raw vs calibrated classifier quality on validation
    pub validation_classification: CalibrationComparison,
    /// Raw vs calibrated classifier quality on test
    pub test_classification: CalibrationComparison,
    /// Uplift regressor MAE on validation
    pub validation_mae: Option<f64>,
    /// Uplift regressor MAE on test
    pub test_mae: Option<f64>,
}

/// Threshold selection and held-out decision metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    /// Every grid threshold on the validation slice, in grid order
    pub validation_sweep: Vec<DecisionMetrics>,
    /// Tuned threshold
    pub threshold: f64,
    /// Test metrics at the tuned threshold
    pub test: DecisionMetrics,
    /// Every grid threshold on the test slice, for transparency only.
    pub test_sweep: Vec<DecisionMetrics>,
    /// Perfect-foresight bound on the test slice
    pub oracle: OracleBound,
}

/// Everything a single-split run produces.
#[derive(Debug, Clone)]
pub struct SingleSplitOutput {
    pub model_report: ModelReport,
    pub artifact: ModelArtifact,
    pub backtest_report: BacktestReport,
}

/// Split chronologically sorted rows by position.
pub fn split_by_fraction(rows: &[ModelRow], train_fraction: f64, valid_fraction: f64) -> (&[ModelRow], &[ModelRow], &[ModelRow]) {
    let n = rows.len();
    let n_train = ((n as f64 * train_fraction).floor() as usize).min(n);
    let n_valid = ((n as f64 * valid_fraction).floor() as usize).min(n - n_train);
    let (train, rest) = rows.split_at(n_train);
    let (valid, test) = rest.split_at(n_valid);
    (train, valid, test)
}

/// Run the single-split pipeline. `rows` must be sorted by timestamp.
pub fn run_single_split(rows: &[ModelRow], config: &PipelineConfig) -> Result<SingleSplitOutput, PipelineError> {
    config.validate()?;
    let (train, valid, test) = split_by_fraction(rows, config.split.train_fraction, config.split.valid_fraction);
    info!(
        train = train.len(),
        valid = valid.len(),
        test = test.len(),
        "Single split"
    );

    let policy = train_policy(train, valid, config, config.split.min_segment_rows)?;
    let artifact = policy.artifact;

    let valid_scores = artifact.score(valid);
    let test_scores = artifact.score(test);

    let test_targets = reward_targets(test);
    let test_metrics = evaluate(&test_scores.probabilities, &test_targets, artifact.threshold);
    let test_sweep = config
        .calibration
        .threshold_grid
        .iter()
        .map(|t| evaluate(&test_scores.probabilities, &test_targets, *t))
        .collect();

    info!(
        threshold = artifact.threshold,
        segments = artifact.model.segments.len(),
        test_mean_pnl = test_metrics.mean_relative_pnl,
        test_total_pnl = test_metrics.total_relative_pnl,
        "Single split complete"
    );

    let model_report = ModelReport {
        train: SliceCounts::of(train),
        valid: SliceCounts::of(valid),
        test: SliceCounts::of(test),
        min_segment_rows: artifact.min_segment_rows,
        global_bounds: artifact.model.global.bounds,
        segments: artifact.model.segment_summaries(),
        platt_a: artifact.platt.a,
        platt_b: artifact.platt.b,
        validation_classification: calibration_comparison(valid, &valid_scores),
        test_classification: calibration_comparison(test, &test_scores),
        validation_mae: regression_mae(valid, &valid_scores),
        test_mae: regression_mae(test, &test_scores),
    };

    let backtest_report = BacktestReport {
        validation_sweep: policy.validation.sweep,
        threshold: artifact.threshold,
        oracle: test_metrics.oracle,
        test: test_metrics,
        test_sweep,
    };

    Ok(SingleSplitOutput {
        model_report,
        artifact,
        backtest_report,
    })
}

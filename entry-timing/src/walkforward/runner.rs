//! Walk-forward policy evaluation.
//!
//! Each window refits schema, scaler, models, calibration and threshold from
//! its own train/valid slices and scores its own test slice. Windows share
//! nothing but read access to the sorted row set, so they run in parallel
//! and are collected back in window order.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backtest::{evaluate_policy, train_policy, DecisionMetrics, PipelineError};
use crate::config::{PipelineConfig, WalkForwardConfig};
use crate::data::{format_timestamp_ms, ModelRow};
use crate::metrics::MetricsCalculator;

use super::windows::{WalkForwardWindow, WalkForwardWindows};

/// Result of one evaluated window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowResult {
    /// 1-indexed over evaluated windows.
    pub window_index: usize,
    /// Timestamp of the first row in the window (ISO-8601)
    pub start_ts: String,
    /// Timestamp of the last row in the window (ISO-8601)
    pub end_ts: String,
    /// Row offset of the window in the sorted dataset
    pub start_row: usize,
    /// Trainable rows in each slice
    pub train_rows: usize,
    pub valid_rows: usize,
    pub test_rows: usize,
    /// Segments that got their own models
    pub segments: usize,
    /// Threshold tuned on the validation slice
    pub threshold: f64,
    /// Mean relative PnL of that threshold on validation
    pub validation_best_mean_pnl: f64,
    /// Decision metrics on the test slice
    pub test: DecisionMetrics,
}

/// Aggregate over evaluated windows. Statistics are `None` when no window
/// was evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkForwardSummary {
    /// Windows that fit in the dataset
    pub candidate_windows: usize,
    pub evaluated_windows: usize,
    /// Windows dropped for too few labeled rows
    pub skipped_windows: usize,
    /// Mean of per-window total relative PnL
    pub mean_total_relative_pnl: Option<f64>,
    /// Median of per-window total relative PnL
    pub median_total_relative_pnl: Option<f64>,
    /// Fraction of windows with total relative PnL above zero
    pub positive_window_fraction: Option<f64>,
    /// Mean of per-window oracle totals
    pub mean_oracle_total: Option<f64>,
    pub mean_threshold: Option<f64>,
}

impl WalkForwardSummary {
    fn from_windows(candidate_windows: usize, windows: &[WindowResult]) -> Self {
        let totals: Vec<f64> = windows.iter().map(|w| w.test.total_relative_pnl).collect();
        let oracle: Vec<f64> = windows.iter().map(|w| w.test.oracle.total_relative_pnl).collect();
        let thresholds: Vec<f64> = windows.iter().map(|w| w.threshold).collect();
        Self {
            candidate_windows,
            evaluated_windows: windows.len(),
            skipped_windows: candidate_windows - windows.len(),
            mean_total_relative_pnl: MetricsCalculator::mean(&totals),
            median_total_relative_pnl: MetricsCalculator::median(&totals),
            positive_window_fraction: MetricsCalculator::positive_fraction(&totals),
            mean_oracle_total: MetricsCalculator::mean(&oracle),
            mean_threshold: MetricsCalculator::mean(&thresholds),
        }
    }
}

/// Complete walk-forward report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardReport {
    /// Window sizes and minimums used for the run
    pub config: WalkForwardConfig,
    pub summary: WalkForwardSummary,
    /// Evaluated windows in chronological order
    pub windows: Vec<WindowResult>,
}

impl WalkForwardReport {
    /// One-line-per-field summary for logs.
    pub fn summary_text(&self) -> String {
        let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v));
        format!(
            "Walk-Forward Results: {} of {} windows evaluated\n\
             Mean total relative PnL: {}\n\
             Median total relative PnL: {}\n\
             Positive windows: {}\n\
             Mean oracle total: {}",
            self.summary.evaluated_windows,
            self.summary.candidate_windows,
            fmt(self.summary.mean_total_relative_pnl),
            fmt(self.summary.median_total_relative_pnl),
            fmt(self.summary.positive_window_fraction),
            fmt(self.summary.mean_oracle_total),
        )
    }
}

/// Walk-forward runner
pub struct WalkForwardRunner {
    config: PipelineConfig,
}

impl WalkForwardRunner {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run every window over rows sorted by timestamp.
    pub fn run(&self, rows: &[ModelRow]) -> Result<WalkForwardReport, PipelineError> {
        self.config.validate()?;
        let wf = &self.config.walk_forward;
        let windows = WalkForwardWindows::new(wf, rows.len()).generate();
        info!(
            rows = rows.len(),
            windows = windows.len(),
            size = wf.window_size(),
            stride = wf.stride,
            "Generated walk-forward windows"
        );

        let progress = AtomicUsize::new(0);
        let total = windows.len();

        let outcomes: Vec<Option<WindowResult>> = windows
            .par_iter()
            .map(|window| {
                let outcome = self.run_window(rows, window);
                let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
                if done % (total / 10).max(1) == 0 || done == total {
                    info!("  Walk-forward: {}/{} windows", done, total);
                }
                outcome
            })
            .collect::<Result<_, _>>()?;

        let results: Vec<WindowResult> = outcomes
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(i, mut result)| {
                result.window_index = i + 1;
                result
            })
            .collect();

        let summary = WalkForwardSummary::from_windows(windows.len(), &results);
        info!(
            evaluated = summary.evaluated_windows,
            skipped = summary.skipped_windows,
            mean_total_pnl = ?summary.mean_total_relative_pnl,
            "Walk-forward complete"
        );

        Ok(WalkForwardReport {
            config: wf.clone(),
            summary,
            windows: results,
        })
    }

    /// `Ok(None)` when the window is skipped for lack of data.
    fn run_window(&self, rows: &[ModelRow], window: &WalkForwardWindow) -> Result<Option<WindowResult>, PipelineError> {
        let wf = &self.config.walk_forward;
        let trainable = |range: std::ops::Range<usize>| -> Vec<ModelRow> {
            rows[range].iter().filter(|r| r.is_trainable()).cloned().collect()
        };
        let train = trainable(window.train.clone());
        let valid = trainable(window.valid.clone());
        let test = trainable(window.test.clone());

        if train.len() < wf.min_train_rows || valid.len() < wf.min_valid_rows || test.len() < wf.min_test_rows {
            debug!(
                window = window.candidate_num,
                train = train.len(),
                valid = valid.len(),
                test = test.len(),
                "Skipping window with too few labeled rows"
            );
            return Ok(None);
        }

        let policy = match train_policy(&train, &valid, &self.config, wf.min_segment_rows) {
            Ok(policy) => policy,
            Err(PipelineError::InsufficientData(reason)) => {
                warn!(window = window.candidate_num, %reason, "Skipping window");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let test_metrics = evaluate_policy(&policy.artifact, &test);

        debug!(
            window = window.candidate_num,
            threshold = policy.artifact.threshold,
            test_total_pnl = test_metrics.total_relative_pnl,
            "Window complete"
        );

        Ok(Some(WindowResult {
            window_index: 0,
            start_ts: format_timestamp_ms(rows[window.start].ts_ms),
            end_ts: format_timestamp_ms(rows[window.end() - 1].ts_ms),
            start_row: window.start,
            train_rows: train.len(),
            valid_rows: valid.len(),
            test_rows: test.len(),
            segments: policy.artifact.model.segments.len(),
            threshold: policy.artifact.threshold,
            validation_best_mean_pnl: policy.validation.best.mean_relative_pnl,
            test: test_metrics,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::pipeline::fixtures::synthetic_rows;

    fn small_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.walk_forward = WalkForwardConfig {
            train_count: 200,
            valid_count: 60,
            test_count: 60,
            stride: 50,
            min_train_rows: 150,
            min_valid_rows: 40,
            min_test_rows: 40,
            min_segment_rows: 40,
        };
        config
    }

    #[test]
    fn test_walk_forward_report() {
        let rows = synthetic_rows(470);
        let report = WalkForwardRunner::new(small_config()).run(&rows).unwrap();

        // (470 - 320) / 50 + 1
        assert_eq!(report.summary.candidate_windows, 4);
        assert_eq!(report.summary.evaluated_windows, 4);
        assert_eq!(report.summary.skipped_windows, 0);

        let indices: Vec<usize> = report.windows.iter().map(|w| w.window_index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        let starts: Vec<usize> = report.windows.iter().map(|w| w.start_row).collect();
        assert_eq!(starts, vec![0, 50, 100, 150]);
        assert!(report.windows[0].start_ts.ends_with('Z'));
        assert!(report.windows[0].start_ts < report.windows[0].end_ts);

        let positive = report.windows.iter().filter(|w| w.test.total_relative_pnl > 0.0).count();
        assert_eq!(
            report.summary.positive_window_fraction,
            Some(positive as f64 / 4.0)
        );
        assert!(report.summary.mean_total_relative_pnl.is_some());
        assert!(report.summary.median_total_relative_pnl.is_some());
    }

    #[test]
    fn test_windows_without_enough_rows_are_skipped() {
        let mut rows = synthetic_rows(700);
        // Censor the first window's whole test slice.
        for row in rows[260..320].iter_mut() {
            row.censored = true;
            row.target = None;
            row.buy_now = None;
        }
        let mut config = small_config();
        config.walk_forward.stride = 320;
        let report = WalkForwardRunner::new(config).run(&rows).unwrap();

        assert_eq!(report.summary.candidate_windows, 2);
        assert_eq!(report.summary.skipped_windows, 1);
        assert_eq!(report.summary.evaluated_windows, 1);
        assert_eq!(report.windows[0].window_index, 1);
        assert_eq!(report.windows[0].start_row, 320);
    }

    #[test]
    fn test_no_windows() {
        let rows = synthetic_rows(100);
        let report = WalkForwardRunner::new(small_config()).run(&rows).unwrap();
        assert_eq!(report.summary, WalkForwardSummary::default());
        assert!(report.windows.is_empty());
        assert!(report.summary_text().contains("0 of 0"));
    }

    #[test]
    fn test_parallel_run_is_deterministic() {
        let rows = synthetic_rows(470);
        let runner = WalkForwardRunner::new(small_config());
        assert_eq!(runner.run(&rows).unwrap(), runner.run(&rows).unwrap());
    }
}

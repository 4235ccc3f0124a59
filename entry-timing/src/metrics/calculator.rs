//! Model quality metrics calculator.
//!
//! Classification quality for the buy-now classifier (accuracy, Brier score,
//! log-loss) and regression error for the uplift model, plus the summary
//! statistics shared by the label and walk-forward reports.

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median};

/// Probabilities are clamped into `[EPS, 1 - EPS]` before taking logs.
const LOG_LOSS_EPS: f64 = 1e-12;

/// Quality of a probabilistic binary classifier on one slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationMetrics {
    pub rows: usize,
    pub positive_rate: f64,
    /// Accuracy at a 0.5 cut.
    pub accuracy: f64,
    pub brier: f64,
    pub log_loss: f64,
}

/// Raw versus calibrated probabilities on the same slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationComparison {
    pub raw: ClassificationMetrics,
    pub calibrated: ClassificationMetrics,
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Classification metrics over paired probabilities and labels.
    pub fn classification(probabilities: &[f64], labels: &[bool]) -> ClassificationMetrics {
        let n = probabilities.len().min(labels.len());
        if n == 0 {
            return ClassificationMetrics::default();
        }

        let pairs = probabilities.iter().zip(labels).take(n);
        let mut positives = 0usize;
        let mut correct = 0usize;
        let mut brier = 0.0;
        let mut log_loss = 0.0;
        for (&p, &label) in pairs {
            let y = if label { 1.0 } else { 0.0 };
            if label {
                positives += 1;
            }
            if (p >= 0.5) == label {
                correct += 1;
            }
            brier += (p - y).powi(2);
            let clamped = p.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
            log_loss -= y * clamped.ln() + (1.0 - y) * (1.0 - clamped).ln();
        }

        let n_f = n as f64;
        ClassificationMetrics {
            rows: n,
            positive_rate: positives as f64 / n_f,
            accuracy: correct as f64 / n_f,
            brier: brier / n_f,
            log_loss: log_loss / n_f,
        }
    }

    /// Mean absolute error; `None` on empty input.
    pub fn mae(predictions: &[f64], targets: &[f64]) -> Option<f64> {
        let n = predictions.len().min(targets.len());
        if n == 0 {
            return None;
        }
        let total: f64 = predictions
            .iter()
            .zip(targets)
            .map(|(p, t)| (p - t).abs())
            .sum();
        Some(total / n as f64)
    }

    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    pub fn median(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(Data::new(values.to_vec()).median())
    }

    /// Share of values strictly above zero.
    pub fn positive_fraction(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let positive = values.iter().filter(|v| **v > 0.0).count();
        Some(positive as f64 / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_classification_metrics() {
        let probs = [0.9, 0.2, 0.6, 0.4];
        let labels = [true, false, false, true];
        let m = MetricsCalculator::classification(&probs, &labels);

        assert_eq!(m.rows, 4);
        assert_relative_eq!(m.positive_rate, 0.5);
        assert_relative_eq!(m.accuracy, 0.5);
        // (0.01 + 0.04 + 0.36 + 0.36) / 4
        assert_relative_eq!(m.brier, 0.1925, epsilon = 1e-12);
        let expected_ll = -(0.9f64.ln() + 0.8f64.ln() + 0.4f64.ln() + 0.4f64.ln()) / 4.0;
        assert_relative_eq!(m.log_loss, expected_ll, epsilon = 1e-12);
    }

    #[test]
    fn test_log_loss_survives_extreme_probabilities() {
        let m = MetricsCalculator::classification(&[0.0, 1.0], &[true, false]);
        assert!(m.log_loss.is_finite());
        assert_relative_eq!(m.brier, 1.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(MetricsCalculator::classification(&[], &[]), ClassificationMetrics::default());
        assert_eq!(MetricsCalculator::mae(&[], &[]), None);
        assert_eq!(MetricsCalculator::mean(&[]), None);
        assert_eq!(MetricsCalculator::median(&[]), None);
        assert_eq!(MetricsCalculator::positive_fraction(&[]), None);
    }

    #[test]
    fn test_summary_statistics() {
        assert_relative_eq!(MetricsCalculator::mae(&[1.0, 2.0], &[2.0, 0.0]).unwrap(), 1.5);
        assert_relative_eq!(MetricsCalculator::mean(&[1.0, 2.0, 6.0]).unwrap(), 3.0);
        assert_relative_eq!(MetricsCalculator::median(&[5.0, 1.0, 3.0]).unwrap(), 3.0);
        assert_relative_eq!(MetricsCalculator::median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert_relative_eq!(MetricsCalculator::positive_fraction(&[1.0, 0.0, -2.0, 3.0]).unwrap(), 0.5);
    }
}

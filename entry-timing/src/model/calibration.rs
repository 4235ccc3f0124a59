//! Platt scaling and decision-threshold tuning.
//!
//! Both are fitted on the validation slice only.

use serde::{Deserialize, Serialize};

use crate::backtest::evaluator::{evaluate, DecisionMetrics};
use crate::config::GradientDescentParams;

use super::linear::sigmoid;

/// `p = sigmoid(a * logit + b)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaler {
    pub a: f64,
    pub b: f64,
}

impl Default for PlattScaler {
    fn default() -> Self {
        Self { a: 1.0, b: 0.0 }
    }
}

impl PlattScaler {
    /// Minimise `mean(logloss) + l2 * ((a - 1)^2 + b^2)` from the identity map.
    pub fn fit(logits: &[f64], labels: &[bool], params: &GradientDescentParams) -> Self {
        let mut scaler = Self::default();
        let n = logits.len().min(labels.len());
        if n == 0 {
            return scaler;
        }
        let n_f = n as f64;

        for _ in 0..params.epochs {
            let (mut grad_a, mut grad_b) = (0.0, 0.0);
            for (z, &label) in logits.iter().zip(labels).take(n) {
                let y = if label { 1.0 } else { 0.0 };
                let err = scaler.calibrate(*z) - y;
                grad_a += err * z;
                grad_b += err;
            }
            grad_a = grad_a / n_f + 2.0 * params.l2 * (scaler.a - 1.0);
            grad_b = grad_b / n_f + 2.0 * params.l2 * scaler.b;
            scaler.a -= params.learning_rate * grad_a;
            scaler.b -= params.learning_rate * grad_b;
        }
        scaler
    }

    pub fn calibrate(&self, logit: f64) -> f64 {
        sigmoid(self.a * logit + self.b)
    }

    pub fn calibrate_all(&self, logits: &[f64]) -> Vec<f64> {
        logits.iter().map(|z| self.calibrate(*z)).collect()
    }
}

/// Decision metrics for every grid threshold plus the winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSweep {
    /// In grid order.
    pub sweep: Vec<DecisionMetrics>,
    pub best: DecisionMetrics,
}

impl ThresholdSweep {
    /// Evaluate the grid; `None` when the grid is empty.
    pub fn run(probabilities: &[f64], targets: &[Option<f64>], grid: &[f64]) -> Option<Self> {
        let sweep: Vec<DecisionMetrics> = grid
            .iter()
            .map(|t| evaluate(probabilities, targets, *t))
            .collect();

        let mut ranked = sweep.clone();
        // Stable: equal rewards keep grid order.
        ranked.sort_by(|a, b| b.mean_relative_pnl.total_cmp(&a.mean_relative_pnl));
        let best = ranked.into_iter().next()?;
        Some(Self { sweep, best })
    }

    pub fn threshold(&self) -> f64 {
        self.best.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params() -> GradientDescentParams {
        GradientDescentParams {
            learning_rate: 0.05,
            epochs: 500,
            l2: 1e-4,
        }
    }

    #[test]
    fn test_platt_defaults_to_identity() {
        let scaler = PlattScaler::fit(&[], &[], &params());
        assert_eq!(scaler, PlattScaler::default());
        assert_relative_eq!(scaler.calibrate(0.0), 0.5);
    }

    #[test]
    fn test_platt_shrinks_overconfident_logits() {
        // Logits are far too confident for a coin-flip outcome.
        let logits: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 4.0 } else { -4.0 }).collect();
        let labels: Vec<bool> = (0..40).map(|i| i % 4 < 2).collect();
        let scaler = PlattScaler::fit(&logits, &labels, &params());
        assert!(scaler.a < 1.0);
        assert!(scaler.calibrate(4.0) < sigmoid(4.0));
    }

    #[test]
    fn test_platt_learns_offset() {
        let logits = vec![0.0; 20];
        let labels: Vec<bool> = (0..20).map(|i| i < 15).collect();
        let scaler = PlattScaler::fit(&logits, &labels, &params());
        assert!(scaler.b > 0.0);
        assert!(scaler.calibrate(0.0) > 0.5);
    }

    #[test]
    fn test_sweep_picks_best_mean_pnl() {
        let probs = [0.38, 0.42, 0.52, 0.62];
        let targets = [Some(-3.0), Some(4.0), Some(2.0), Some(-1.0)];
        let grid = [0.35, 0.45, 0.55, 0.65];
        let sweep = ThresholdSweep::run(&probs, &targets, &grid).unwrap();

        assert_eq!(sweep.sweep.len(), 4);
        // 0.55 waits on rows 0,1,2: (-3 + 4 + 2) / 4
        // 0.65 waits on all rows: (-3 + 4 + 2 - 1) / 4
        assert_relative_eq!(sweep.sweep[2].mean_relative_pnl, 0.75);
        assert_relative_eq!(sweep.sweep[3].mean_relative_pnl, 0.5);
        assert_relative_eq!(sweep.threshold(), 0.55);
    }

    #[test]
    fn test_sweep_ties_keep_lowest_threshold() {
        let probs = [0.9, 0.95];
        let targets = [Some(1.0), Some(2.0)];
        let sweep = ThresholdSweep::run(&probs, &targets, &[0.35, 0.5, 0.65]).unwrap();
        assert_relative_eq!(sweep.threshold(), 0.35);
        assert!(ThresholdSweep::run(&probs, &targets, &[]).is_none());
    }
}

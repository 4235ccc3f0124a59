//! Buy-now / wait decision evaluation.
//!
//! Reward is relative to always buying now: a `buy_now` decision earns 0, a
//! `wait` decision earns the realised policy-window uplift. Rows without a
//! target are counted but not rewarded.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    BuyNow,
    Wait,
}

impl Decision {
    /// `buy_now` iff `probability >= threshold`.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Self::BuyNow
        } else {
            Self::Wait
        }
    }

    /// Relative PnL versus buying now.
    pub fn reward(&self, target: Option<f64>) -> Option<f64> {
        let target = target?;
        Some(match self {
            Self::BuyNow => 0.0,
            Self::Wait => target,
        })
    }
}

/// Perfect-foresight bound: wait exactly when waiting pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleBound {
    /// Rows with a target
    pub rows: usize,
    /// Mean of `max(0, target)`
    pub mean_relative_pnl: f64,
    /// Sum of `max(0, target)`
    pub total_relative_pnl: f64,
}

impl OracleBound {
    pub fn from_targets(targets: &[Option<f64>]) -> Self {
        let rewards: Vec<f64> = targets.iter().flatten().map(|t| t.max(0.0)).collect();
        let total: f64 = rewards.iter().sum();
        Self {
            rows: rewards.len(),
            mean_relative_pnl: if rewards.is_empty() { 0.0 } else { total / rewards.len() as f64 },
            total_relative_pnl: total,
        }
    }
}

/// Outcome of applying one threshold to a slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionMetrics {
    /// Buy now at or above this calibrated probability
    pub threshold: f64,
    /// All rows, rewarded or not
    pub rows: usize,
    /// Rows with a target, i.e. contributing to reward.
    pub rewarded_rows: usize,
    /// Share of rows decided buy-now
    pub buy_rate: f64,
    /// Share of rows decided wait
    pub wait_rate: f64,
    /// Mean reward over rewarded rows
    pub mean_relative_pnl: f64,
    /// Total reward over rewarded rows
    pub total_relative_pnl: f64,
    /// Perfect-foresight bound on the same rows
    pub oracle: OracleBound,
}

pub fn decide(probabilities: &[f64], threshold: f64) -> Vec<Decision> {
    probabilities
        .iter()
        .map(|p| Decision::from_probability(*p, threshold))
        .collect()
}

/// Decision metrics for calibrated probabilities against realised targets.
pub fn evaluate(probabilities: &[f64], targets: &[Option<f64>], threshold: f64) -> DecisionMetrics {
    let decisions = decide(probabilities, threshold);
    let rows = decisions.len().min(targets.len());
    if rows == 0 {
        return DecisionMetrics {
            threshold,
            ..Default::default()
        };
    }

    let buys = decisions.iter().take(rows).filter(|d| **d == Decision::BuyNow).count();
    let rewards: Vec<f64> = decisions
        .iter()
        .zip(targets)
        .filter_map(|(d, t)| d.reward(*t))
        .collect();
    let total: f64 = rewards.iter().sum();

    DecisionMetrics {
        threshold,
        rows,
        rewarded_rows: rewards.len(),
        buy_rate: buys as f64 / rows as f64,
        wait_rate: (rows - buys) as f64 / rows as f64,
        mean_relative_pnl: if rewards.is_empty() { 0.0 } else { total / rewards.len() as f64 },
        total_relative_pnl: total,
        oracle: OracleBound::from_targets(&targets[..rows]),
    }
}

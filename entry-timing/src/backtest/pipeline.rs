//! Fit → calibrate → tune → evaluate, shared by the single-split and
//! walk-forward paths. The two paths differ only in how they slice rows and
//! which minimum segment size they pass in.

use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, PipelineConfig};
use crate::data::ModelRow;
use crate::metrics::{CalibrationComparison, MetricsCalculator};
use crate::model::{
    score_rows, FeatureSchema, ModelArtifact, PlattScaler, ScoredRows, SegmentedModel, ThresholdSweep,
};

use super::evaluator::{evaluate, DecisionMetrics};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Artifact plus the validation evidence used to build it.
#[derive(Debug, Clone)]
pub struct TrainedPolicy {
    pub artifact: ModelArtifact,
    pub validation: ThresholdSweep,
}

/// Targets as the evaluator expects them; censored rows carry none.
pub fn reward_targets(rows: &[ModelRow]) -> Vec<Option<f64>> {
    rows.iter()
        .map(|r| if r.censored { None } else { r.target })
        .collect()
}

/// Fit schema and models on `train`, then calibrate and tune on `valid`.
pub fn train_policy(
    train: &[ModelRow],
    valid: &[ModelRow],
    config: &PipelineConfig,
    min_segment_rows: usize,
) -> Result<TrainedPolicy, PipelineError> {
    let trainable: Vec<ModelRow> = train.iter().filter(|r| r.is_trainable()).cloned().collect();
    if trainable.is_empty() {
        return Err(PipelineError::InsufficientData(
            "training slice has no uncensored rows with a target".into(),
        ));
    }

    let schema = FeatureSchema::fit(&trainable, config.features.std_epsilon);
    let model = SegmentedModel::fit(&trainable, &schema, &config.training, min_segment_rows)
        .ok_or_else(|| PipelineError::InsufficientData("no trainable rows for the global model".into()))?;

    let identity = PlattScaler::default();
    let raw_valid = score_rows(&schema, &model, &identity, valid);
    let (logits, labels) = labeled_logits(valid, &raw_valid);
    let platt = PlattScaler::fit(&logits, &labels, &config.calibration.platt);

    let probabilities = platt.calibrate_all(&raw_valid.logits);
    let validation = ThresholdSweep::run(&probabilities, &reward_targets(valid), &config.calibration.threshold_grid)
        .ok_or_else(|| PipelineError::InsufficientData("threshold grid is empty".into()))?;

    debug!(
        train_rows = trainable.len(),
        valid_rows = valid.len(),
        a = platt.a,
        b = platt.b,
        threshold = validation.threshold(),
        "Trained policy"
    );

    Ok(TrainedPolicy {
        artifact: ModelArtifact {
            schema,
            model,
            min_segment_rows,
            platt,
            threshold: validation.threshold(),
        },
        validation,
    })
}

/// Logits and buy-now labels for rows that have a label.
fn labeled_logits(rows: &[ModelRow], scored: &ScoredRows) -> (Vec<f64>, Vec<bool>) {
    rows.iter()
        .zip(&scored.logits)
        .filter(|(r, _)| !r.censored)
        .filter_map(|(r, z)| r.buy_now.map(|label| (*z, label)))
        .unzip()
}

/// Decision metrics for `rows` at the artifact's tuned threshold.
pub fn evaluate_policy(artifact: &ModelArtifact, rows: &[ModelRow]) -> DecisionMetrics {
    let scored = artifact.score(rows);
    evaluate(&scored.probabilities, &reward_targets(rows), artifact.threshold)
}

/// Raw versus calibrated classifier quality, over labeled rows.
pub fn calibration_comparison(rows: &[ModelRow], scored: &ScoredRows) -> CalibrationComparison {
    let mut raw = Vec::new();
    let mut calibrated = Vec::new();
    let mut labels = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if row.censored {
            continue;
        }
        if let Some(label) = row.buy_now {
            raw.push(scored.raw_probabilities[i]);
            calibrated.push(scored.probabilities[i]);
            labels.push(label);
        }
    }
    CalibrationComparison {
        raw: MetricsCalculator::classification(&raw, &labels),
        calibrated: MetricsCalculator::classification(&calibrated, &labels),
    }
}

/// MAE of the uplift regressor over rows with a target.
pub fn regression_mae(rows: &[ModelRow], scored: &ScoredRows) -> Option<f64> {
    let (predictions, targets): (Vec<f64>, Vec<f64>) = rows
        .iter()
        .zip(&scored.uplifts)
        .filter(|(r, _)| r.is_trainable())
        .filter_map(|(r, u)| r.target.map(|t| (*u, t)))
        .unzip();
    MetricsCalculator::mae(&predictions, &targets)
}

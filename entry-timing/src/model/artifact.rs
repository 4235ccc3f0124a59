//! Serialisable model bundle.

use serde::{Deserialize, Serialize};

use crate::data::ModelRow;

use super::calibration::PlattScaler;
use super::linear::sigmoid;
use super::schema::FeatureSchema;
use super::segmented::SegmentedModel;

/// Everything needed to score rows, built once per training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelArtifact {
    pub schema: FeatureSchema,
    pub model: SegmentedModel,
    pub min_segment_rows: usize,
    pub platt: PlattScaler,
    pub threshold: f64,
}

/// Model outputs for a slice of rows, index-aligned with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredRows {
    pub logits: Vec<f64>,
    pub raw_probabilities: Vec<f64>,
    pub probabilities: Vec<f64>,
    pub uplifts: Vec<f64>,
}

impl ModelArtifact {
    pub fn score(&self, rows: &[ModelRow]) -> ScoredRows {
        score_rows(&self.schema, &self.model, &self.platt, rows)
    }
}

pub fn score_rows(
    schema: &FeatureSchema,
    model: &SegmentedModel,
    platt: &PlattScaler,
    rows: &[ModelRow],
) -> ScoredRows {
    let predictions = model.predict_all(rows, schema);
    let logits: Vec<f64> = predictions.iter().map(|p| p.logit).collect();
    ScoredRows {
        raw_probabilities: logits.iter().map(|z| sigmoid(*z)).collect(),
        probabilities: platt.calibrate_all(&logits),
        uplifts: predictions.iter().map(|p| p.uplift).collect(),
        logits,
    }
}

//! Segmented uplift regressor + buy-now classifier.
//!
//! A global pair of models is always fitted. Each `domain::phase` segment
//! with enough trainable rows and both classes present gets its own pair.
//! Prediction looks the row's segment up and falls back to the global pair.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TrainingConfig;
use crate::data::ModelRow;

use super::linear::{fit_logistic, fit_ridge, LinearModel};
use super::schema::FeatureSchema;

/// Quantile of unsorted values with linear interpolation between order
/// statistics. `None` on empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Winsorization range of regression targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinsorBounds {
    pub lo: f64,
    pub hi: f64,
}

impl WinsorBounds {
    pub fn fit(targets: &[f64], lower_q: f64, upper_q: f64) -> Option<Self> {
        Some(Self {
            lo: quantile(targets, lower_q)?,
            hi: quantile(targets, upper_q)?,
        })
    }

    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.lo, self.hi)
    }
}

/// One fitted regressor/classifier pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentModel {
    /// Trainable rows the pair was fitted on.
    pub rows: usize,
    /// Share of rows labeled buy-now.
    pub positive_rate: f64,
    /// Target winsorization range, also used to clip predictions.
    pub bounds: WinsorBounds,
    /// Ridge model of the policy-window uplift.
    pub regressor: LinearModel,
    /// Logistic model of buy-now.
    pub classifier: LinearModel,
}

impl SegmentModel {
    fn fit(xs: &[Vec<f64>], targets: &[f64], labels: &[bool], dim: usize, config: &TrainingConfig) -> Option<Self> {
        let bounds = WinsorBounds::fit(targets, config.winsor_lower_quantile, config.winsor_upper_quantile)?;
        let clipped: Vec<f64> = targets.iter().map(|t| bounds.clip(*t)).collect();
        let positives = labels.iter().filter(|l| **l).count();
        Some(Self {
            rows: xs.len(),
            positive_rate: positives as f64 / labels.len().max(1) as f64,
            bounds,
            regressor: fit_ridge(xs, &clipped, dim, &config.ridge),
            classifier: fit_logistic(xs, labels, dim, &config.logistic),
        })
    }
}

/// Raw model output for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Uncalibrated classifier logit for "buy now".
    pub logit: f64,
    /// Predicted policy-window uplift, clipped to the model's bounds.
    pub uplift: f64,
}

/// Segment summary for reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentSummary {
    /// `domain::phase`
    pub key: String,
    pub rows: usize,
    pub positive_rate: f64,
    /// Lower winsorization bound
    pub lo: f64,
    /// Upper winsorization bound
    pub hi: f64,
}

/// Global model plus per-segment overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentedModel {
    /// Fitted on every trainable row; the fallback for any segment.
    pub global: SegmentModel,
    /// Segments that met the row minimum and had both classes.
    pub segments: BTreeMap<String, SegmentModel>,
}

impl SegmentedModel {
    /// Fit on the trainable subset of `rows`; `None` when nothing is trainable.
    pub fn fit(
        rows: &[ModelRow],
        schema: &FeatureSchema,
        config: &TrainingConfig,
        min_segment_rows: usize,
    ) -> Option<Self> {
        let dim = schema.dimension();
        let trainable: Vec<(&ModelRow, f64, bool)> = rows
            .iter()
            .filter(|r| r.is_trainable())
            .filter_map(|r| Some((r, r.target?, r.buy_now?)))
            .collect();

        let xs: Vec<Vec<f64>> = trainable.iter().map(|(r, _, _)| schema.vectorize(r)).collect();
        let targets: Vec<f64> = trainable.iter().map(|(_, t, _)| *t).collect();
        let labels: Vec<bool> = trainable.iter().map(|(_, _, l)| *l).collect();

        let global = SegmentModel::fit(&xs, &targets, &labels, dim, config)?;

        let mut members: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, (row, _, _)) in trainable.iter().enumerate() {
            members.entry(row.segment.as_str()).or_default().push(i);
        }

        let mut segments = BTreeMap::new();
        for (key, idx) in members {
            if idx.len() < min_segment_rows {
                continue;
            }
            let seg_labels: Vec<bool> = idx.iter().map(|&i| labels[i]).collect();
            if seg_labels.iter().all(|l| *l) || seg_labels.iter().all(|l| !*l) {
                debug!(segment = key, rows = idx.len(), "Skipping single-class segment");
                continue;
            }
            let seg_xs: Vec<Vec<f64>> = idx.iter().map(|&i| xs[i].clone()).collect();
            let seg_targets: Vec<f64> = idx.iter().map(|&i| targets[i]).collect();
            if let Some(model) = SegmentModel::fit(&seg_xs, &seg_targets, &seg_labels, dim, config) {
                segments.insert(key.to_string(), model);
            }
        }

        debug!(
            rows = trainable.len(),
            segments = segments.len(),
            "Fitted segmented models"
        );
        Some(Self { global, segments })
    }

    /// Segment model when present, otherwise the global one.
    pub fn model_for(&self, segment: &str) -> &SegmentModel {
        self.segments.get(segment).unwrap_or(&self.global)
    }

    pub fn predict(&self, row: &ModelRow, x: &[f64]) -> Prediction {
        let model = self.model_for(&row.segment);
        Prediction {
            logit: model.classifier.score(x),
            uplift: model.bounds.clip(model.regressor.score(x)),
        }
    }

    pub fn predict_all(&self, rows: &[ModelRow], schema: &FeatureSchema) -> Vec<Prediction> {
        rows.iter()
            .map(|r| self.predict(r, &schema.vectorize(r)))
            .collect()
    }

    pub fn segment_summaries(&self) -> Vec<SegmentSummary> {
        self.segments
            .iter()
            .map(|(key, m)| SegmentSummary {
                key: key.clone(),
                rows: m.rows,
                positive_rate: m.positive_rate,
                lo: m.bounds.lo,
                hi: m.bounds.hi,
            })
            .collect()
    }
}

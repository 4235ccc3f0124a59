//! Descriptive statistics over a labeled dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::LabeledRecord;
use crate::metrics::MetricsCalculator;

use super::synthesizer::LabelingOutput;

/// Per-horizon coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonSummary {
    pub labeled: usize,
    pub improves_edge_rate: Option<f64>,
    pub improves_capacity_adjusted_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSummary {
    pub input_rows: usize,
    pub prepared_rows: usize,
    pub dropped_rows: usize,
    pub series_count: usize,
    pub horizons: BTreeMap<String, HorizonSummary>,
    pub resolution_labeled: usize,
    pub censored: usize,
    /// Among non-censored rows.
    pub buy_now_rate: Option<f64>,
    pub mean_policy_window_delta: Option<f64>,
    pub median_policy_window_delta: Option<f64>,
    /// Keyed by phase name, `unknown` when the phase is null.
    pub phase_counts: BTreeMap<String, usize>,
    pub taxonomy_tagged: usize,
}

impl LabelSummary {
    pub fn from_output(output: &LabelingOutput) -> Self {
        let mut summary = Self::from_records(&output.records);
        summary.input_rows = output.input_rows;
        summary.dropped_rows = output.dropped_rows;
        summary.series_count = output.series_count;
        summary
    }

    pub fn from_records(records: &[LabeledRecord]) -> Self {
        let mut horizon_stats: BTreeMap<String, (usize, usize, usize, usize)> = BTreeMap::new();
        let mut phase_counts = BTreeMap::new();
        let mut deltas = Vec::new();
        let mut buy_now = 0usize;
        let mut resolution_labeled = 0usize;
        let mut censored = 0usize;

        for record in records {
            for (key, label) in &record.labels.horizons {
                let entry = horizon_stats.entry(key.clone()).or_default();
                if let Some(label) = label {
                    entry.0 += 1;
                    entry.1 += label.improves_edge as usize;
                    if let Some(improves) = label.improves_capacity_adjusted {
                        entry.2 += 1;
                        entry.3 += improves as usize;
                    }
                }
            }

            let Some(anchored) = &record.labels.resolution_anchored else {
                continue;
            };
            resolution_labeled += 1;
            let phase = anchored
                .phase_now
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| crate::data::UNKNOWN.to_string());
            *phase_counts.entry(phase).or_insert(0) += 1;

            if anchored.label_censored_policy_window {
                censored += 1;
            }
            if let Some(delta) = anchored.delta_net_pnl_policy_window_at_now_size {
                deltas.push(delta);
                if anchored.buy_now_beats_wait_window == Some(true) {
                    buy_now += 1;
                }
            }
        }

        let rate = |hits: usize, total: usize| (total > 0).then(|| hits as f64 / total as f64);
        let horizons = horizon_stats
            .into_iter()
            .map(|(key, (labeled, edge_hits, cap_total, cap_hits))| {
                (
                    key,
                    HorizonSummary {
                        labeled,
                        improves_edge_rate: rate(edge_hits, labeled),
                        improves_capacity_adjusted_rate: rate(cap_hits, cap_total),
                    },
                )
            })
            .collect();

        Self {
            input_rows: records.len(),
            prepared_rows: records.len(),
            dropped_rows: 0,
            series_count: 0,
            horizons,
            resolution_labeled,
            censored,
            buy_now_rate: rate(buy_now, deltas.len()),
            mean_policy_window_delta: MetricsCalculator::mean(&deltas),
            median_policy_window_delta: MetricsCalculator::median(&deltas),
            phase_counts,
            taxonomy_tagged: records.iter().filter(|r| r.taxonomy.is_some()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawDecisionRow;
    use crate::labels::LabelSynthesizer;
    use crate::config::LabelConfig;
    use crate::taxonomy::KeywordClassifier;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn row(minutes: i64, edge: f64, capacity: f64) -> RawDecisionRow {
        serde_json::from_value(json!({
            "decisionTs": 1_704_456_000_000i64 + minutes * 60_000,
            "dedupeKey": "opp",
            "expectedEdgeAtDecision": edge,
            "targetContractsAtDecision": capacity,
            "legs": [{"venue": "kalshi", "title": "Will the Fed cut rates?"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let rows = vec![
            row(0, 0.02, 100.0),
            row(30, 0.05, 100.0),
            row(90, 0.01, 100.0),
            RawDecisionRow::default(),
        ];
        let output = LabelSynthesizer::new(LabelConfig::default()).label_rows(rows, &KeywordClassifier::default());
        let summary = LabelSummary::from_output(&output);

        assert_eq!(summary.input_rows, 4);
        assert_eq!(summary.prepared_rows, 3);
        assert_eq!(summary.dropped_rows, 1);
        assert_eq!(summary.series_count, 1);
        assert_eq!(summary.resolution_labeled, 2);
        assert_eq!(summary.censored, 0);
        assert_eq!(summary.phase_counts.get("unknown"), Some(&2));
        assert_eq!(summary.taxonomy_tagged, 3);

        let one_hour = &summary.horizons["1h"];
        assert_eq!(one_hour.labeled, 2);
        assert_relative_eq!(one_hour.improves_edge_rate.unwrap(), 0.5);

        // Row 0 waits for +3.0; row 1 only sees a worse snapshot (-4.0).
        assert_relative_eq!(summary.buy_now_rate.unwrap(), 0.5);
        assert_relative_eq!(summary.mean_policy_window_delta.unwrap(), -0.5, epsilon = 1e-9);
        assert_relative_eq!(summary.median_policy_window_delta.unwrap(), -0.5, epsilon = 1e-9);
    }
}

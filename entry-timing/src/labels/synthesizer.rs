//! Counterfactual label synthesis.
//!
//! For each decision the synthesizer looks forward in its own series (all
//! decisions sharing a dedupe key, in time order) and asks: had we waited,
//! what is the best snapshot we could have entered at instead?
//!
//! Every window is summarised by an explicit fold over its candidates into an
//! immutable [`ScanSummary`]. Nothing is shared between horizons or records.
//! Ties keep the first maximum seen left to right (strict `>`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LabelConfig;
use crate::data::{DecisionRecord, LabeledRecord, PreparedDecisions, RawDecisionRow};
use crate::taxonomy::{MarketMeta, TaxonomyClassifier};

use super::phase::{policy_window_hours, Phase};

const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Label for one fixed wall-clock horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonLabel {
    pub edge_uplift: f64,
    pub improves_edge: bool,
    pub best_future_edge: f64,
    pub minutes_to_best_edge: f64,
    pub capacity_change_contracts: Option<f64>,
    pub capacity_adjusted_uplift: Option<f64>,
    pub improves_capacity_adjusted: Option<bool>,
    pub best_fill_ratio_at_now_size: Option<f64>,
    pub minutes_to_best_capacity_adjusted: Option<f64>,
}

/// Label anchored on the market's resolution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionAnchoredLabel {
    pub time_to_resolution_hours_now: Option<f64>,
    pub phase_now: Option<Phase>,
    pub policy_window_hours: f64,
    pub future_candidates: usize,
    pub best_future_edge: f64,
    pub edge_uplift: f64,
    pub improves_edge: bool,
    pub minutes_to_best_edge: f64,
    pub capacity_adjusted_uplift: Option<f64>,
    pub improves_capacity_adjusted: Option<bool>,
    pub minutes_to_best_capacity_adjusted: Option<f64>,
    pub late_window_uplift: Option<f64>,
    pub near_resolution_uplift: Option<f64>,
    pub enter_early_better_than_late: Option<bool>,
    pub delta_net_pnl_policy_window_at_now_size: Option<f64>,
    pub minutes_to_best_policy_window: Option<f64>,
    /// True when waiting inside the policy window does not beat buying now
    /// (delta <= 0). The name reads inverted; downstream rewards rely on it.
    pub buy_now_beats_wait_window: Option<bool>,
    pub label_censored_policy_window: bool,
}

/// All labels attached to one decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    /// Fixed horizons keyed `15m`, `1h`, `3h`, ...
    #[serde(flatten)]
    pub horizons: BTreeMap<String, Option<HorizonLabel>>,
    #[serde(rename = "resolutionAnchored", default)]
    pub resolution_anchored: Option<ResolutionAnchoredLabel>,
}

impl Labels {
    pub fn horizon(&self, key: &str) -> Option<&HorizonLabel> {
        self.horizons.get(key).and_then(Option::as_ref)
    }
}

/// Label key for a horizon: whole hours render as `1h`, otherwise minutes.
pub fn horizon_key(minutes: i64) -> String {
    if minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}m", minutes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct EdgeBest {
    edge: f64,
    ts_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct UpliftBest {
    uplift: f64,
    fill_ratio: f64,
    ts_ms: i64,
}

/// Fold result over one candidate window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ScanSummary {
    candidates: usize,
    best_edge: Option<EdgeBest>,
    max_capacity: Option<f64>,
    best_uplift: Option<UpliftBest>,
}

impl ScanSummary {
    fn scan<'a>(now: &DecisionRecord, candidates: impl IntoIterator<Item = &'a DecisionRecord>) -> Self {
        candidates
            .into_iter()
            .fold(Self::default(), |acc, candidate| acc.absorb(now, candidate))
    }

    fn absorb(self, now: &DecisionRecord, candidate: &DecisionRecord) -> Self {
        let best_edge = match self.best_edge {
            Some(best) if candidate.edge <= best.edge => Some(best),
            _ => Some(EdgeBest {
                edge: candidate.edge,
                ts_ms: candidate.ts_ms,
            }),
        };

        let max_capacity = match (self.max_capacity, candidate.capacity) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        let best_uplift = match capacity_adjusted_uplift(now, candidate) {
            Some(next) if self.best_uplift.map_or(true, |best| next.uplift > best.uplift) => Some(next),
            _ => self.best_uplift,
        };

        Self {
            candidates: self.candidates + 1,
            best_edge,
            max_capacity,
            best_uplift,
        }
    }

    fn horizon_label(&self, now: &DecisionRecord) -> Option<HorizonLabel> {
        let best = self.best_edge?;
        let edge_uplift = best.edge - now.edge;
        Some(HorizonLabel {
            edge_uplift,
            improves_edge: edge_uplift > 0.0,
            best_future_edge: best.edge,
            minutes_to_best_edge: minutes_between(now.ts_ms, best.ts_ms),
            capacity_change_contracts: match (self.max_capacity, now.capacity) {
                (Some(future), Some(current)) => Some(future - current),
                _ => None,
            },
            capacity_adjusted_uplift: self.best_uplift.map(|u| u.uplift),
            improves_capacity_adjusted: self.best_uplift.map(|u| u.uplift > 0.0),
            best_fill_ratio_at_now_size: self.best_uplift.map(|u| u.fill_ratio),
            minutes_to_best_capacity_adjusted: self
                .best_uplift
                .map(|u| minutes_between(now.ts_ms, u.ts_ms)),
        })
    }
}

/// Profit of entering at `candidate` instead of now, at the fillable size.
fn capacity_adjusted_uplift(now: &DecisionRecord, candidate: &DecisionRecord) -> Option<UpliftBest> {
    let now_capacity = now.capacity.filter(|c| *c > 0.0)?;
    let candidate_capacity = candidate.capacity?;
    let fillable = now_capacity.min(candidate_capacity);
    Some(UpliftBest {
        uplift: candidate.edge * fillable - now.edge * now_capacity,
        fill_ratio: fillable / now_capacity,
        ts_ms: candidate.ts_ms,
    })
}

fn minutes_between(from_ms: i64, to_ms: i64) -> f64 {
    (to_ms - from_ms) as f64 / MS_PER_MINUTE
}

fn hours_to_ms(hours: f64) -> i64 {
    (hours * MS_PER_HOUR).round() as i64
}

/// Prefix of `future` whose timestamps are at or before `end_ms`.
fn window(future: &[DecisionRecord], end_ms: i64) -> &[DecisionRecord] {
    let n = future.iter().take_while(|c| c.ts_ms <= end_ms).count();
    &future[..n]
}

/// Output of labeling a full dataset.
#[derive(Debug, Clone)]
pub struct LabelingOutput {
    /// Labeled rows in chronological order (ties by input position).
    pub records: Vec<LabeledRecord>,
    pub input_rows: usize,
    pub dropped_rows: usize,
    pub series_count: usize,
}

/// Multi-horizon label synthesizer.
pub struct LabelSynthesizer {
    config: LabelConfig,
}

impl LabelSynthesizer {
    pub fn new(config: LabelConfig) -> Self {
        Self { config }
    }

    fn max_lookahead_ms(&self) -> i64 {
        hours_to_ms(self.config.max_lookahead_hours)
    }

    /// Labels for the record at `idx` of a time-ordered series.
    pub fn label_at(&self, series: &[DecisionRecord], idx: usize) -> Labels {
        let now = &series[idx];
        let future = &series[idx + 1..];

        let lookahead_end = now.ts_ms.saturating_add(self.max_lookahead_ms());
        let cap_end = match now.resolution_ts_ms {
            Some(resolution) => lookahead_end.min(resolution),
            None => lookahead_end,
        };

        let horizons = self
            .config
            .horizons_minutes
            .iter()
            .map(|&minutes| {
                let end = now.ts_ms.saturating_add(minutes * 60_000).min(cap_end);
                let summary = ScanSummary::scan(now, window(future, end));
                (horizon_key(minutes), summary.horizon_label(now))
            })
            .collect();

        Labels {
            horizons,
            resolution_anchored: self.resolution_anchored(now, future, cap_end),
        }
    }

    fn resolution_anchored(
        &self,
        now: &DecisionRecord,
        future: &[DecisionRecord],
        window_end: i64,
    ) -> Option<ResolutionAnchoredLabel> {
        let candidates = window(future, window_end);
        let full = ScanSummary::scan(now, candidates);
        let best_edge = full.best_edge?;

        let ttr_hours = now
            .resolution_ts_ms
            .map(|resolution| (resolution - now.ts_ms) as f64 / MS_PER_HOUR);
        let phase = Phase::from_hours(ttr_hours);
        let pw_hours = policy_window_hours(phase, ttr_hours);

        let within_hours_of_resolution = |limit_hours: f64| {
            let resolution = now.resolution_ts_ms;
            let limit_ms = hours_to_ms(limit_hours);
            move |c: &&DecisionRecord| resolution.map_or(false, |r| r - c.ts_ms <= limit_ms)
        };
        let late = ScanSummary::scan(
            now,
            candidates
                .iter()
                .filter(within_hours_of_resolution(self.config.late_window_hours)),
        );
        let near = ScanSummary::scan(
            now,
            candidates
                .iter()
                .filter(within_hours_of_resolution(self.config.near_resolution_hours)),
        );

        let policy_end = now.ts_ms.saturating_add(hours_to_ms(pw_hours));
        let policy = ScanSummary::scan(now, window(candidates, policy_end));

        let late_uplift = late.best_uplift.map(|u| u.uplift);
        let delta = policy.best_uplift.map(|u| u.uplift);
        let edge_uplift = best_edge.edge - now.edge;

        Some(ResolutionAnchoredLabel {
            time_to_resolution_hours_now: ttr_hours,
            phase_now: phase,
            policy_window_hours: pw_hours,
            future_candidates: full.candidates,
            best_future_edge: best_edge.edge,
            edge_uplift,
            improves_edge: edge_uplift > 0.0,
            minutes_to_best_edge: minutes_between(now.ts_ms, best_edge.ts_ms),
            capacity_adjusted_uplift: full.best_uplift.map(|u| u.uplift),
            improves_capacity_adjusted: full.best_uplift.map(|u| u.uplift > 0.0),
            minutes_to_best_capacity_adjusted: full
                .best_uplift
                .map(|u| minutes_between(now.ts_ms, u.ts_ms)),
            late_window_uplift: late_uplift,
            near_resolution_uplift: near.best_uplift.map(|u| u.uplift),
            enter_early_better_than_late: late_uplift.map(|u| u <= 0.0),
            delta_net_pnl_policy_window_at_now_size: delta,
            minutes_to_best_policy_window: policy
                .best_uplift
                .map(|u| minutes_between(now.ts_ms, u.ts_ms)),
            buy_now_beats_wait_window: delta.map(|d| d <= 0.0),
            label_censored_policy_window: delta.is_none(),
        })
    }

    /// Labels for every record of one series, index-aligned with it.
    pub fn label_series(&self, series: &[DecisionRecord]) -> Vec<Labels> {
        (0..series.len()).map(|idx| self.label_at(series, idx)).collect()
    }

    /// Group records into series, label them, and return `(row_index, labels)`.
    pub fn label_records(&self, records: Vec<DecisionRecord>) -> (Vec<(usize, Labels)>, usize) {
        let mut series_by_key: BTreeMap<String, Vec<DecisionRecord>> = BTreeMap::new();
        for record in records {
            series_by_key
                .entry(record.dedupe_key.clone())
                .or_default()
                .push(record);
        }
        let series_count = series_by_key.len();

        let mut labeled = Vec::new();
        for series in series_by_key.values_mut() {
            series.sort_by_key(|r| (r.ts_ms, r.row_index));
            let labels = self.label_series(series);
            labeled.extend(series.iter().map(|r| r.row_index).zip(labels));
        }
        (labeled, series_count)
    }

    /// Prepare, label and tag a raw dataset.
    pub fn label_rows(
        &self,
        rows: Vec<RawDecisionRow>,
        classifier: &dyn TaxonomyClassifier,
    ) -> LabelingOutput {
        let input_rows = rows.len();
        let prepared = PreparedDecisions::from_rows(&rows);
        let dropped_rows = prepared.dropped();
        if dropped_rows > 0 {
            debug!(
                missing_ts = prepared.missing_ts,
                missing_key = prepared.missing_key,
                missing_edge = prepared.missing_edge,
                "Dropped unlabelable rows"
            );
        }

        let (labeled, series_count) = self.label_records(prepared.records);

        let mut slots: Vec<Option<RawDecisionRow>> = rows.into_iter().map(Some).collect();
        let mut tagged: Vec<(usize, LabeledRecord)> = labeled
            .into_iter()
            .filter_map(|(row_index, labels)| {
                let row = slots.get_mut(row_index)?.take()?;
                let meta = MarketMeta::from_row(&row);
                let record = LabeledRecord {
                    decision_ts_ms: row.decision_ts_ms()?,
                    resolved_capacity: row.resolved_capacity(),
                    resolution_ts_ms: row.resolution_ts_ms(),
                    taxonomy: classifier.classify(&meta),
                    labels,
                    row,
                };
                Some((row_index, record))
            })
            .collect();
        tagged.sort_by_key(|(row_index, record)| (record.decision_ts_ms, *row_index));
        let records = tagged.into_iter().map(|(_, record)| record).collect();

        LabelingOutput {
            records,
            input_rows,
            dropped_rows,
            series_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MIN: i64 = 60_000;
    const HOUR: i64 = 60 * MIN;

    fn record(row_index: usize, minutes: i64, edge: f64, capacity: Option<f64>) -> DecisionRecord {
        DecisionRecord {
            row_index,
            ts_ms: minutes * MIN,
            dedupe_key: "opp-1".to_string(),
            edge,
            capacity,
            resolution_ts_ms: None,
        }
    }

    fn synthesizer() -> LabelSynthesizer {
        LabelSynthesizer::new(LabelConfig::default())
    }

    #[test]
    fn test_horizon_keys() {
        assert_eq!(horizon_key(15), "15m");
        assert_eq!(horizon_key(60), "1h");
        assert_eq!(horizon_key(180), "3h");
        assert_eq!(horizon_key(90), "90m");
    }

    #[test]
    fn test_one_hour_label_finds_best_edge() {
        let series = vec![
            record(0, 0, 0.02, Some(100.0)),
            record(1, 30, 0.05, Some(100.0)),
            record(2, 90, 0.01, Some(100.0)),
        ];
        let labels = synthesizer().label_at(&series, 0);

        let one_hour = labels.horizon("1h").unwrap();
        assert_relative_eq!(one_hour.best_future_edge, 0.05);
        assert!(one_hour.improves_edge);
        assert_relative_eq!(one_hour.minutes_to_best_edge, 30.0);
        assert_relative_eq!(one_hour.capacity_adjusted_uplift.unwrap(), 3.0, epsilon = 1e-9);
        assert_eq!(one_hour.best_fill_ratio_at_now_size, Some(1.0));
        assert_eq!(one_hour.capacity_change_contracts, Some(0.0));

        // Nothing within 15 minutes.
        assert!(labels.horizons.contains_key("15m"));
        assert!(labels.horizon("15m").is_none());

        let three_hours = labels.horizon("3h").unwrap();
        assert_relative_eq!(three_hours.best_future_edge, 0.05);
    }

    #[test]
    fn test_lone_record_is_unlabelable() {
        let series = vec![record(0, 0, 0.02, Some(100.0))];
        let labels = synthesizer().label_at(&series, 0);
        assert_eq!(labels.horizons.get("15m"), Some(&None));
        assert_eq!(labels.horizons.get("1h"), Some(&None));
        assert_eq!(labels.horizons.get("3h"), Some(&None));
        assert!(labels.resolution_anchored.is_none());
    }

    #[test]
    fn test_ties_keep_first_maximum() {
        let series = vec![
            record(0, 0, 0.02, Some(100.0)),
            record(1, 10, 0.05, Some(100.0)),
            record(2, 20, 0.05, Some(100.0)),
        ];
        let label = synthesizer().label_at(&series, 0);
        let one_hour = label.horizon("1h").unwrap();
        assert_relative_eq!(one_hour.minutes_to_best_edge, 10.0);
        assert_relative_eq!(one_hour.minutes_to_best_capacity_adjusted.unwrap(), 10.0);
    }

    #[test]
    fn test_uplift_uses_fillable_size() {
        let series = vec![
            record(0, 0, 0.02, Some(100.0)),
            record(1, 5, 0.06, Some(40.0)),
            record(2, 10, 0.04, Some(100.0)),
        ];
        let label = synthesizer().label_at(&series, 0);
        let fifteen = label.horizon("15m").unwrap();
        // 0.06 * 40 - 2.0 = 0.4 versus 0.04 * 100 - 2.0 = 2.0
        assert_relative_eq!(fifteen.capacity_adjusted_uplift.unwrap(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(fifteen.minutes_to_best_capacity_adjusted.unwrap(), 10.0);
        assert_relative_eq!(fifteen.best_future_edge, 0.06);
        assert_eq!(fifteen.best_fill_ratio_at_now_size, Some(1.0));
    }

    #[test]
    fn test_missing_capacity_censors_policy_window() {
        let series = vec![record(0, 0, 0.02, None), record(1, 10, 0.05, Some(50.0))];
        let label = synthesizer().label_at(&series, 0);
        let anchored = label.resolution_anchored.as_ref().unwrap();
        assert!(anchored.label_censored_policy_window);
        assert_eq!(anchored.delta_net_pnl_policy_window_at_now_size, None);
        assert_eq!(anchored.buy_now_beats_wait_window, None);
        assert!(anchored.improves_edge);
        assert_eq!(label.horizon("15m").unwrap().capacity_change_contracts, None);
    }

    #[test]
    fn test_resolution_caps_the_scan() {
        let mut series = vec![
            record(0, 0, 0.02, Some(100.0)),
            record(1, 30, 0.05, Some(100.0)),
        ];
        series[0].resolution_ts_ms = Some(20 * MIN);
        let label = synthesizer().label_at(&series, 0);
        assert!(label.horizon("1h").is_none());
        assert!(label.resolution_anchored.is_none());
    }

    #[test]
    fn test_policy_window_follows_phase() {
        let resolution = 3 * HOUR;
        let mut series = vec![
            record(0, 0, 0.02, Some(100.0)),
            record(1, 30, 0.01, Some(100.0)),
            record(2, 120, 0.09, Some(100.0)),
        ];
        for r in &mut series {
            r.resolution_ts_ms = Some(resolution);
        }
        let anchored = synthesizer().label_at(&series, 0).resolution_anchored.unwrap();

        assert_eq!(anchored.phase_now, Some(Phase::SixHoursToOne));
        assert_relative_eq!(anchored.time_to_resolution_hours_now.unwrap(), 3.0);
        assert_relative_eq!(anchored.policy_window_hours, 1.0);
        assert_eq!(anchored.future_candidates, 2);

        // Only the 30-minute snapshot is inside the 1h policy window.
        assert_relative_eq!(
            anchored.delta_net_pnl_policy_window_at_now_size.unwrap(),
            -1.0,
            epsilon = 1e-9
        );
        assert_eq!(anchored.buy_now_beats_wait_window, Some(true));
        assert!(!anchored.label_censored_policy_window);

        assert_relative_eq!(anchored.capacity_adjusted_uplift.unwrap(), 7.0, epsilon = 1e-9);
        assert_relative_eq!(anchored.late_window_uplift.unwrap(), 7.0, epsilon = 1e-9);
        assert_relative_eq!(anchored.near_resolution_uplift.unwrap(), 7.0, epsilon = 1e-9);
        assert_eq!(anchored.enter_early_better_than_late, Some(false));
    }

    #[test]
    fn test_late_and_near_windows_filter_by_time_to_resolution() {
        let resolution = 48 * HOUR;
        let mut series = vec![
            record(0, 0, 0.02, Some(100.0)),
            record(1, 60, 0.09, Some(100.0)),
            record(2, 30 * 60, 0.03, Some(100.0)),
            record(3, 44 * 60, 0.01, Some(100.0)),
        ];
        for r in &mut series {
            r.resolution_ts_ms = Some(resolution);
        }
        let anchored = synthesizer().label_at(&series, 0).resolution_anchored.unwrap();

        assert_eq!(anchored.phase_now, Some(Phase::ThreeDaysToOne));
        assert_relative_eq!(anchored.policy_window_hours, 12.0);
        assert_relative_eq!(anchored.capacity_adjusted_uplift.unwrap(), 7.0, epsilon = 1e-9);
        // 30h and 44h are within 24h of resolution; only 44h is within 6h.
        assert_relative_eq!(anchored.late_window_uplift.unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(anchored.near_resolution_uplift.unwrap(), -1.0, epsilon = 1e-9);
        assert_eq!(anchored.enter_early_better_than_late, Some(false));
        // Only the 1h snapshot is inside the 12h policy window.
        assert_relative_eq!(
            anchored.delta_net_pnl_policy_window_at_now_size.unwrap(),
            7.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(anchored.minutes_to_best_policy_window.unwrap(), 60.0);
    }

    #[test]
    fn test_late_window_requires_known_resolution() {
        let series = vec![
            record(0, 0, 0.02, Some(100.0)),
            record(1, 30, 0.05, Some(100.0)),
            record(2, 90, 0.01, Some(100.0)),
        ];
        let anchored = synthesizer().label_at(&series, 0).resolution_anchored.unwrap();
        assert_eq!(anchored.phase_now, None);
        assert_relative_eq!(anchored.policy_window_hours, 24.0);
        assert_eq!(anchored.late_window_uplift, None);
        assert_eq!(anchored.enter_early_better_than_late, None);
        assert_relative_eq!(
            anchored.delta_net_pnl_policy_window_at_now_size.unwrap(),
            3.0,
            epsilon = 1e-9
        );
        assert_eq!(anchored.buy_now_beats_wait_window, Some(false));
    }

    #[test]
    fn test_lookahead_capped_at_seven_days() {
        let series = vec![
            record(0, 0, 0.02, Some(100.0)),
            record(1, 8 * 24 * 60, 0.09, Some(100.0)),
        ];
        let label = synthesizer().label_at(&series, 0);
        assert!(label.resolution_anchored.is_none());
    }

    #[test]
    fn test_censoring_and_polarity_invariants() {
        let mut series = Vec::new();
        let edges = [0.03, 0.01, 0.04, 0.02, 0.05, 0.00, 0.03];
        for (i, edge) in edges.iter().enumerate() {
            let capacity = if i % 3 == 2 { None } else { Some(20.0 + i as f64 * 10.0) };
            series.push(record(i, i as i64 * 20, *edge, capacity));
        }
        for labels in synthesizer().label_series(&series) {
            if let Some(anchored) = labels.resolution_anchored {
                assert_eq!(
                    anchored.label_censored_policy_window,
                    anchored.delta_net_pnl_policy_window_at_now_size.is_none()
                );
                if let Some(delta) = anchored.delta_net_pnl_policy_window_at_now_size {
                    assert_eq!(anchored.buy_now_beats_wait_window, Some(delta <= 0.0));
                }
            }
        }
    }

    #[test]
    fn test_label_records_groups_and_sorts() {
        let mut a0 = record(0, 30, 0.05, Some(10.0));
        let mut a1 = record(1, 0, 0.02, Some(10.0));
        let mut b0 = record(2, 0, 0.02, Some(10.0));
        a0.dedupe_key = "a".into();
        a1.dedupe_key = "a".into();
        b0.dedupe_key = "b".into();

        let (labeled, series_count) = synthesizer().label_records(vec![a0, a1, b0]);
        assert_eq!(series_count, 2);
        assert_eq!(labeled.len(), 3);

        let by_row: BTreeMap<usize, Labels> = labeled.into_iter().collect();
        // Row 1 is earlier in time, so it sees row 0 as its future.
        assert!(by_row[&1].horizon("1h").is_some());
        assert!(by_row[&0].resolution_anchored.is_none());
        assert!(by_row[&2].resolution_anchored.is_none());
    }

    #[test]
    fn test_labeling_is_deterministic() {
        let series = vec![
            record(0, 0, 0.02, Some(100.0)),
            record(1, 30, 0.05, Some(80.0)),
            record(2, 90, 0.01, Some(100.0)),
        ];
        let s = synthesizer();
        assert_eq!(s.label_series(&series), s.label_series(&series));
    }
}

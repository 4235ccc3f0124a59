//! Row preparation.
//!
//! Two stages:
//! - before labeling, raw rows become [`DecisionRecord`]s (timestamp, series
//!   key, edge and resolved capacity);
//! - after labeling, [`LabeledRecord`]s become [`ModelRow`]s carrying the
//!   fixed feature layout, segment key and supervised targets.
//!
//! Neither stage assumes input order.

use serde::{Deserialize, Serialize};

use super::types::{LabeledRecord, RawDecisionRow};

/// Literal bucket for missing categorical values.
pub const UNKNOWN: &str = "unknown";

/// Numeric feature keys, in feature-vector order.
pub const NUMERIC_KEYS: [&str; 10] = [
    "expectedEdgeAtDecision",
    "targetContractsAtDecision",
    "minKernelContractsAtDecision",
    "priceAtDecision",
    "budgetUsdAtDecision",
    "requestedUsd",
    "availableUsd",
    "legCount",
    "timeToResolutionHoursNow",
    "policyWindowHours",
];

/// Categorical feature fields, in one-hot block order.
pub const CATEGORICAL_FIELDS: [&str; 6] = [
    "phase",
    "domain",
    "leg1Venue",
    "leg2Venue",
    "leg1Intent",
    "leg2Intent",
];

/// A decision ready for forward scanning.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRecord {
    /// Position in the input dataset.
    pub row_index: usize,
    pub ts_ms: i64,
    pub dedupe_key: String,
    pub edge: f64,
    pub capacity: Option<f64>,
    pub resolution_ts_ms: Option<i64>,
}

impl DecisionRecord {
    /// `None` when the row lacks a parseable timestamp, a key, or an edge.
    pub fn from_row(row_index: usize, row: &RawDecisionRow) -> Option<Self> {
        Some(Self {
            row_index,
            ts_ms: row.decision_ts_ms()?,
            dedupe_key: row.dedupe_key.clone()?,
            edge: row.expected_edge_at_decision?,
            capacity: row.resolved_capacity(),
            resolution_ts_ms: row.resolution_ts_ms(),
        })
    }
}

/// Result of the pre-labeling stage, with drop accounting.
#[derive(Debug, Clone, Default)]
pub struct PreparedDecisions {
    pub records: Vec<DecisionRecord>,
    pub missing_ts: usize,
    pub missing_key: usize,
    pub missing_edge: usize,
}

impl PreparedDecisions {
    pub fn from_rows(rows: &[RawDecisionRow]) -> Self {
        let mut prepared = Self::default();
        for (row_index, row) in rows.iter().enumerate() {
            if row.decision_ts_ms().is_none() {
                prepared.missing_ts += 1;
            } else if row.dedupe_key.is_none() {
                prepared.missing_key += 1;
            } else if row.expected_edge_at_decision.is_none() {
                prepared.missing_edge += 1;
            } else if let Some(record) = DecisionRecord::from_row(row_index, row) {
                prepared.records.push(record);
            }
        }
        prepared
    }

    pub fn dropped(&self) -> usize {
        self.missing_ts + self.missing_key + self.missing_edge
    }
}

/// A labeled decision in modeling layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRow {
    pub ts_ms: i64,
    /// `domain::phase`.
    pub segment: String,
    pub numeric: [Option<f64>; NUMERIC_KEYS.len()],
    pub categorical: [String; CATEGORICAL_FIELDS.len()],
    /// Policy-window capacity-adjusted uplift.
    pub target: Option<f64>,
    /// `buyNowBeatsWaitWindow`.
    pub buy_now: Option<bool>,
    pub censored: bool,
}

impl ModelRow {
    /// `None` unless the record has a resolution-anchored label and a taxonomy tag.
    pub fn from_labeled(record: &LabeledRecord) -> Option<Self> {
        let anchored = record.labels.resolution_anchored.as_ref()?;
        let taxonomy = record.taxonomy.as_ref()?;
        let row = &record.row;

        let phase = anchored
            .phase_now
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let domain = non_empty_or_unknown(Some(&taxonomy.domain));
        let leg = |position: usize| row.leg(position);

        let categorical = [
            phase.clone(),
            domain.clone(),
            non_empty_or_unknown(leg(1).and_then(|l| l.venue.as_ref())),
            non_empty_or_unknown(leg(2).and_then(|l| l.venue.as_ref())),
            non_empty_or_unknown(leg(1).and_then(|l| l.order_intent.as_ref())),
            non_empty_or_unknown(leg(2).and_then(|l| l.order_intent.as_ref())),
        ];

        let numeric = [
            row.expected_edge_at_decision,
            row.target_contracts_at_decision,
            row.min_kernel_contracts_at_decision,
            row.price_at_decision,
            row.budget_usd_at_decision,
            row.requested_usd,
            row.available_usd,
            row.leg_count,
            anchored.time_to_resolution_hours_now,
            Some(anchored.policy_window_hours),
        ];

        Some(Self {
            ts_ms: record.decision_ts_ms,
            segment: segment_key(&domain, &phase),
            numeric,
            categorical,
            target: anchored.delta_net_pnl_policy_window_at_now_size,
            buy_now: anchored.buy_now_beats_wait_window,
            censored: anchored.label_censored_policy_window,
        })
    }

    /// Usable for supervised training and reward evaluation.
    pub fn is_trainable(&self) -> bool {
        !self.censored && self.target.is_some()
    }
}

pub fn segment_key(domain: &str, phase: &str) -> String {
    format!("{}::{}", domain, phase)
}

fn non_empty_or_unknown(value: Option<&String>) -> String {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Convert labeled records to model rows, sorted chronologically.
pub fn prepare_model_rows(records: &[LabeledRecord]) -> Vec<ModelRow> {
    let mut rows: Vec<ModelRow> = records.iter().filter_map(ModelRow::from_labeled).collect();
    rows.sort_by_key(|r| r.ts_ms);
    rows
}

//! Core data types for decision snapshots.
//!
//! Raw rows mirror the NDJSON dataset produced by the extraction job, one
//! decision per line. Every numeric field goes through [`safe_f64`] so that an
//! absent value stays absent instead of silently becoming zero.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::labels::Labels;
use crate::taxonomy::Taxonomy;

/// Epoch values at or above this magnitude are milliseconds, below are seconds.
const EPOCH_MILLIS_CUTOFF: f64 = 1e11;

/// Canonical conversion of a JSON value into an optional finite float.
///
/// Numbers and numeric strings are accepted; null, booleans, garbage strings
/// and non-finite values are all treated as absent.
pub fn safe_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Parse a timestamp value into epoch milliseconds.
pub fn parse_timestamp_ms(value: &Value) -> Option<i64> {
    match value {
        Value::Number(_) => epoch_to_ms(safe_f64(value)?),
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

/// `None` for non-finite values and anything outside chrono's date range.
fn epoch_to_ms(raw: f64) -> Option<i64> {
    if !raw.is_finite() {
        return None;
    }
    let ms = if raw.abs() >= EPOCH_MILLIS_CUTOFF { raw } else { raw * 1000.0 };
    if ms.abs() >= i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(ms as i64)
        .single()
        .map(|dt| dt.timestamp_millis())
}

fn parse_timestamp_str(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    // Postgres-style offsets such as "+00"
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc().timestamp_millis());
    }
    s.parse::<f64>().ok().and_then(epoch_to_ms)
}

/// Render epoch milliseconds as an ISO-8601 UTC string.
pub fn format_timestamp_ms(ts_ms: i64) -> String {
    match Utc.timestamp_millis_opt(ts_ms).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => ts_ms.to_string(),
    }
}

/// serde helper: numeric field through [`safe_f64`].
pub fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(safe_f64))
}

/// serde helper: identifiers that may arrive as strings or numbers.
fn de_opt_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// serde helper: tags may be an array, a comma-separated string, or null.
fn de_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One leg of a cross-venue opportunity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLeg {
    pub venue: Option<String>,
    pub order_intent: Option<String>,
    pub fee_class: Option<String>,
    pub expiry_ts: Option<Value>,
    pub close_ts: Option<Value>,
    pub resolution_ts: Option<Value>,
    pub category: Option<String>,
    #[serde(deserialize_with = "de_tags")]
    pub tags: Vec<String>,
    pub title: Option<String>,
}

impl RawLeg {
    /// Earliest parseable expiry-like timestamp on this leg.
    pub fn earliest_expiry_ms(&self) -> Option<i64> {
        [&self.expiry_ts, &self.close_ts, &self.resolution_ts]
            .into_iter()
            .flatten()
            .filter_map(parse_timestamp_ms)
            .min()
    }
}

/// A decision row exactly as read from the dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawDecisionRow {
    pub decision_ts: Option<Value>,
    #[serde(deserialize_with = "de_opt_key")]
    pub dedupe_key: Option<String>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub expected_edge_at_decision: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub target_contracts_at_decision: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub min_kernel_contracts_at_decision: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub price_at_decision: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub budget_usd_at_decision: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub requested_usd: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub available_usd: Option<f64>,
    #[serde(deserialize_with = "de_opt_f64")]
    pub leg_count: Option<f64>,
    #[serde(deserialize_with = "de_null_default")]
    pub legs: Vec<RawLeg>,
    /// Execution outcome, carried through untouched.
    pub execution: Option<Value>,
}

impl RawDecisionRow {
    pub fn decision_ts_ms(&self) -> Option<i64> {
        self.decision_ts.as_ref().and_then(parse_timestamp_ms)
    }

    /// Smallest strictly positive capacity candidate, if any.
    pub fn resolved_capacity(&self) -> Option<f64> {
        [
            self.target_contracts_at_decision,
            self.min_kernel_contracts_at_decision,
        ]
        .into_iter()
        .flatten()
        .filter(|c| c.is_finite() && *c > 0.0)
        .reduce(f64::min)
    }

    /// Earliest expiry across all legs; `None` means unbounded.
    pub fn resolution_ts_ms(&self) -> Option<i64> {
        self.legs.iter().filter_map(RawLeg::earliest_expiry_ms).min()
    }

    /// Leg by 1-based position.
    pub fn leg(&self, position: usize) -> Option<&RawLeg> {
        position.checked_sub(1).and_then(|i| self.legs.get(i))
    }
}

/// A row after labeling, as written back to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabeledRecord {
    #[serde(flatten)]
    pub row: RawDecisionRow,
    pub decision_ts_ms: i64,
    pub resolved_capacity: Option<f64>,
    pub resolution_ts_ms: Option<i64>,
    pub taxonomy: Option<Taxonomy>,
    pub labels: Labels,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_safe_f64() {
        assert_eq!(safe_f64(&json!(1.5)), Some(1.5));
        assert_eq!(safe_f64(&json!(" 2.25 ")), Some(2.25));
        assert_eq!(safe_f64(&json!("abc")), None);
        assert_eq!(safe_f64(&json!("NaN")), None);
        assert_eq!(safe_f64(&json!("inf")), None);
        assert_eq!(safe_f64(&json!(null)), None);
        assert_eq!(safe_f64(&json!(true)), None);
        assert_eq!(safe_f64(&json!(0)), Some(0.0));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = 1_704_456_000_000; // 2024-01-05T12:00:00Z
        assert_eq!(parse_timestamp_ms(&json!("2024-01-05T12:00:00Z")), Some(expected));
        assert_eq!(parse_timestamp_ms(&json!("2024-01-05T14:00:00+02:00")), Some(expected));
        assert_eq!(parse_timestamp_ms(&json!("2024-01-05 12:00:00")), Some(expected));
        assert_eq!(parse_timestamp_ms(&json!("2024-01-05 12:00:00.000+00")), Some(expected));
        assert_eq!(parse_timestamp_ms(&json!(expected)), Some(expected));
        assert_eq!(parse_timestamp_ms(&json!(1_704_456_000)), Some(expected));
        assert_eq!(parse_timestamp_ms(&json!("not a date")), None);
        assert_eq!(parse_timestamp_ms(&json!(1e300)), None);
        assert_eq!(parse_timestamp_ms(&json!(-1e300)), None);
        assert_eq!(parse_timestamp_ms(&json!("9e18")), None);
        assert_eq!(parse_timestamp_ms(&json!(null)), None);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp_ms(1_704_456_000_000), "2024-01-05T12:00:00.000Z");
    }

    #[test]
    fn test_resolved_capacity() {
        let mut row = RawDecisionRow {
            target_contracts_at_decision: Some(40.0),
            min_kernel_contracts_at_decision: Some(25.0),
            ..Default::default()
        };
        assert_eq!(row.resolved_capacity(), Some(25.0));

        row.min_kernel_contracts_at_decision = Some(0.0);
        assert_eq!(row.resolved_capacity(), Some(40.0));

        row.target_contracts_at_decision = Some(-3.0);
        assert_eq!(row.resolved_capacity(), None);

        row.target_contracts_at_decision = None;
        row.min_kernel_contracts_at_decision = None;
        assert_eq!(row.resolved_capacity(), None);
    }

    #[test]
    fn test_resolution_ts_is_min_over_legs() {
        let row: RawDecisionRow = serde_json::from_value(json!({
            "legs": [
                {"expiryTs": "2024-01-10T00:00:00Z", "closeTs": "garbage"},
                {"closeTs": "2024-01-08T00:00:00Z", "resolutionTs": null}
            ]
        }))
        .unwrap();
        assert_eq!(row.resolution_ts_ms(), parse_timestamp_ms(&json!("2024-01-08T00:00:00Z")));

        let no_legs = RawDecisionRow::default();
        assert_eq!(no_legs.resolution_ts_ms(), None);
    }

    #[test]
    fn test_raw_row_tolerates_messy_fields() {
        let row: RawDecisionRow = serde_json::from_value(json!({
            "decisionTs": "2024-01-05T12:00:00Z",
            "dedupeKey": 42,
            "expectedEdgeAtDecision": "0.031",
            "targetContractsAtDecision": "n/a",
            "legs": null,
            "somethingElse": {"ignored": true}
        }))
        .unwrap();
        assert_eq!(row.dedupe_key.as_deref(), Some("42"));
        assert_eq!(row.expected_edge_at_decision, Some(0.031));
        assert_eq!(row.target_contracts_at_decision, None);
        assert!(row.legs.is_empty());
    }

    #[test]
    fn test_leg_tags_accept_string_or_array() {
        let leg: RawLeg = serde_json::from_value(json!({"tags": "nba, playoffs"})).unwrap();
        assert_eq!(leg.tags, vec!["nba".to_string(), "playoffs".to_string()]);

        let leg: RawLeg = serde_json::from_value(json!({"tags": ["fed", 3]})).unwrap();
        assert_eq!(leg.tags, vec!["fed".to_string()]);
    }
}

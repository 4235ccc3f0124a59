//! Feature schema and numeric scaler.
//!
//! Both are fitted on a training slice only. Vocabularies are the sorted
//! distinct training values; anything unseen encodes to the `unknown` bucket
//! when the vocabulary has one, otherwise to an all-zero block.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::{ModelRow, CATEGORICAL_FIELDS, NUMERIC_KEYS, UNKNOWN};

/// Per-key standardisation statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerStats {
    pub mean: f64,
    pub std: f64,
}

impl ScalerStats {
    /// Standardise a value; absent values land on the mean (zero).
    pub fn transform(&self, value: Option<f64>) -> f64 {
        match value {
            Some(v) => (v - self.mean) / self.std,
            None => 0.0,
        }
    }
}

/// Population mean and standard deviation over non-null values.
///
/// A key with no training values gets `(0, 1)`. A standard deviation at or
/// below `std_epsilon` is replaced by 1.
pub fn fit_scaler_stats(values: impl IntoIterator<Item = Option<f64>>, std_epsilon: f64) -> ScalerStats {
    let present: Vec<f64> = values.into_iter().flatten().collect();
    if present.is_empty() {
        return ScalerStats { mean: 0.0, std: 1.0 };
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    ScalerStats {
        mean,
        std: if std <= std_epsilon { 1.0 } else { std },
    }
}

/// A categorical field and its vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub field: String,
    pub values: Vec<String>,
}

impl Vocabulary {
    fn position(&self, value: &str) -> Option<usize> {
        self.values
            .binary_search_by(|v| v.as_str().cmp(value))
            .ok()
            .or_else(|| self.values.binary_search_by(|v| v.as_str().cmp(UNKNOWN)).ok())
    }
}

/// Fitted feature layout: numeric keys, scaler, categorical vocabularies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSchema {
    pub numeric_keys: Vec<String>,
    pub scaler: Vec<ScalerStats>,
    pub vocabularies: Vec<Vocabulary>,
}

impl FeatureSchema {
    pub fn fit(rows: &[ModelRow], std_epsilon: f64) -> Self {
        let scaler = (0..NUMERIC_KEYS.len())
            .map(|k| fit_scaler_stats(rows.iter().map(|r| r.numeric[k]), std_epsilon))
            .collect();

        let vocabularies = CATEGORICAL_FIELDS
            .iter()
            .enumerate()
            .map(|(c, field)| {
                let distinct: BTreeSet<&str> = rows.iter().map(|r| r.categorical[c].as_str()).collect();
                Vocabulary {
                    field: field.to_string(),
                    values: distinct.into_iter().map(String::from).collect(),
                }
            })
            .collect();

        Self {
            numeric_keys: NUMERIC_KEYS.iter().map(|k| k.to_string()).collect(),
            scaler,
            vocabularies,
        }
    }

    /// Bias + numeric + one-hot width.
    pub fn dimension(&self) -> usize {
        1 + self.numeric_keys.len() + self.vocabularies.iter().map(|v| v.values.len()).sum::<usize>()
    }

    pub fn vectorize(&self, row: &ModelRow) -> Vec<f64> {
        let mut x = Vec::with_capacity(self.dimension());
        x.push(1.0);
        x.extend(
            self.scaler
                .iter()
                .zip(row.numeric.iter())
                .map(|(stats, value)| stats.transform(*value)),
        );
        for (vocab, value) in self.vocabularies.iter().zip(row.categorical.iter()) {
            let offset = x.len();
            x.resize(offset + vocab.values.len(), 0.0);
            if let Some(pos) = vocab.position(value) {
                x[offset + pos] = 1.0;
            }
        }
        x
    }

    pub fn vectorize_all(&self, rows: &[ModelRow]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.vectorize(r)).collect()
    }
}

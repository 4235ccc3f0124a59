//! Pipeline configuration.
//!
//! Every constant the labeling and modeling stages depend on lives here, so
//! the single-split and walk-forward paths share one code path and differ only
//! in the parameters they pass down. Defaults reproduce the research setup;
//! a TOML file can override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub labels: LabelConfig,
    pub features: FeatureConfig,
    pub training: TrainingConfig,
    pub calibration: CalibrationConfig,
    pub split: SplitConfig,
    pub walk_forward: WalkForwardConfig,
}

impl PipelineConfig {
    /// Load from a TOML file; missing sections fall back to defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.labels.horizons_minutes.iter().any(|m| *m <= 0) {
            return Err(ConfigError::Invalid("horizons must be positive".into()));
        }
        let split = &self.split;
        if split.train_fraction <= 0.0
            || split.valid_fraction <= 0.0
            || split.train_fraction + split.valid_fraction >= 1.0
        {
            return Err(ConfigError::Invalid(format!(
                "split fractions {}/{} leave no test slice",
                split.train_fraction, split.valid_fraction
            )));
        }
        if self.walk_forward.stride == 0 {
            return Err(ConfigError::Invalid("walk-forward stride must be > 0".into()));
        }
        let t = &self.training;
        if !(0.0..=1.0).contains(&t.winsor_lower_quantile)
            || !(0.0..=1.0).contains(&t.winsor_upper_quantile)
            || t.winsor_lower_quantile > t.winsor_upper_quantile
        {
            return Err(ConfigError::Invalid("winsorization quantiles out of order".into()));
        }
        if self.calibration.threshold_grid.is_empty() {
            return Err(ConfigError::Invalid("threshold grid is empty".into()));
        }
        Ok(())
    }
}

/// Forward-scan horizons and sub-window sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Fixed wall-clock horizons in minutes.
    pub horizons_minutes: Vec<i64>,
    /// Hard cap on lookahead regardless of resolution.
    pub max_lookahead_hours: f64,
    /// "Late" sub-window: candidates within this many hours of resolution.
    pub late_window_hours: f64,
    /// "Near-resolution" sub-window.
    pub near_resolution_hours: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            horizons_minutes: vec![15, 60, 180],
            max_lookahead_hours: 168.0,
            late_window_hours: 24.0,
            near_resolution_hours: 6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Standard deviations at or below this are replaced by 1.
    pub std_epsilon: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { std_epsilon: 1e-9 }
    }
}

/// Full-batch gradient descent hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientDescentParams {
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub ridge: GradientDescentParams,
    pub logistic: GradientDescentParams,
    pub winsor_lower_quantile: f64,
    pub winsor_upper_quantile: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            ridge: GradientDescentParams {
                learning_rate: 0.05,
                epochs: 400,
                l2: 1e-3,
            },
            logistic: GradientDescentParams {
                learning_rate: 0.1,
                epochs: 400,
                l2: 1e-3,
            },
            winsor_lower_quantile: 0.05,
            winsor_upper_quantile: 0.95,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub platt: GradientDescentParams,
    pub threshold_grid: Vec<f64>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            platt: GradientDescentParams {
                learning_rate: 0.05,
                epochs: 500,
                l2: 1e-4,
            },
            threshold_grid: vec![0.35, 0.40, 0.45, 0.50, 0.55, 0.60, 0.65],
        }
    }
}

/// Single chronological train/valid/test split.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_fraction: f64,
    pub valid_fraction: f64,
    /// Minimum trainable rows before a segment gets its own models.
    pub min_segment_rows: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.70,
            valid_fraction: 0.15,
            min_segment_rows: 120,
        }
    }
}

/// Rolling window sizes, in rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    pub train_count: usize,
    pub valid_count: usize,
    pub test_count: usize,
    pub stride: usize,
    pub min_train_rows: usize,
    pub min_valid_rows: usize,
    pub min_test_rows: usize,
    pub min_segment_rows: usize,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            train_count: 1400,
            valid_count: 300,
            test_count: 250,
            stride: 150,
            min_train_rows: 200,
            min_valid_rows: 50,
            min_test_rows: 50,
            min_segment_rows: 80,
        }
    }
}

impl WalkForwardConfig {
    pub fn window_size(&self) -> usize {
        self.train_count + self.valid_count + self.test_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.labels.horizons_minutes, vec![15, 60, 180]);
        assert_eq!(config.walk_forward.window_size(), 1950);
        assert_eq!(config.walk_forward.stride, 150);
        assert_eq!(config.split.min_segment_rows, 120);
        assert_eq!(config.walk_forward.min_segment_rows, 80);
        assert_eq!(config.calibration.threshold_grid.len(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_override() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [walk_forward]
            train_count = 500
            stride = 50

            [training.ridge]
            learning_rate = 0.01
            epochs = 10
            l2 = 0.0
            "#,
        )
        .unwrap();
        assert_eq!(config.walk_forward.train_count, 500);
        assert_eq!(config.walk_forward.stride, 50);
        assert_eq!(config.walk_forward.test_count, 250);
        assert_eq!(config.training.ridge.epochs, 10);
        assert_eq!(config.training.logistic.epochs, 400);
    }

    #[test]
    fn test_invalid_split_rejected() {
        let result = PipelineConfig::from_toml_str(
            r#"
            [split]
            train_fraction = 0.9
            valid_fraction = 0.2
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}

pub mod backtest;
pub mod config;
pub mod data;
pub mod labels;
pub mod metrics;
pub mod model;
pub mod taxonomy;
pub mod walkforward;

// Re-export commonly used types
pub use data::{DataLoader, DecisionRecord, LabeledRecord, ModelRow, PreparedDecisions, RawDecisionRow};
pub use config::{ConfigError, PipelineConfig};
pub use labels::{LabelSummary, LabelSynthesizer, Labels, Phase};
pub use taxonomy::{KeywordClassifier, Taxonomy, TaxonomyClassifier};
pub use model::{FeatureSchema, ModelArtifact, PlattScaler, SegmentedModel, ThresholdSweep};
pub use backtest::{run_single_split, Decision, DecisionMetrics, PipelineError, SingleSplitOutput};
pub use walkforward::{WalkForwardReport, WalkForwardRunner, WalkForwardWindows};
pub use metrics::{ClassificationMetrics, MetricsCalculator};

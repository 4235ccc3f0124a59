//! Policy backtesting against an always-buy-now baseline.
//!
//! - Decision evaluation (relative PnL, buy/wait rates, oracle bound)
//! - The shared fit → calibrate → tune pipeline
//! - Single chronological split with model and backtest reports

pub mod evaluator;
pub mod pipeline;
pub mod single_split;

pub use evaluator::{decide, evaluate, Decision, DecisionMetrics, OracleBound};
pub use pipeline::{evaluate_policy, reward_targets, train_policy, PipelineError, TrainedPolicy};
pub use single_split::{run_single_split, split_by_fraction, BacktestReport, ModelReport, SingleSplitOutput, SliceCounts};

//! Entry-timing research CLI.
//!
//! # Usage
//!
//! ```bash
//! # Synthesize counterfactual labels
//! entry-timing label --input data/decisions.ndjson --output data/labeled.ndjson --summary results/label_summary.json
//!
//! # Single-split training + backtest
//! entry-timing train --input data/labeled.ndjson --output-dir results/single_split
//!
//! # Walk-forward evaluation
//! entry-timing walk-forward --input data/labeled.ndjson --output results/walk_forward.json --config config/pipeline.toml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use entry_timing::backtest::run_single_split;
use entry_timing::config::PipelineConfig;
use entry_timing::data::{prepare_model_rows, write_json_file, write_ndjson_file, DataLoader, LabeledRecord, ModelRow, RawDecisionRow};
use entry_timing::labels::{LabelSummary, LabelSynthesizer};
use entry_timing::taxonomy::KeywordClassifier;
use entry_timing::walkforward::WalkForwardRunner;

const SEPARATOR: &str = "============================================================";

#[derive(Parser)]
#[command(name = "entry-timing")]
#[command(about = "Counterfactual entry-timing labels and buy-now vs wait backtests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize multi-horizon labels for a decision dataset
    Label {
        /// Raw decisions (NDJSON)
        #[arg(long)]
        input: PathBuf,

        /// Labeled decisions (NDJSON)
        #[arg(long)]
        output: PathBuf,

        /// Optional label summary (JSON)
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Optional pipeline config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Train and backtest on a single chronological split
    Train {
        /// Labeled decisions (NDJSON)
        #[arg(long)]
        input: PathBuf,

        /// Directory for model report, artifact and backtest report
        #[arg(long, default_value = "results/single_split")]
        output_dir: PathBuf,

        /// Optional pipeline config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Rolling walk-forward evaluation
    WalkForward {
        /// Labeled decisions (NDJSON)
        #[arg(long)]
        input: PathBuf,

        /// Walk-forward report (JSON)
        #[arg(long, default_value = "results/walk_forward.json")]
        output: PathBuf,

        /// Optional pipeline config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn load_model_rows(input: &Path) -> Result<Vec<ModelRow>> {
    let records: Vec<LabeledRecord> = DataLoader::new(input)
        .load()
        .with_context(|| format!("Failed to read labeled rows from {}", input.display()))?;
    let rows = prepare_model_rows(&records);
    info!(labeled = records.len(), model_rows = rows.len(), "Prepared model rows");
    Ok(rows)
}

fn cmd_label(input: &Path, output: &Path, summary_path: Option<&Path>, config: &PipelineConfig) -> Result<()> {
    let rows: Vec<RawDecisionRow> = DataLoader::new(input)
        .load()
        .with_context(|| format!("Failed to read decisions from {}", input.display()))?;
    info!(rows = rows.len(), "Loaded decisions");

    let synthesizer = LabelSynthesizer::new(config.labels.clone());
    let labeled = synthesizer.label_rows(rows, &KeywordClassifier::default());
    let summary = LabelSummary::from_output(&labeled);

    write_ndjson_file(output, &labeled.records)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    if let Some(path) = summary_path {
        write_json_file(path, &summary).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    println!("{}", SEPARATOR);
    println!("Label Synthesis");
    println!("{}", SEPARATOR);
    println!("Input rows:          {}", summary.input_rows);
    println!("Prepared rows:       {}", summary.prepared_rows);
    println!("Dropped rows:        {}", summary.dropped_rows);
    println!("Series:              {}", summary.series_count);
    println!("Resolution-labeled:  {}", summary.resolution_labeled);
    println!("Censored:            {}", summary.censored);
    if let Some(rate) = summary.buy_now_rate {
        println!("Buy-now rate:        {:.1}%", rate * 100.0);
    }
    println!("Output:              {}", output.display());
    Ok(())
}

fn cmd_train(input: &Path, output_dir: &Path, config: &PipelineConfig) -> Result<()> {
    let rows = load_model_rows(input)?;
    let output = run_single_split(&rows, config).context("Single-split training failed")?;

    std::fs::create_dir_all(output_dir)?;
    write_json_file(output_dir.join("model_report.json"), &output.model_report)?;
    write_json_file(output_dir.join("model_artifact.json"), &output.artifact)?;
    write_json_file(output_dir.join("backtest_report.json"), &output.backtest_report)?;

    let test = &output.backtest_report.test;
    println!("{}", SEPARATOR);
    println!("Single-Split Backtest");
    println!("{}", SEPARATOR);
    println!(
        "Rows (train/valid/test): {}/{}/{}",
        output.model_report.train.rows, output.model_report.valid.rows, output.model_report.test.rows
    );
    println!("Segments:                {}", output.model_report.segments.len());
    println!("Threshold:               {:.2}", output.backtest_report.threshold);
    println!("Test mean relative PnL:  {:.4}", test.mean_relative_pnl);
    println!("Test total relative PnL: {:.4}", test.total_relative_pnl);
    println!("Oracle total:            {:.4}", test.oracle.total_relative_pnl);
    println!("Buy rate:                {:.1}%", test.buy_rate * 100.0);
    println!("Output:                  {}", output_dir.display());
    Ok(())
}

fn cmd_walk_forward(input: &Path, output: &Path, config: PipelineConfig) -> Result<()> {
    let rows = load_model_rows(input)?;
    let report = WalkForwardRunner::new(config)
        .run(&rows)
        .context("Walk-forward run failed")?;
    write_json_file(output, &report).with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{}", SEPARATOR);
    println!("{}", report.summary_text());
    println!("{}", SEPARATOR);
    println!("Output: {}", output.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("entry_timing=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Label {
            input,
            output,
            summary,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            cmd_label(&input, &output, summary.as_deref(), &config)?;
        }
        Commands::Train {
            input,
            output_dir,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            cmd_train(&input, &output_dir, &config)?;
        }
        Commands::WalkForward {
            input,
            output,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            cmd_walk_forward(&input, &output, config)?;
        }
    }

    Ok(())
}

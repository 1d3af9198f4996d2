use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use tennis_features::config::PipelineConfig;
use tennis_features::pipeline;

const DEFAULT_OUTPUT: &str = "data/processed_matches.csv";

/// Build pre-match features from a chronological list of tennis results.
#[derive(Debug, Parser)]
#[command(name = "tennis_features", version)]
struct Cli {
    /// Raw match CSV, or a directory to search for one
    #[arg(long, env = "TENNIS_FEATURES_INPUT")]
    input: PathBuf,

    /// Output path; `.xlsx` writes a workbook, anything else CSV
    #[arg(long, env = "TENNIS_FEATURES_OUTPUT", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    min_year: Option<i32>,

    #[arg(long)]
    rolling_matches: Option<usize>,

    #[arg(long)]
    rolling_surface_matches: Option<usize>,

    #[arg(long)]
    elo_k: Option<f64>,

    #[arg(long)]
    surface_elo_k: Option<f64>,

    #[arg(long)]
    elo_decay: Option<f64>,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(v) = self.min_year {
            cfg.min_year = v;
        }
        if let Some(v) = self.rolling_matches {
            cfg.window.matches = v;
        }
        if let Some(v) = self.rolling_surface_matches {
            cfg.window.surface_matches = v;
        }
        if let Some(v) = self.elo_k {
            cfg.rating.k = v;
        }
        if let Some(v) = self.surface_elo_k {
            cfg.rating.surface_k = v;
        }
        if let Some(v) = self.elo_decay {
            cfg.rating.decay = v;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = cli.pipeline_config()?;
    let summary = pipeline::run(&cfg, &cli.input, &cli.output)
        .with_context(|| format!("processing {}", cli.input.display()))?;

    println!(
        "Processed dataset with {} rows saved to {}",
        summary.rows_written,
        summary.output.display()
    );
    Ok(())
}

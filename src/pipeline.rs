use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::dataset::{self, LoadReport};
use crate::export;
use crate::features::{self, FeatureSet};

#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub load: LoadReport,
    pub matches_processed: usize,
    pub rows_written: usize,
    pub dropped_incomplete: usize,
}

/// Load, fold and write. Config and schema problems abort before any
/// feature state is built.
pub fn run(cfg: &PipelineConfig, input: &Path, output: &Path) -> Result<PipelineSummary> {
    cfg.validate().context("invalid pipeline config")?;

    let input = dataset::resolve_input(input)?;
    let (records, load) = dataset::load_matches(&input, cfg.min_year)?;

    let FeatureSet {
        rows,
        matches_processed,
        dropped_incomplete,
    } = features::build_features(&records, cfg);
    tracing::info!(
        matches = matches_processed,
        rows = rows.len(),
        dropped = dropped_incomplete,
        "built features"
    );

    export::write_features(output, &rows)?;

    Ok(PipelineSummary {
        input,
        output: output.to_path_buf(),
        load,
        matches_processed,
        rows_written: rows.len(),
        dropped_incomplete,
    })
}

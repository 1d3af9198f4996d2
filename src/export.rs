use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::records::{Cell, FEATURE_COLUMNS, FeatureRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Xlsx,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => OutputFormat::Xlsx,
            _ => OutputFormat::Csv,
        }
    }
}

/// Write rows to `path`, picking the format from the extension.
pub fn write_features(path: &Path, rows: &[FeatureRow]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    match OutputFormat::from_path(path) {
        OutputFormat::Csv => {
            let file = fs::File::create(path)
                .with_context(|| format!("create {}", path.display()))?;
            write_csv(file, rows)?;
        }
        OutputFormat::Xlsx => write_xlsx(path, rows)?,
    }
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote features");
    Ok(())
}

pub fn write_csv<W: Write>(out: W, rows: &[FeatureRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    if rows.is_empty() {
        wtr.write_record(FEATURE_COLUMNS)
            .context("write csv header")?;
    }
    for row in rows {
        wtr.serialize(row).context("write csv row")?;
    }
    wtr.flush().context("flush csv")?;
    Ok(())
}

pub fn write_xlsx(path: &Path, rows: &[FeatureRow]) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Features")?;
        write_rows(sheet, rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[FeatureRow]) -> Result<()> {
    for (col_idx, name) in FEATURE_COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, *name)
            .with_context(|| format!("write header {name}"))?;
    }
    for (idx, row) in rows.iter().enumerate() {
        let row_idx = (idx + 1) as u32;
        for (col_idx, cell) in row.cells().into_iter().enumerate() {
            let col_idx = col_idx as u16;
            let written = match cell {
                Cell::Text(s) => worksheet.write_string(row_idx, col_idx, s),
                Cell::Number(n) => worksheet.write_number(row_idx, col_idx, n),
                Cell::Empty => continue,
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

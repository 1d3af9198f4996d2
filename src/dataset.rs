use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use thiserror::Error;

use crate::records::{MatchRecord, Surface};

pub const REQUIRED_COLUMNS: [&str; 4] = ["player_1", "player_2", "winner", "date"];

static WTA_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^wta.*\.csv$").expect("file pattern is a valid regex"));

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset missing required columns: {missing:?}")]
    MissingColumns { missing: Vec<String> },
    #[error("no CSV files found under {}", root.display())]
    NoCsvFound { root: PathBuf },
    #[error("{} has no header row", path.display())]
    EmptyInput { path: PathBuf },
}

/// Why a raw row never reached the feature engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingPlayer,
    BadDate,
    BeforeMinYear,
    UnknownWinner,
    SelfMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub loaded: usize,
    pub missing_player: usize,
    pub bad_date: usize,
    pub before_min_year: usize,
    pub unknown_winner: usize,
    pub self_match: usize,
}

impl LoadReport {
    fn count(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MissingPlayer => self.missing_player += 1,
            SkipReason::BadDate => self.bad_date += 1,
            SkipReason::BeforeMinYear => self.before_min_year += 1,
            SkipReason::UnknownWinner => self.unknown_winner += 1,
            SkipReason::SelfMatch => self.self_match += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.rows_read - self.loaded
    }
}

/// Pick the CSV under `root` that looks most like the match table: files named
/// `wta*.csv` first, then names containing "match", then anything, and the
/// largest of those.
pub fn find_matches_csv(root: &Path) -> Result<PathBuf> {
    let mut candidates = Vec::new();
    collect_csv_files(root, &mut candidates)?;
    if candidates.is_empty() {
        return Err(DatasetError::NoCsvFound {
            root: root.to_path_buf(),
        }
        .into());
    }

    let wta = candidates
        .iter()
        .filter(|p| WTA_FILE.is_match(&file_name(p)))
        .cloned()
        .collect::<Vec<_>>();
    let named_match = candidates
        .iter()
        .filter(|p| file_name(p).to_lowercase().contains("match"))
        .cloned()
        .collect::<Vec<_>>();
    let preferred = if !wta.is_empty() {
        wta
    } else if !named_match.is_empty() {
        named_match
    } else {
        candidates
    };

    let mut best: Option<(u64, PathBuf)> = None;
    for path in preferred {
        let size = fs::metadata(&path)
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        if best.as_ref().is_none_or(|(s, _)| size > *s) {
            best = Some((size, path));
        }
    }
    best.map(|(_, p)| p).ok_or_else(|| {
        DatasetError::NoCsvFound {
            root: root.to_path_buf(),
        }
        .into()
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn collect_csv_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry.context("read dir entry")?.path());
    }
    paths.sort();
    for path in paths {
        if path.is_dir() {
            collect_csv_files(&path, out)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            out.push(path);
        }
    }
    Ok(())
}

/// A file is used as is; a directory is searched with [`find_matches_csv`].
pub fn resolve_input(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        find_matches_csv(path)
    } else {
        Ok(path.to_path_buf())
    }
}

pub fn load_matches(path: &Path, min_year: i32) -> Result<(Vec<MatchRecord>, LoadReport)> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let loaded = read_matches(file, min_year).with_context(|| format!("load {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        rows = loaded.1.rows_read,
        loaded = loaded.1.loaded,
        skipped = loaded.1.skipped(),
        "loaded matches"
    );
    Ok(loaded)
}

/// Decode raw rows into chronologically sorted [`MatchRecord`]s.
///
/// Missing required columns fail the whole load. Bad rows are skipped and
/// counted in the [`LoadReport`].
pub fn read_matches<R: Read>(reader: R, min_year: i32) -> Result<(Vec<MatchRecord>, LoadReport)> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers().context("read csv header")?.clone();
    if headers.is_empty() {
        return Err(DatasetError::EmptyInput {
            path: PathBuf::from("<reader>"),
        }
        .into());
    }
    let columns = Columns::new(&headers)?;

    let raw = rdr
        .records()
        .collect::<std::result::Result<Vec<StringRecord>, _>>()
        .context("read csv rows")?;

    // Rows are independent here; ordering only matters from the sort onward.
    let decoded = raw
        .par_iter()
        .enumerate()
        .map(|(idx, row)| decode_row(&columns, idx as u64, row, min_year))
        .collect::<Vec<_>>();

    let mut report = LoadReport {
        rows_read: raw.len(),
        ..LoadReport::default()
    };
    let mut records = Vec::with_capacity(decoded.len());
    for row in decoded {
        match row {
            Ok(record) => records.push(record),
            Err(reason) => report.count(reason),
        }
    }
    report.loaded = records.len();
    if report.skipped() > 0 {
        tracing::warn!(?report, "skipped degenerate rows");
    }

    sort_chronologically(&mut records);
    for (idx, record) in records.iter_mut().enumerate() {
        record.match_id = idx as u64;
    }
    Ok((records, report))
}

/// Order by date, keeping `match_id` order for matches on the same day.
pub fn sort_chronologically(records: &mut [MatchRecord]) {
    records.sort_by(|a, b| a.date.cmp(&b.date).then(a.match_id.cmp(&b.match_id)));
}

struct Columns {
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Result<Self> {
        let mut index = HashMap::new();
        for (i, raw) in headers.iter().enumerate() {
            let name = normalize_column(raw);
            index.entry(name).or_insert(i);
        }
        let missing = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !index.contains_key(**c))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(DatasetError::MissingColumns { missing }.into());
        }
        Ok(Self { index })
    }

    fn text<'r>(&self, row: &'r StringRecord, name: &str) -> Option<&'r str> {
        let v = row.get(*self.index.get(name)?)?.trim();
        (!v.is_empty()).then_some(v)
    }

    fn owned(&self, row: &StringRecord, name: &str) -> Option<String> {
        self.text(row, name).map(str::to_string)
    }

    fn number(&self, row: &StringRecord, name: &str) -> Option<f64> {
        self.text(row, name)?
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

fn normalize_column(raw: &str) -> String {
    let name = raw.trim().to_lowercase().replace(' ', "_");
    match name.as_str() {
        "player1" => "player_1".to_string(),
        "player2" => "player_2".to_string(),
        _ => name,
    }
}

fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_row(
    cols: &Columns,
    idx: u64,
    row: &StringRecord,
    min_year: i32,
) -> std::result::Result<MatchRecord, SkipReason> {
    let player_1 = cols.text(row, "player_1").map(normalize_name);
    let player_2 = cols.text(row, "player_2").map(normalize_name);
    let (Some(player_1), Some(player_2)) = (player_1, player_2) else {
        return Err(SkipReason::MissingPlayer);
    };
    if player_1 == player_2 {
        return Err(SkipReason::SelfMatch);
    }

    let date = cols
        .text(row, "date")
        .and_then(parse_date)
        .ok_or(SkipReason::BadDate)?;
    if date.year() < min_year {
        return Err(SkipReason::BeforeMinYear);
    }

    let winner = cols
        .text(row, "winner")
        .map(normalize_name)
        .filter(|w| *w == player_1 || *w == player_2)
        .ok_or(SkipReason::UnknownWinner)?;

    let surface_raw = cols.owned(row, "surface");
    let surface = surface_raw.as_deref().map_or(Surface::Unknown, Surface::parse);

    Ok(MatchRecord {
        match_id: idx,
        date,
        surface,
        surface_raw,
        player_1,
        player_2,
        winner,
        score: cols.owned(row, "score"),
        rank_1: cols.number(row, "rank_1"),
        rank_2: cols.number(row, "rank_2"),
        pts_1: cols.number(row, "pts_1"),
        pts_2: cols.number(row, "pts_2"),
        odd_1: cols.number(row, "odd_1"),
        odd_2: cols.number(row, "odd_2"),
        tournament: cols.owned(row, "tournament"),
        court: cols.owned(row, "court"),
        round: cols.owned(row, "round"),
        best_of: cols.owned(row, "best_of"),
    })
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}

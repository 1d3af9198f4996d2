use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Surface {
    Hard,
    Clay,
    Grass,
    Carpet,
    Unknown,
}

impl Surface {
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim().to_ascii_lowercase();
        if s.contains("hard") {
            Surface::Hard
        } else if s.contains("clay") {
            Surface::Clay
        } else if s.contains("grass") {
            Surface::Grass
        } else if s.contains("carpet") {
            Surface::Carpet
        } else {
            Surface::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Hard => "Hard",
            Surface::Clay => "Clay",
            Surface::Grass => "Grass",
            Surface::Carpet => "Carpet",
            Surface::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finished match as handed to the feature engine.
///
/// `player_1`/`player_2` keep the order of the source row; the winner can be
/// either of them. `surface` picks the rating and form bucket, while
/// `surface_raw` keeps the source text for the output table.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub match_id: u64,
    pub date: NaiveDate,
    pub surface: Surface,
    pub surface_raw: Option<String>,
    pub player_1: String,
    pub player_2: String,
    pub winner: String,
    pub score: Option<String>,
    pub rank_1: Option<f64>,
    pub rank_2: Option<f64>,
    pub pts_1: Option<f64>,
    pub pts_2: Option<f64>,
    pub odd_1: Option<f64>,
    pub odd_2: Option<f64>,
    pub tournament: Option<String>,
    pub court: Option<String>,
    pub round: Option<String>,
    pub best_of: Option<String>,
}

impl MatchRecord {
    /// Minimal record with every optional field empty.
    pub fn new(
        match_id: u64,
        date: NaiveDate,
        surface: Surface,
        player_1: impl Into<String>,
        player_2: impl Into<String>,
        winner: impl Into<String>,
    ) -> Self {
        Self {
            match_id,
            date,
            surface,
            surface_raw: None,
            player_1: player_1.into(),
            player_2: player_2.into(),
            winner: winner.into(),
            score: None,
            rank_1: None,
            rank_2: None,
            pts_1: None,
            pts_2: None,
            odd_1: None,
            odd_2: None,
            tournament: None,
            court: None,
            round: None,
            best_of: None,
        }
    }

    pub fn with_score(mut self, score: impl Into<String>) -> Self {
        self.score = Some(score.into());
        self
    }

    pub fn with_surface_text(mut self, raw: impl Into<String>) -> Self {
        self.surface_raw = Some(raw.into());
        self
    }

    /// Surface as written to the output: the source text when there was one,
    /// otherwise the bucket name for known surfaces.
    pub fn surface_text(&self) -> Option<String> {
        match (&self.surface_raw, self.surface) {
            (Some(raw), _) => Some(raw.clone()),
            (None, Surface::Unknown) => None,
            (None, surface) => Some(surface.to_string()),
        }
    }

    pub fn with_ranks(mut self, rank_1: Option<f64>, rank_2: Option<f64>) -> Self {
        self.rank_1 = rank_1;
        self.rank_2 = rank_2;
        self
    }

    pub fn with_points(mut self, pts_1: Option<f64>, pts_2: Option<f64>) -> Self {
        self.pts_1 = pts_1;
        self.pts_2 = pts_2;
        self
    }

    pub fn player_1_won(&self) -> bool {
        self.winner == self.player_1
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Column order of the exported feature table.
pub const FEATURE_COLUMNS: [&str; 29] = [
    "tournament",
    "date",
    "court",
    "surface",
    "round",
    "best_of",
    "player_1",
    "player_2",
    "winner",
    "score",
    "label",
    "year",
    "elo_diff",
    "surface_elo_diff",
    "form_diff",
    "surface_form_diff",
    "games_margin_diff",
    "sets_margin_diff",
    "rest_days_diff",
    "tiebreak_rate_diff",
    "rank_trend_diff",
    "points_trend_diff",
    "h2h_advantage",
    "last_winner_indicator",
    "surface_winrate_adv",
    "last_winner",
    "rank_diff",
    "pts_diff",
    "odd_diff",
];

/// One output row: pass-through metadata, the label and the pre-match
/// difference features (player 1 minus player 2).
///
/// Field order matches [`FEATURE_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub tournament: Option<String>,
    pub date: NaiveDate,
    pub court: Option<String>,
    pub surface: Option<String>,
    pub round: Option<String>,
    pub best_of: Option<String>,
    pub player_1: String,
    pub player_2: String,
    pub winner: String,
    pub score: Option<String>,
    pub label: u8,
    pub year: i32,
    pub elo_diff: f64,
    pub surface_elo_diff: f64,
    pub form_diff: f64,
    pub surface_form_diff: f64,
    pub games_margin_diff: f64,
    pub sets_margin_diff: f64,
    pub rest_days_diff: f64,
    pub tiebreak_rate_diff: f64,
    pub rank_trend_diff: f64,
    pub points_trend_diff: f64,
    pub h2h_advantage: f64,
    pub last_winner_indicator: i8,
    pub surface_winrate_adv: f64,
    pub last_winner: u8,
    pub rank_diff: Option<f64>,
    pub pts_diff: Option<f64>,
    pub odd_diff: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl FeatureRow {
    /// Cells in [`FEATURE_COLUMNS`] order, for writers that are not serde driven.
    pub fn cells(&self) -> Vec<Cell> {
        fn text(v: &Option<String>) -> Cell {
            v.as_ref().map_or(Cell::Empty, |s| Cell::Text(s.clone()))
        }
        fn num(v: Option<f64>) -> Cell {
            v.map_or(Cell::Empty, Cell::Number)
        }

        vec![
            text(&self.tournament),
            Cell::Text(self.date.format("%Y-%m-%d").to_string()),
            text(&self.court),
            text(&self.surface),
            text(&self.round),
            text(&self.best_of),
            Cell::Text(self.player_1.clone()),
            Cell::Text(self.player_2.clone()),
            Cell::Text(self.winner.clone()),
            text(&self.score),
            Cell::Number(f64::from(self.label)),
            Cell::Number(f64::from(self.year)),
            Cell::Number(self.elo_diff),
            Cell::Number(self.surface_elo_diff),
            Cell::Number(self.form_diff),
            Cell::Number(self.surface_form_diff),
            Cell::Number(self.games_margin_diff),
            Cell::Number(self.sets_margin_diff),
            Cell::Number(self.rest_days_diff),
            Cell::Number(self.tiebreak_rate_diff),
            Cell::Number(self.rank_trend_diff),
            Cell::Number(self.points_trend_diff),
            Cell::Number(self.h2h_advantage),
            Cell::Number(f64::from(self.last_winner_indicator)),
            Cell::Number(self.surface_winrate_adv),
            Cell::Number(f64::from(self.last_winner)),
            num(self.rank_diff),
            num(self.pts_diff),
            num(self.odd_diff),
        ]
    }
}

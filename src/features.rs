use crate::config::PipelineConfig;
use crate::head_to_head::HeadToHeadTracker;
use crate::rating::RatingEngine;
use crate::records::{FeatureRow, MatchRecord};
use crate::rolling::{FormSnapshot, HistoryEntry, RollingAggregator};
use crate::score::{ScoreLine, decode_score};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub rating: f64,
    pub surface_rating: f64,
    pub form: FormSnapshot,
}

/// Everything known about a match before it was played.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSnapshot {
    pub match_id: u64,
    pub player_1: PlayerSnapshot,
    pub player_2: PlayerSnapshot,
    pub h2h_advantage: f64,
    pub last_winner_indicator: i8,
    /// Decoded result of this match. Used for the state update only.
    pub score: ScoreLine,
}

impl MatchSnapshot {
    /// Output row for `record`, or `None` when a required difference is null
    /// because one of the players lacks history.
    ///
    /// `rank_diff`, `pts_diff` and `odd_diff` stay optional and never drop a
    /// row, unlike a `dropna` over every column.
    pub fn to_row(&self, record: &MatchRecord) -> Option<FeatureRow> {
        let (a, b) = (&self.player_1.form, &self.player_2.form);
        let surface_form_diff = diff(a.surface_form, b.surface_form)?;

        Some(FeatureRow {
            tournament: record.tournament.clone(),
            date: record.date,
            court: record.court.clone(),
            surface: record.surface_text(),
            round: record.round.clone(),
            best_of: record.best_of.clone(),
            player_1: record.player_1.clone(),
            player_2: record.player_2.clone(),
            winner: record.winner.clone(),
            score: record.score.clone(),
            label: u8::from(record.player_1_won()),
            year: record.year(),
            elo_diff: self.player_1.rating - self.player_2.rating,
            surface_elo_diff: self.player_1.surface_rating - self.player_2.surface_rating,
            form_diff: diff(a.form, b.form)?,
            surface_form_diff,
            games_margin_diff: diff(a.game_margin, b.game_margin)?,
            sets_margin_diff: diff(a.set_margin, b.set_margin)?,
            rest_days_diff: a.rest_days - b.rest_days,
            tiebreak_rate_diff: diff(a.tiebreak_rate, b.tiebreak_rate)?,
            rank_trend_diff: diff(a.rank_trend, b.rank_trend)?,
            points_trend_diff: diff(a.points_trend, b.points_trend)?,
            h2h_advantage: self.h2h_advantage,
            last_winner_indicator: self.last_winner_indicator,
            surface_winrate_adv: surface_form_diff.clamp(-1.0, 1.0),
            last_winner: u8::from(self.last_winner_indicator > 0),
            rank_diff: diff(record.rank_1, record.rank_2),
            pts_diff: diff(record.pts_1, record.pts_2),
            odd_diff: diff(record.odd_1, record.odd_2),
        })
    }
}

fn diff(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

/// Walks matches one at a time, reading every feature before the match's
/// own result is applied to ratings, form and head-to-head state.
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    ratings: RatingEngine,
    form: RollingAggregator,
    h2h: HeadToHeadTracker,
}

impl FeatureEngine {
    pub fn new(cfg: &PipelineConfig) -> Self {
        Self {
            ratings: RatingEngine::new(cfg.rating),
            form: RollingAggregator::new(cfg.window),
            h2h: HeadToHeadTracker::new(),
        }
    }

    pub fn ratings(&self) -> &RatingEngine {
        &self.ratings
    }

    pub fn form(&self) -> &RollingAggregator {
        &self.form
    }

    pub fn head_to_head(&self) -> &HeadToHeadTracker {
        &self.h2h
    }

    pub fn step(&mut self, m: &MatchRecord) -> MatchSnapshot {
        // Year-boundary decay belongs to the state this match is rated on.
        self.ratings.advance_to(m.date);

        let snapshot = MatchSnapshot {
            match_id: m.match_id,
            player_1: self.player_snapshot(m, &m.player_1),
            player_2: self.player_snapshot(m, &m.player_2),
            h2h_advantage: self.h2h.advantage(&m.player_1, &m.player_2),
            last_winner_indicator: self.h2h.last_meeting_direction(&m.player_1, &m.player_2),
            score: decode_score(m.score.as_deref()),
        };

        self.apply(m, &snapshot.score);
        snapshot
    }

    fn player_snapshot(&self, m: &MatchRecord, player: &str) -> PlayerSnapshot {
        let (rating, surface_rating) = self.ratings.rating_of(player, m.surface);
        PlayerSnapshot {
            rating,
            surface_rating,
            form: self.form.snapshot(player, m.surface, m.date),
        }
    }

    fn apply(&mut self, m: &MatchRecord, score: &ScoreLine) {
        self.ratings
            .apply_result(&m.player_1, &m.player_2, m.surface, &m.winner, m.date);

        let p1_won = m.player_1_won();
        let games = score.game_margin() as f64;
        let sets = score.set_margin() as f64;
        let tie_breaks = f64::from(score.tie_breaks);
        self.form.record(
            &m.player_1,
            m.surface,
            HistoryEntry {
                won: p1_won,
                game_margin: games,
                set_margin: sets,
                tie_breaks,
                rank: m.rank_1,
                points: m.pts_1,
                date: m.date,
            },
        );
        self.form.record(
            &m.player_2,
            m.surface,
            HistoryEntry {
                won: !p1_won,
                game_margin: -games,
                set_margin: -sets,
                tie_breaks,
                rank: m.rank_2,
                points: m.pts_2,
                date: m.date,
            },
        );

        self.h2h.record(&m.player_1, &m.player_2, &m.winner);
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub rows: Vec<FeatureRow>,
    pub matches_processed: usize,
    /// Matches whose row was dropped for insufficient history.
    pub dropped_incomplete: usize,
}

/// Fold `records` in the order given. Sort with
/// [`sort_chronologically`](crate::dataset::sort_chronologically) first.
pub fn build_features(records: &[MatchRecord], cfg: &PipelineConfig) -> FeatureSet {
    let mut engine = FeatureEngine::new(cfg);
    let mut out = FeatureSet::default();
    for m in records {
        let snapshot = engine.step(m);
        out.matches_processed += 1;
        match snapshot.to_row(m) {
            Some(row) => out.rows.push(row),
            None => out.dropped_incomplete += 1,
        }
    }
    tracing::debug!(
        matches = out.matches_processed,
        rows = out.rows.len(),
        dropped = out.dropped_incomplete,
        "feature fold complete"
    );
    out
}

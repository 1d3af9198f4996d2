use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::WindowConfig;
use crate::records::Surface;

/// One finished match from a single player's point of view. Margins are
/// signed for this player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryEntry {
    pub won: bool,
    pub game_margin: f64,
    pub set_margin: f64,
    pub tie_breaks: f64,
    pub rank: Option<f64>,
    pub points: Option<f64>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
struct PlayerHistory {
    entries: Vec<HistoryEntry>,
    by_surface: HashMap<Surface, Vec<f64>>,
}

/// Pre-match form of one player. `None` means not enough prior matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormSnapshot {
    pub form: Option<f64>,
    pub surface_form: Option<f64>,
    pub game_margin: Option<f64>,
    pub set_margin: Option<f64>,
    pub tiebreak_rate: Option<f64>,
    pub rest_days: f64,
    pub rank_trend: Option<f64>,
    pub points_trend: Option<f64>,
}

/// Per-player match history with trailing-window statistics.
///
/// Histories only grow; windows are taken as slices off the end. Callers
/// take a [`snapshot`](Self::snapshot) before [`record`](Self::record)ing the
/// same match so the current result never enters its own window.
#[derive(Debug, Clone)]
pub struct RollingAggregator {
    cfg: WindowConfig,
    players: HashMap<String, PlayerHistory>,
}

impl RollingAggregator {
    pub fn new(cfg: WindowConfig) -> Self {
        Self {
            cfg,
            players: HashMap::new(),
        }
    }

    pub fn matches_recorded(&self, player: &str) -> usize {
        self.players.get(player).map_or(0, |h| h.entries.len())
    }

    pub fn snapshot(&self, player: &str, surface: Surface, as_of: NaiveDate) -> FormSnapshot {
        let empty: &[HistoryEntry] = &[];
        let history = self.players.get(player);
        let entries = history.map_or(empty, |h| h.entries.as_slice());
        let surface_outcomes = history
            .and_then(|h| h.by_surface.get(&surface))
            .map_or(&[][..], |v| v.as_slice());

        let (window, min) = (self.cfg.matches, self.cfg.min_matches);

        FormSnapshot {
            form: window_mean(entries, window, min, |e| if e.won { 1.0 } else { 0.0 }),
            surface_form: trailing_mean(
                surface_outcomes,
                self.cfg.surface_matches,
                self.cfg.surface_min_matches,
            ),
            game_margin: window_mean(entries, window, min, |e| e.game_margin),
            set_margin: window_mean(entries, window, min, |e| e.set_margin),
            tiebreak_rate: window_mean(entries, window, min, |e| e.tie_breaks),
            rest_days: self.rest_days(entries.last(), as_of),
            rank_trend: lagged_change(entries, |e| e.rank),
            points_trend: lagged_change(entries, |e| e.points),
        }
    }

    pub fn record(&mut self, player: &str, surface: Surface, entry: HistoryEntry) {
        let history = self.players.entry(player.to_string()).or_default();
        history
            .by_surface
            .entry(surface)
            .or_default()
            .push(if entry.won { 1.0 } else { 0.0 });
        history.entries.push(entry);
    }

    fn rest_days(&self, previous: Option<&HistoryEntry>, as_of: NaiveDate) -> f64 {
        let days = previous.map_or(self.cfg.rest_default_days, |prev| {
            (as_of - prev.date).num_days()
        });
        days.clamp(0, self.cfg.rest_cap_days.max(0)) as f64
    }
}

fn tail<T>(values: &[T], window: usize) -> &[T] {
    &values[values.len().saturating_sub(window)..]
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    sum / n as f64
}

/// Mean of the last `window` values, or `None` with fewer than `min` values.
pub fn trailing_mean(values: &[f64], window: usize, min: usize) -> Option<f64> {
    if values.len() < min || values.is_empty() {
        return None;
    }
    Some(mean(tail(values, window).iter().copied()))
}

fn window_mean(
    entries: &[HistoryEntry],
    window: usize,
    min: usize,
    value: fn(&HistoryEntry) -> f64,
) -> Option<f64> {
    if entries.len() < min || entries.is_empty() {
        return None;
    }
    Some(mean(tail(entries, window).iter().map(value)))
}

/// Change between the entries two and three matches back. With prior
/// entries `[.., e3, e2, e1]` this is `e2 - e3`.
fn lagged_change(entries: &[HistoryEntry], value: fn(&HistoryEntry) -> Option<f64>) -> Option<f64> {
    let n = entries.len();
    if n < 3 {
        return None;
    }
    let two_back = value(&entries[n - 2])?;
    let three_back = value(&entries[n - 3])?;
    Some(two_back - three_back)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    fn entry(won: bool, date: NaiveDate) -> HistoryEntry {
        HistoryEntry {
            won,
            game_margin: if won { 4.0 } else { -2.0 },
            set_margin: if won { 2.0 } else { -1.0 },
            tie_breaks: 1.0,
            rank: None,
            points: None,
            date,
        }
    }

    #[test]
    fn trailing_mean_gates_on_min_and_slices_window() {
        assert_eq!(trailing_mean(&[], 10, 3), None);
        assert_eq!(trailing_mean(&[1.0, 0.0], 10, 3), None);
        assert_eq!(trailing_mean(&[1.0, 0.0, 1.0], 10, 3), Some(2.0 / 3.0));
        assert_eq!(trailing_mean(&[0.0, 0.0, 1.0, 1.0], 2, 1), Some(1.0));
    }

    #[test]
    fn form_is_null_below_minimum_and_mean_at_minimum() {
        let mut agg = RollingAggregator::new(WindowConfig::default());
        agg.record("A", Surface::Hard, entry(true, day(1)));
        agg.record("A", Surface::Hard, entry(false, day(2)));

        let snap = agg.snapshot("A", Surface::Hard, day(3));
        assert_eq!(snap.form, None);
        assert_eq!(snap.game_margin, None);
        assert_eq!(snap.tiebreak_rate, None);
        assert_eq!(snap.surface_form, Some(0.5));

        agg.record("A", Surface::Hard, entry(true, day(3)));
        let snap = agg.snapshot("A", Surface::Hard, day(4));
        assert_eq!(snap.form, Some(2.0 / 3.0));
        assert_eq!(snap.game_margin, Some(2.0));
        assert_eq!(snap.set_margin, Some(1.0));
        assert_eq!(snap.tiebreak_rate, Some(1.0));
    }

    #[test]
    fn window_keeps_only_most_recent_matches() {
        let mut agg = RollingAggregator::new(WindowConfig {
            matches: 3,
            min_matches: 1,
            ..WindowConfig::default()
        });
        for d in 1..=5 {
            agg.record("A", Surface::Clay, entry(d > 2, day(d)));
        }
        assert_eq!(agg.snapshot("A", Surface::Clay, day(6)).form, Some(1.0));
    }

    #[test]
    fn surface_form_is_scoped_to_surface() {
        let mut agg = RollingAggregator::new(WindowConfig::default());
        agg.record("A", Surface::Clay, entry(true, day(1)));
        agg.record("A", Surface::Clay, entry(true, day(2)));
        agg.record("A", Surface::Grass, entry(false, day(3)));

        assert_eq!(agg.snapshot("A", Surface::Clay, day(4)).surface_form, Some(1.0));
        assert_eq!(agg.snapshot("A", Surface::Grass, day(4)).surface_form, None);
        assert_eq!(agg.snapshot("A", Surface::Hard, day(4)).surface_form, None);
    }

    #[test]
    fn rest_days_default_and_clamp() {
        let mut agg = RollingAggregator::new(WindowConfig::default());
        assert_eq!(agg.snapshot("A", Surface::Hard, day(1)).rest_days, 30.0);

        agg.record("A", Surface::Hard, entry(true, day(1)));
        assert_eq!(agg.snapshot("A", Surface::Hard, day(1)).rest_days, 0.0);
        assert_eq!(agg.snapshot("A", Surface::Hard, day(8)).rest_days, 7.0);

        let later = NaiveDate::from_ymd_opt(2020, 9, 1).unwrap();
        assert_eq!(agg.snapshot("A", Surface::Hard, later).rest_days, 60.0);
    }

    #[test]
    fn negative_rest_cap_does_not_panic() {
        let mut agg = RollingAggregator::new(WindowConfig {
            rest_cap_days: -1,
            ..WindowConfig::default()
        });
        assert_eq!(agg.snapshot("A", Surface::Hard, day(1)).rest_days, 0.0);
        agg.record("A", Surface::Hard, entry(true, day(1)));
        assert_eq!(agg.snapshot("A", Surface::Hard, day(9)).rest_days, 0.0);
    }

    #[test]
    fn rank_trend_uses_second_and_third_previous_matches() {
        let mut agg = RollingAggregator::new(WindowConfig::default());
        for (d, rank) in [(1, 50.0), (2, 40.0)] {
            agg.record(
                "A",
                Surface::Hard,
                HistoryEntry {
                    rank: Some(rank),
                    points: Some(1000.0 + rank),
                    ..entry(true, day(d))
                },
            );
        }
        assert_eq!(agg.snapshot("A", Surface::Hard, day(3)).rank_trend, None);

        agg.record(
            "A",
            Surface::Hard,
            HistoryEntry {
                rank: Some(10.0),
                points: None,
                ..entry(true, day(3))
            },
        );
        let snap = agg.snapshot("A", Surface::Hard, day(4));
        assert_eq!(snap.rank_trend, Some(-10.0));
        assert_eq!(snap.points_trend, Some(-10.0));

        // A missing value in the lagged pair makes the trend null.
        agg.record("A", Surface::Hard, entry(true, day(4)));
        let snap = agg.snapshot("A", Surface::Hard, day(5));
        assert_eq!(snap.rank_trend, Some(-30.0));
        assert_eq!(snap.points_trend, None);
    }

    #[test]
    fn unknown_player_snapshot_is_empty() {
        let agg = RollingAggregator::new(WindowConfig::default());
        let snap = agg.snapshot("ghost", Surface::Hard, day(1));
        assert_eq!(snap.form, None);
        assert_eq!(snap.surface_form, None);
        assert_eq!(snap.rank_trend, None);
        assert_eq!(snap.rest_days, 30.0);
        assert_eq!(agg.matches_recorded("ghost"), 0);
    }
}

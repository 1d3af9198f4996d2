use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::config::RatingConfig;
use crate::records::Surface;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRating {
    pub global: f64,
    pub surfaces: HashMap<Surface, f64>,
}

impl PlayerRating {
    fn new(baseline: f64) -> Self {
        Self {
            global: baseline,
            surfaces: HashMap::new(),
        }
    }
}

/// Global and per-surface Elo ratings for every player seen so far.
#[derive(Debug, Clone)]
pub struct RatingEngine {
    cfg: RatingConfig,
    players: HashMap<String, PlayerRating>,
    last_year: Option<i32>,
}

impl RatingEngine {
    pub fn new(cfg: RatingConfig) -> Self {
        Self {
            cfg,
            players: HashMap::new(),
            last_year: None,
        }
    }

    /// `(global, surface)` rating; baseline for anything not seen yet.
    pub fn rating_of(&self, player: &str, surface: Surface) -> (f64, f64) {
        let Some(p) = self.players.get(player) else {
            return (self.cfg.baseline, self.cfg.baseline);
        };
        let surface_rating = p
            .surfaces
            .get(&surface)
            .copied()
            .unwrap_or(self.cfg.baseline);
        (p.global, surface_rating)
    }

    pub fn known_players(&self) -> usize {
        self.players.len()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.last_year
    }

    /// Pull every known rating toward the baseline when `date` falls in a later
    /// calendar year than the last one processed. Must run before ratings are
    /// read for a match in the new year.
    pub fn advance_to(&mut self, date: NaiveDate) {
        let year = date.year();
        if let Some(last) = self.last_year
            && year > last
        {
            self.decay(year - last);
        }
        if self.last_year.is_none_or(|last| year > last) {
            self.last_year = Some(year);
        }
    }

    fn decay(&mut self, year_gap: i32) {
        let baseline = self.cfg.baseline;
        let factor = (-self.cfg.decay * f64::from(year_gap)).exp();
        for p in self.players.values_mut() {
            p.global = baseline + (p.global - baseline) * factor;
            for r in p.surfaces.values_mut() {
                *r = baseline + (*r - baseline) * factor;
            }
        }
    }

    pub fn apply_result(
        &mut self,
        player_1: &str,
        player_2: &str,
        surface: Surface,
        winner: &str,
        as_of: NaiveDate,
    ) {
        self.advance_to(as_of);

        let (r1, s1) = self.rating_of(player_1, surface);
        let (r2, s2) = self.rating_of(player_2, surface);
        let outcome = if winner == player_1 { 1.0 } else { 0.0 };

        // Player 2's change is written against the complemented expectation
        // rather than as the negation of player 1's change.
        let expected = expected_score(r1, r2);
        let new_r1 = r1 + self.cfg.k * (outcome - expected);
        let new_r2 = r2 + self.cfg.k * ((1.0 - outcome) - (1.0 - expected));

        let expected_surface = expected_score(s1, s2);
        let new_s1 = s1 + self.cfg.surface_k * (outcome - expected_surface);
        let new_s2 = s2 + self.cfg.surface_k * ((1.0 - outcome) - (1.0 - expected_surface));

        let p1 = self.entry(player_1);
        p1.global = new_r1;
        p1.surfaces.insert(surface, new_s1);
        let p2 = self.entry(player_2);
        p2.global = new_r2;
        p2.surfaces.insert(surface, new_s2);
    }

    fn entry(&mut self, player: &str) -> &mut PlayerRating {
        let baseline = self.cfg.baseline;
        self.players
            .entry(player.to_string())
            .or_insert_with(|| PlayerRating::new(baseline))
    }
}

/// Logistic expectation that a player rated `r_a` beats one rated `r_b`.
pub fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((r_b - r_a) / 400.0))
}

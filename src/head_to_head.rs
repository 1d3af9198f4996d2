use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PairRecord {
    wins: u32,
    // +1 if the row player won the last meeting, -1 if the column player did.
    last: i8,
}

/// Win counts and last-meeting direction for every ordered pair of players.
#[derive(Debug, Clone, Default)]
pub struct HeadToHeadTracker {
    pairs: HashMap<String, HashMap<String, PairRecord>>,
}

impl HeadToHeadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, a: &str, b: &str) -> PairRecord {
        self.pairs
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or_default()
    }

    fn entry(&mut self, a: &str, b: &str) -> &mut PairRecord {
        self.pairs
            .entry(a.to_string())
            .or_default()
            .entry(b.to_string())
            .or_default()
    }

    pub fn wins(&self, player: &str, opponent: &str) -> u32 {
        self.get(player, opponent).wins
    }

    /// `(wins - losses) / meetings` from `player_1`'s side, 0.0 if they never met.
    pub fn advantage(&self, player_1: &str, player_2: &str) -> f64 {
        let wins = f64::from(self.wins(player_1, player_2));
        let losses = f64::from(self.wins(player_2, player_1));
        let total = wins + losses;
        if total > 0.0 {
            (wins - losses) / total
        } else {
            0.0
        }
    }

    /// +1 if `player_1` won the last meeting, -1 if `player_2` did, 0 if none.
    pub fn last_meeting_direction(&self, player_1: &str, player_2: &str) -> i8 {
        self.get(player_1, player_2).last
    }

    pub fn record(&mut self, player_1: &str, player_2: &str, winner: &str) {
        let p1_won = winner == player_1;
        let (w, l) = if p1_won {
            (player_1, player_2)
        } else {
            (player_2, player_1)
        };
        let forward = self.entry(w, l);
        forward.wins += 1;
        forward.last = 1;
        self.entry(l, w).last = -1;
    }
}

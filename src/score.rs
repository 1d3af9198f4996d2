use once_cell::sync::Lazy;
use regex::Regex;

static SET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)-(\d+)").expect("set pattern is a valid regex"));

/// Games and sets won per side, decoded from a compact score such as
/// `"6-4 3-6 7-6(5)"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreLine {
    pub games_1: u32,
    pub games_2: u32,
    pub sets_1: u32,
    pub sets_2: u32,
    /// Sets where either side reached 7 games. This also counts 7-5 sets, so
    /// it overestimates the number of tie-breaks actually played.
    pub tie_breaks: u32,
}

impl ScoreLine {
    pub fn game_margin(&self) -> i64 {
        i64::from(self.games_1) - i64::from(self.games_2)
    }

    pub fn set_margin(&self) -> i64 {
        i64::from(self.sets_1) - i64::from(self.sets_2)
    }
}

/// Decode a score token. Missing scores, walkovers and retirements decode to
/// all zeros; text that is not a `games-games` pair is ignored.
pub fn decode_score(raw: Option<&str>) -> ScoreLine {
    let Some(raw) = raw else {
        return ScoreLine::default();
    };
    let raw = raw.trim();
    if raw.is_empty() || is_walkover_or_retirement(raw) {
        return ScoreLine::default();
    }

    let mut line = ScoreLine::default();
    for caps in SET_PATTERN.captures_iter(raw) {
        let (Ok(g1), Ok(g2)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            continue;
        };
        line.games_1 = line.games_1.saturating_add(g1);
        line.games_2 = line.games_2.saturating_add(g2);
        if g1 > g2 {
            line.sets_1 += 1;
        } else if g2 > g1 {
            line.sets_2 += 1;
        }
        if g1.max(g2) >= 7 {
            line.tie_breaks += 1;
        }
    }
    line
}

fn is_walkover_or_retirement(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    lower.contains("w/o")
        || lower.contains("walkover")
        || lower.contains("ret")
        || lower.contains("def.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_straight_sets() {
        let line = decode_score(Some("6-4 6-3"));
        assert_eq!(
            line,
            ScoreLine {
                games_1: 12,
                games_2: 7,
                sets_1: 2,
                sets_2: 0,
                tie_breaks: 0,
            }
        );
        assert_eq!(line.game_margin(), 5);
        assert_eq!(line.set_margin(), 2);
    }

    #[test]
    fn counts_seven_game_sets_as_tie_breaks() {
        let line = decode_score(Some("7-6(4) 3-6 7-5"));
        assert_eq!(line.games_1, 17);
        assert_eq!(line.games_2, 17);
        assert_eq!(line.sets_1, 2);
        assert_eq!(line.sets_2, 1);
        // 7-5 is not a tie-break but is counted as one.
        assert_eq!(line.tie_breaks, 2);
    }

    #[test]
    fn degenerate_tokens_are_zero() {
        assert_eq!(decode_score(None), ScoreLine::default());
        assert_eq!(decode_score(Some("")), ScoreLine::default());
        assert_eq!(decode_score(Some("W/O")), ScoreLine::default());
        assert_eq!(decode_score(Some("Walkover")), ScoreLine::default());
        assert_eq!(decode_score(Some("6-2 2-1 RET")), ScoreLine::default());
        assert_eq!(decode_score(Some("n/a")), ScoreLine::default());
    }

    #[test]
    fn unmatched_text_is_ignored() {
        let line = decode_score(Some("score: 6-0, then ?? 1-6"));
        assert_eq!(line.sets_1, 1);
        assert_eq!(line.sets_2, 1);
        assert_eq!(line.games_1, 7);
        assert_eq!(line.games_2, 6);
    }

    #[test]
    fn even_set_counts_for_nobody() {
        let line = decode_score(Some("6-6"));
        assert_eq!(line.sets_1, 0);
        assert_eq!(line.sets_2, 0);
        assert_eq!(line.tie_breaks, 0);
    }
}

//! Score: ordered sets with optional tiebreaks, plus match-up format parsing.

use crate::models::match_up::Side;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One set (or, for TEAM match-ups, the aggregated tie value).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SetScore {
    pub side_1: Option<u32>,
    pub side_2: Option<u32>,
    pub side_1_tiebreak: Option<u32>,
    pub side_2_tiebreak: Option<u32>,
}

impl SetScore {
    pub fn new(side_1: u32, side_2: u32) -> Self {
        Self {
            side_1: Some(side_1),
            side_2: Some(side_2),
            ..Self::default()
        }
    }

    pub fn has_value(&self) -> bool {
        self.side_1.is_some()
            || self.side_2.is_some()
            || self.side_1_tiebreak.is_some()
            || self.side_2_tiebreak.is_some()
    }

    /// Side leading the set; ties (including tiebreak) have no winner.
    pub fn winner(&self) -> Option<Side> {
        let (a, b) = (self.side_1.unwrap_or(0), self.side_2.unwrap_or(0));
        if a != b {
            return Some(if a > b { Side::One } else { Side::Two });
        }
        match (self.side_1_tiebreak, self.side_2_tiebreak) {
            (Some(x), Some(y)) if x != y => Some(if x > y { Side::One } else { Side::Two }),
            _ => None,
        }
    }
}

/// Score of a match-up as an ordered list of sets.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub sets: Vec<SetScore>,
}

impl Score {
    pub fn from_sets(sets: &[(u32, u32)]) -> Self {
        Self {
            sets: sets.iter().map(|&(a, b)| SetScore::new(a, b)).collect(),
        }
    }

    /// True when at least one set records any value.
    pub fn has_value(&self) -> bool {
        self.sets.iter().any(SetScore::has_value)
    }

    /// Sets won by each side, `[side 1, side 2]`.
    pub fn sets_won(&self) -> [u32; 2] {
        let mut won = [0, 0];
        for set in &self.sets {
            if let Some(side) = set.winner() {
                won[side.index()] += 1;
            }
        }
        won
    }

    /// Winner implied by the score for a best-of-`best_of` format, if decided.
    pub fn decided_winner(&self, best_of: u32) -> Option<Side> {
        let needed = best_of / 2 + 1;
        let [one, two] = self.sets_won();
        if one >= needed && one > two {
            Some(Side::One)
        } else if two >= needed && two > one {
            Some(Side::Two)
        } else {
            None
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for set in self.sets.iter().filter(|s| s.has_value()) {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{}-{}", set.side_1.unwrap_or(0), set.side_2.unwrap_or(0))?;
            match (set.side_1_tiebreak, set.side_2_tiebreak) {
                (Some(a), Some(b)) => write!(f, "({})", a.min(b))?,
                (Some(a), None) | (None, Some(a)) => write!(f, "({a})")?,
                (None, None) => {}
            }
        }
        Ok(())
    }
}

/// Error parsing a score string such as `6-3 7-6(4)`.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("invalid score: {0}")]
pub struct ParseScoreError(pub String);

impl FromStr for Score {
    type Err = ParseScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut sets = Vec::new();
        for token in s.split_whitespace() {
            let bad = || ParseScoreError(token.to_string());
            let (games, tiebreak) = match token.split_once('(') {
                Some((games, rest)) => {
                    let loser_points: u32 = rest.trim_end_matches(')').parse().map_err(|_| bad())?;
                    (games, Some(loser_points))
                }
                None => (token, None),
            };
            let (a, b) = games.split_once('-').ok_or_else(bad)?;
            let a: u32 = a.parse().map_err(|_| bad())?;
            let b: u32 = b.parse().map_err(|_| bad())?;
            let mut set = SetScore::new(a, b);
            if let Some(loser_points) = tiebreak {
                // Only the loser's tiebreak points are written; the winner reached 7 or won by two.
                let winner_points = (loser_points + 2).max(7);
                let (one, two) = if a > b {
                    (winner_points, loser_points)
                } else {
                    (loser_points, winner_points)
                };
                set.side_1_tiebreak = Some(one);
                set.side_2_tiebreak = Some(two);
            }
            sets.push(set);
        }
        Ok(Score { sets })
    }
}

/// Best-of count declared by a match-up format code like `SET3-S:6/TB7`.
pub fn best_of(match_up_format: &str) -> Option<u32> {
    let rest = match_up_format.strip_prefix("SET")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok().filter(|n| *n > 0)
}

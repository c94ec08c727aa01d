//! Score validator seam. Hosts with a full scoring engine implement `ScoreValidator` themselves.

use crate::models::{best_of, Score, Side};

pub trait ScoreValidator {
    /// Check `score` against the match-up format and the proposed winning side.
    /// Returns the reason on rejection.
    fn validate(
        &self,
        score: &Score,
        match_up_format: Option<&str>,
        winning_side: Option<Side>,
    ) -> Result<(), String>;
}

/// Checks set counts against `SET<n>` formats and that a decided score agrees with the winner.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetsScoreValidator;

impl ScoreValidator for SetsScoreValidator {
    fn validate(
        &self,
        score: &Score,
        match_up_format: Option<&str>,
        winning_side: Option<Side>,
    ) -> Result<(), String> {
        let Some(best_of) = match_up_format.and_then(best_of) else {
            return Ok(());
        };
        let played = score.sets.iter().filter(|s| s.has_value()).count();
        if played > best_of as usize {
            return Err(format!("{played} sets recorded for best of {best_of}"));
        }
        match (score.decided_winner(best_of), winning_side) {
            (Some(decided), Some(side)) if decided != side => {
                Err(format!("score {score} contradicts winning side {side:?}"))
            }
            _ => Ok(()),
        }
    }
}

//! Match-up status state machine: which requested outcomes are legal, and what they resolve to.
//!
//! `resolve_outcome` is pure. It never touches the draw; callers apply the
//! returned `ResolvedOutcome` and run progression afterwards.

use crate::logic::score_validation::ScoreValidator;
use crate::models::{best_of, MatchUp, MatchUpStatus, Occupant, ProgressionError, Score, Side};
use crate::policy::PolicySet;
use serde::{Deserialize, Serialize};

/// A requested change to a match-up: status, winning side, score, plus caller options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchUpOutcome {
    /// Derived from the score / winning side when absent.
    pub match_up_status: Option<MatchUpStatus>,
    pub winning_side: Option<Side>,
    /// `None` keeps the recorded score where the status allows one.
    pub score: Option<Score>,
    pub match_up_status_codes: Vec<String>,
    /// Permit a winning-side change to ripple into downstream match-ups.
    pub allow_change_propagation: bool,
    pub disable_score_validation: bool,
}

impl MatchUpOutcome {
    pub fn status(match_up_status: MatchUpStatus) -> Self {
        Self {
            match_up_status: Some(match_up_status),
            ..Self::default()
        }
    }

    /// COMPLETED with `side` as winner.
    pub fn winner(side: Side) -> Self {
        Self {
            match_up_status: Some(MatchUpStatus::Completed),
            winning_side: Some(side),
            ..Self::default()
        }
    }

    /// Score only; the status is derived.
    pub fn scored(score: Score) -> Self {
        Self {
            score: Some(score),
            ..Self::default()
        }
    }

    pub fn with_winning_side(mut self, side: Side) -> Self {
        self.winning_side = Some(side);
        self
    }

    pub fn with_score(mut self, score: Score) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_status_codes(mut self, codes: &[&str]) -> Self {
        self.match_up_status_codes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn allowing_change_propagation(mut self) -> Self {
        self.allow_change_propagation = true;
        self
    }
}

/// Who is asking for the change.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutcomeOrigin {
    Caller,
    /// Raised while propagating an exit status; one participant is enough.
    ExitPropagation,
}

/// Outcome after derivation and validation, ready to write.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedOutcome {
    pub match_up_status: MatchUpStatus,
    pub winning_side: Option<Side>,
    pub score: Score,
    pub match_up_status_codes: Vec<String>,
}

impl ResolvedOutcome {
    /// Whether this outcome directs occupants downstream.
    pub fn is_directing(&self) -> bool {
        self.winning_side.is_some() || self.match_up_status.is_double_exit()
    }

    pub(crate) fn write_to(self, match_up: &mut MatchUp) {
        match_up.match_up_status = self.match_up_status;
        match_up.winning_side = self.winning_side;
        match_up.score = self.score;
        match_up.match_up_status_codes = self.match_up_status_codes;
    }
}

/// Validate `outcome` against `match_up` and its side occupants and resolve it.
pub fn resolve_outcome(
    match_up: &MatchUp,
    occupants: [Option<Occupant>; 2],
    outcome: &MatchUpOutcome,
    origin: OutcomeOrigin,
    policies: &PolicySet,
    score_validator: &dyn ScoreValidator,
) -> Result<ResolvedOutcome, ProgressionError> {
    if match_up.is_team() && outcome.score.is_some() && !match_up.extensions.disable_auto_calc() {
        return Err(ProgressionError::InvalidValues(
            "TEAM match-up scores are aggregated from tie match-ups".to_string(),
        ));
    }

    let format_best_of = match_up.match_up_format.as_deref().and_then(best_of);
    let score_winner = outcome
        .score
        .as_ref()
        .zip(format_best_of)
        .and_then(|(score, n)| score.decided_winner(n));

    let match_up_status = match outcome.match_up_status {
        Some(status) => status,
        None => derive_status(outcome, score_winner)?,
    };
    let winning_side = if match_up_status.is_directing() {
        outcome.winning_side.or(score_winner)
    } else {
        outcome.winning_side
    };

    let has_bye = occupants.iter().flatten().any(Occupant::is_bye);
    if match_up_status == MatchUpStatus::Bye {
        if winning_side.is_some() || match_up.winning_side.is_some() || !has_bye {
            return Err(ProgressionError::InvalidMatchUpStatusBye);
        }
    } else if has_bye || match_up.match_up_status == MatchUpStatus::Bye {
        return Err(ProgressionError::IncompatibleMatchUpStatus);
    }

    if winning_side.is_some() && !match_up_status.is_directing() {
        return Err(ProgressionError::InvalidMatchUpStatus);
    }
    if winning_side.is_none() && match_up_status.is_directing() {
        return Err(ProgressionError::IncompatibleMatchUpStatus);
    }

    let new_score = match &outcome.score {
        Some(score) if score.has_value() && !match_up_status.allows_score() => {
            return Err(ProgressionError::InvalidValues(format!(
                "{match_up_status} cannot carry a score"
            )));
        }
        Some(score) => score.clone(),
        None if match_up_status.allows_score() => match_up.score.clone(),
        None => Score::default(),
    };

    if match_up_status.is_directing() && policies.scoring.require_participants_for_scoring {
        let assigned = occupants
            .iter()
            .filter(|o| o.and_then(|o| o.participant_id()).is_some())
            .count();
        let required = match origin {
            OutcomeOrigin::Caller => 2,
            OutcomeOrigin::ExitPropagation => 1,
        };
        if assigned < required {
            return Err(ProgressionError::MissingParticipants);
        }
    }

    if policies.scoring.validate_scores && !outcome.disable_score_validation && new_score.has_value()
    {
        score_validator
            .validate(&new_score, match_up.match_up_format.as_deref(), winning_side)
            .map_err(ProgressionError::InvalidScore)?;
    }

    let match_up_status_codes = if !outcome.match_up_status_codes.is_empty() {
        outcome.match_up_status_codes.clone()
    } else if match_up_status == match_up.match_up_status {
        match_up.match_up_status_codes.clone()
    } else {
        Vec::new()
    };

    Ok(ResolvedOutcome {
        match_up_status,
        winning_side,
        score: new_score,
        match_up_status_codes,
    })
}

/// Status implied by a request that names none.
fn derive_status(
    outcome: &MatchUpOutcome,
    score_winner: Option<Side>,
) -> Result<MatchUpStatus, ProgressionError> {
    match &outcome.score {
        Some(score) if !score.has_value() => {
            if outcome.winning_side.is_some() {
                return Err(ProgressionError::InvalidValues(
                    "winning side given with an empty score".to_string(),
                ));
            }
            Ok(MatchUpStatus::ToBePlayed)
        }
        Some(_) if outcome.winning_side.or(score_winner).is_some() => Ok(MatchUpStatus::Completed),
        Some(_) => Ok(MatchUpStatus::Incomplete),
        None if outcome.winning_side.is_some() => Ok(MatchUpStatus::Completed),
        None => Err(ProgressionError::MissingValue("match_up_status")),
    }
}

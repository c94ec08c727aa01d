//! TEAM match-ups: aggregate tie match-up results against the tie format.

use crate::logic::status::ResolvedOutcome;
use crate::models::{MatchUp, MatchUpStatus, Score, SetScore, Side};

/// Collection values won by each side so far.
pub fn tie_values(parent: &MatchUp) -> [u32; 2] {
    let mut values = [0, 0];
    for tie in &parent.tie_match_ups {
        let Some(side) = tie.winning_side else {
            continue;
        };
        let value = match (&parent.tie_format, &tie.collection_id) {
            (Some(format), Some(collection_id)) => format.collection_value(collection_id),
            _ => 1,
        };
        values[side.index()] += value;
    }
    values
}

/// Side that has reached the tie format's value goal, if any.
pub fn tie_winner(parent: &MatchUp) -> Option<Side> {
    let goal = parent.tie_format.as_ref()?.value_goal();
    let values = tie_values(parent);
    [Side::One, Side::Two]
        .into_iter()
        .find(|side| values[side.index()] >= goal)
}

/// Outcome of the parent implied by its tie match-ups.
pub(crate) fn aggregate_outcome(parent: &MatchUp) -> ResolvedOutcome {
    let values = tie_values(parent);
    let winning_side = tie_winner(parent);
    let started = parent.tie_match_ups.iter().any(MatchUp::is_active);
    let match_up_status = if winning_side.is_some() {
        MatchUpStatus::Completed
    } else if started {
        MatchUpStatus::Incomplete
    } else {
        MatchUpStatus::ToBePlayed
    };
    let score = if started {
        Score {
            sets: vec![SetScore::new(values[0], values[1])],
        }
    } else {
        Score::default()
    };
    ResolvedOutcome {
        match_up_status,
        winning_side,
        score,
        match_up_status_codes: Vec::new(),
    }
}

/// The parent's current result, unchanged (manual scoring).
pub(crate) fn recorded_outcome(parent: &MatchUp) -> ResolvedOutcome {
    ResolvedOutcome {
        match_up_status: parent.match_up_status,
        winning_side: parent.winning_side,
        score: parent.score.clone(),
        match_up_status_codes: parent.match_up_status_codes.clone(),
    }
}

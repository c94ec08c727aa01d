//! Round robin groups: BYE / TO_BE_PLAYED re-stamping and the per-position tally.
//!
//! Groups never advance anyone; finishing order is read by qualifier progression.

use crate::logic::progression::{match_up_mut, Propagation};
use crate::models::{
    DrawDefinition, DrawPosition, MatchUpId, MatchUpStatus, ParticipantTally, ProgressionError,
    Side, StructureId,
};
use std::cmp::Ordering;

/// Re-stamp every match-up without a result in `group_id` from whether a side is a bye.
pub(crate) fn restamp_group(
    draw: &mut DrawDefinition,
    group_id: StructureId,
    propagation: &mut Propagation,
) -> Result<(), ProgressionError> {
    let updates: Vec<(MatchUpId, MatchUpStatus)> = {
        let group = draw
            .structure(group_id)
            .ok_or(ProgressionError::StructureNotFound(group_id))?;
        group
            .match_ups
            .iter()
            .filter(|m| !m.is_active())
            .filter_map(|m| {
                let has_bye = group.side_occupants(m).iter().flatten().any(|o| o.is_bye());
                let status = if has_bye {
                    MatchUpStatus::Bye
                } else {
                    MatchUpStatus::ToBePlayed
                };
                (m.match_up_status != status).then_some((m.match_up_id, status))
            })
            .collect()
    };
    for (match_up_id, status) in updates {
        match_up_mut(draw, (group_id, match_up_id))?.match_up_status = status;
        propagation.match_up_modified((group_id, match_up_id));
    }
    Ok(())
}

fn set_difference(tally: &ParticipantTally) -> i64 {
    i64::from(tally.sets_won) - i64::from(tally.sets_lost)
}

fn by_standing(a: &(DrawPosition, ParticipantTally), b: &(DrawPosition, ParticipantTally)) -> Ordering {
    b.1.wins
        .cmp(&a.1.wins)
        .then_with(|| set_difference(&b.1).cmp(&set_difference(&a.1)))
        .then_with(|| a.0.cmp(&b.0))
}

/// Standings of a group: wins, then set difference, then draw position.
pub fn group_standings(
    draw: &DrawDefinition,
    group_id: StructureId,
) -> Result<Vec<(DrawPosition, ParticipantTally)>, ProgressionError> {
    let group = draw
        .structure(group_id)
        .ok_or(ProgressionError::StructureNotFound(group_id))?;
    let mut rows: Vec<(DrawPosition, ParticipantTally)> = group
        .position_assignments
        .iter()
        .filter(|a| a.occupant.participant_id().is_some())
        .map(|a| (a.draw_position, ParticipantTally::default()))
        .collect();

    for match_up in &group.match_ups {
        let Some(winner) = match_up.winning_side else {
            continue;
        };
        let sets = match_up.score.sets_won();
        for side in [Side::One, Side::Two] {
            let Some(draw_position) = match_up.draw_position(side) else {
                continue;
            };
            if let Some((_, tally)) = rows.iter_mut().find(|(dp, _)| *dp == draw_position) {
                if side == winner {
                    tally.wins += 1;
                } else {
                    tally.losses += 1;
                }
                tally.sets_won += sets[side.index()];
                tally.sets_lost += sets[side.opposite().index()];
            }
        }
    }

    let concluded = group
        .match_ups
        .iter()
        .all(|m| m.match_up_status.is_concluded());
    rows.sort_by(by_standing);
    for (order, (_, tally)) in rows.iter_mut().enumerate() {
        tally.provisional_order = order as u32 + 1;
        tally.group_order = concluded.then_some(tally.provisional_order);
    }
    Ok(rows)
}

/// Store fresh standings on the group's position assignments.
pub(crate) fn tally_group(
    draw: &mut DrawDefinition,
    group_id: StructureId,
    propagation: &mut Propagation,
) -> Result<(), ProgressionError> {
    let standings = group_standings(draw, group_id)?;
    let group = draw
        .structure_mut(group_id)
        .ok_or(ProgressionError::StructureNotFound(group_id))?;
    let mut changed = false;
    for (draw_position, tally) in standings {
        if let Some(assignment) = group.assignment_mut(draw_position) {
            if assignment.extensions.tally() != Some(&tally) {
                assignment.extensions.set_tally(tally);
                changed = true;
            }
        }
    }
    if changed {
        propagation.positions_modified(group_id);
    }
    Ok(())
}

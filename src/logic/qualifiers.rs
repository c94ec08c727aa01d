//! Qualifier progression: move finishers of qualifying structures into the main
//! structure's qualifier placeholders.

use crate::logic::context::Context;
use crate::logic::progression::{Propagation, Step};
use crate::models::{
    DrawDefinition, DrawId, DrawLink, DrawPosition, LinkType, MatchUpStatus, Occupant,
    ParticipantId, ProgressionError, Side, Structure, StructureId, TournamentRecord,
};
use crate::notify::Owner;
use crate::policy::PolicySet;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// One placeholder filled by qualifier progression.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct QualifierAssignment {
    pub participant_id: ParticipantId,
    pub structure_id: StructureId,
    pub draw_position: DrawPosition,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QualifierProgression {
    pub assignments: Vec<QualifierAssignment>,
    pub aborted_branches: Vec<ProgressionError>,
}

fn feeds_round(link: &DrawLink, main_id: StructureId, target_round_number: u32) -> bool {
    link.link_type == LinkType::Position
        && link.target.structure_id == main_id
        && link.target.round_number == target_round_number
}

/// Winners of the link's source round; the participant facing a bye counts as a winner.
fn elimination_finishers(structure: &Structure, round_number: Option<u32>) -> Vec<ParticipantId> {
    let round_number = round_number.unwrap_or_else(|| structure.round_count());
    structure
        .round_match_ups(round_number)
        .into_iter()
        .filter_map(|m| match (m.winning_side, m.match_up_status) {
            (Some(side), _) => structure.side_participant(m, side),
            (None, MatchUpStatus::Bye) => [Side::One, Side::Two]
                .into_iter()
                .find_map(|side| structure.side_participant(m, side)),
            _ => None,
        })
        .collect()
}

/// Group positions whose final order is among `finishing_positions`, group by group.
fn group_finishers(container: &Structure, finishing_positions: &[u32]) -> Vec<ParticipantId> {
    let wanted: &[u32] = if finishing_positions.is_empty() {
        &[1]
    } else {
        finishing_positions
    };
    let mut finishers = Vec::new();
    for group in &container.structures {
        let mut ranked: Vec<(u32, ParticipantId)> = group
            .position_assignments
            .iter()
            .filter_map(|a| {
                let order = a.extensions.tally()?.group_order?;
                let participant_id = a.occupant.participant_id()?;
                wanted.contains(&order).then_some((order, participant_id))
            })
            .collect();
        ranked.sort_by_key(|(order, _)| *order);
        finishers.extend(ranked.into_iter().map(|(_, p)| p));
    }
    finishers
}

/// Every participant that has qualified for `target_round_number` of the main structure,
/// in encounter order, whether or not already placed.
pub fn qualified_participants(
    draw: &DrawDefinition,
    target_round_number: u32,
    policies: &PolicySet,
) -> Result<Vec<ParticipantId>, ProgressionError> {
    let main = draw
        .main_structure()
        .ok_or(ProgressionError::MissingMainStructure)?;
    let mut qualified = Vec::new();
    for link in draw
        .links
        .iter()
        .filter(|l| feeds_round(l, main.structure_id, target_round_number))
    {
        let Some(source) = draw.structure(link.source.structure_id) else {
            log::warn!(
                "qualifying structure {} not found",
                link.source.structure_id
            );
            continue;
        };
        if policies.progression.require_completed_qualifying_structures && !source.is_complete() {
            continue;
        }
        let finishers = if source.is_container() {
            group_finishers(source, &link.source.finishing_positions)
        } else {
            elimination_finishers(source, link.source.round_number)
        };
        for participant_id in finishers {
            if !qualified.contains(&participant_id) {
                qualified.push(participant_id);
            }
        }
    }
    Ok(qualified)
}

/// A shuffled copy of `candidates`, for hosts that place qualifiers by draw of lots.
pub fn random_qualifier_order<R: Rng + ?Sized>(
    candidates: &[ParticipantId],
    rng: &mut R,
) -> Vec<ParticipantId> {
    let mut order = candidates.to_vec();
    order.shuffle(rng);
    order
}

/// Fill unfilled qualifier placeholders at `target_round_number` of the main structure.
///
/// `order`, when given, decides which qualifier takes which placeholder; the rest follow
/// in encounter order. Calling again once everyone is placed fails with
/// `MissingQualifiedParticipants`.
pub fn qualifier_progression(
    draw: &mut DrawDefinition,
    target_round_number: u32,
    order: Option<&[ParticipantId]>,
    ctx: &mut Context<'_>,
) -> Result<QualifierProgression, ProgressionError> {
    let (main_id, placeholders, placed) = {
        let main = draw
            .main_structure()
            .ok_or(ProgressionError::MissingMainStructure)?;
        let mut placeholders: Vec<DrawPosition> = main
            .position_assignments
            .iter()
            .filter(|a| a.occupant.is_unfilled_qualifier())
            .filter(|a| main.first_round_of(a.draw_position) == Some(target_round_number))
            .map(|a| a.draw_position)
            .collect();
        placeholders.sort_unstable();
        let placed: Vec<ParticipantId> = main
            .position_assignments
            .iter()
            .filter_map(|a| a.occupant.participant_id())
            .collect();
        (main.structure_id, placeholders, placed)
    };
    if placeholders.is_empty() {
        return Err(ProgressionError::NoDrawPositionsAvailableForQualifiers);
    }

    let candidates: Vec<ParticipantId> = qualified_participants(draw, target_round_number, &ctx.policies)?
        .into_iter()
        .filter(|p| !placed.contains(p))
        .collect();
    if candidates.is_empty() {
        return Err(ProgressionError::MissingQualifiedParticipants);
    }

    let mut ordered: Vec<ParticipantId> = order
        .unwrap_or_default()
        .iter()
        .copied()
        .filter(|p| candidates.contains(p))
        .collect();
    for participant_id in &candidates {
        if !ordered.contains(participant_id) {
            ordered.push(*participant_id);
        }
    }

    let mut propagation = Propagation::new(draw, &ctx.policies);
    let mut assignments = Vec::new();
    for (draw_position, participant_id) in placeholders.into_iter().zip(ordered) {
        let main = draw
            .structure_mut(main_id)
            .ok_or(ProgressionError::StructureNotFound(main_id))?;
        let assignment = main
            .assignment_mut(draw_position)
            .ok_or(ProgressionError::DrawPositionNotFound {
                structure_id: main_id,
                draw_position,
            })?;
        assignment.occupant = Occupant::Qualifier(Some(participant_id));
        for match_up in main.match_ups.iter().filter(|m| m.side_of(draw_position).is_some()) {
            propagation.push(Step::Evaluate((main_id, match_up.match_up_id)));
        }
        log::info!("qualifier {participant_id} placed at draw position {draw_position}");
        assignments.push(QualifierAssignment {
            participant_id,
            structure_id: main_id,
            draw_position,
        });
    }
    propagation.positions_modified(main_id);

    let result = propagation.run(draw);
    let aborted_branches = propagation.publish(draw, ctx);
    result?;
    Ok(QualifierProgression {
        assignments,
        aborted_branches,
    })
}

/// Qualifier progression for a draw of a tournament record.
pub fn tournament_qualifier_progression(
    record: Option<&mut TournamentRecord>,
    draw_id: Option<DrawId>,
    target_round_number: u32,
    order: Option<&[ParticipantId]>,
    ctx: &mut Context<'_>,
) -> Result<QualifierProgression, ProgressionError> {
    let record = record.ok_or(ProgressionError::MissingTournamentRecord)?;
    let draw_id = draw_id.ok_or(ProgressionError::MissingDrawDefinition)?;
    let tournament_id = record.tournament_id;
    let (event_id, draw) = record
        .draw_mut(draw_id)
        .ok_or(ProgressionError::DrawDefinitionNotFound(draw_id))?;
    ctx.owner = Owner {
        tournament_id: Some(tournament_id),
        event_id: Some(event_id),
        draw_id: Some(draw_id),
    };
    qualifier_progression(draw, target_round_number, order, ctx)
}

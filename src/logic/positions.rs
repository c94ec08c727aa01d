//! Position assignment: participants, byes and qualifier placeholders.
//!
//! Every change re-evaluates the match-ups that reference the position, so byes
//! auto-resolve and pending exits settle as soon as a side is filled.

use crate::logic::context::Context;
use crate::logic::progression::{match_up_ref, Propagation, Step};
use crate::models::{
    DrawDefinition, DrawPosition, MatchUpId, Occupant, ParticipantId, PositionAssignment,
    ProgressionError, StructureId,
};
use serde::{Deserialize, Serialize};

/// What a position request asks for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "participant_id", rename_all = "snake_case")]
pub enum PositionRequest {
    Participant(ParticipantId),
    Bye,
    Qualifier,
    Clear,
}

/// Outcome of a position change.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionChange {
    /// Structure that owns the position (a group when a container id was given).
    pub structure_id: StructureId,
    pub assignment: PositionAssignment,
    pub aborted_branches: Vec<ProgressionError>,
}

pub fn assign_draw_position(
    draw: &mut DrawDefinition,
    structure_id: StructureId,
    draw_position: DrawPosition,
    participant_id: ParticipantId,
    ctx: &mut Context<'_>,
) -> Result<PositionChange, ProgressionError> {
    assign(
        draw,
        structure_id,
        draw_position,
        Occupant::Participant(participant_id),
        ctx,
    )
}

pub fn assign_draw_position_bye(
    draw: &mut DrawDefinition,
    structure_id: StructureId,
    draw_position: DrawPosition,
    ctx: &mut Context<'_>,
) -> Result<PositionChange, ProgressionError> {
    assign(draw, structure_id, draw_position, Occupant::Bye, ctx)
}

/// Reserve a position for a participant coming out of qualifying.
pub fn assign_qualifier_placeholder(
    draw: &mut DrawDefinition,
    structure_id: StructureId,
    draw_position: DrawPosition,
    ctx: &mut Context<'_>,
) -> Result<PositionChange, ProgressionError> {
    assign(draw, structure_id, draw_position, Occupant::Qualifier(None), ctx)
}

/// Apply a `PositionRequest`.
pub fn set_draw_position(
    draw: &mut DrawDefinition,
    structure_id: StructureId,
    draw_position: DrawPosition,
    request: PositionRequest,
    ctx: &mut Context<'_>,
) -> Result<PositionChange, ProgressionError> {
    match request {
        PositionRequest::Participant(participant_id) => {
            assign_draw_position(draw, structure_id, draw_position, participant_id, ctx)
        }
        PositionRequest::Bye => assign_draw_position_bye(draw, structure_id, draw_position, ctx),
        PositionRequest::Qualifier => {
            assign_qualifier_placeholder(draw, structure_id, draw_position, ctx)
        }
        PositionRequest::Clear => clear_draw_position(draw, structure_id, draw_position, ctx),
    }
}

/// Structure that holds `draw_position`; a container resolves to the owning group.
fn owning_structure(
    draw: &DrawDefinition,
    structure_id: StructureId,
    draw_position: DrawPosition,
) -> Result<StructureId, ProgressionError> {
    let structure = draw
        .structure(structure_id)
        .ok_or(ProgressionError::StructureNotFound(structure_id))?;
    if !structure.is_container() {
        return if structure.assignment(draw_position).is_some() {
            Ok(structure_id)
        } else {
            Err(ProgressionError::DrawPositionNotFound {
                structure_id,
                draw_position,
            })
        };
    }
    structure
        .structures
        .iter()
        .find(|child| {
            child
                .position_assignments
                .iter()
                .any(|a| a.draw_position == draw_position)
        })
        .map(|child| child.structure_id)
        .ok_or(ProgressionError::DrawPositionNotFound {
            structure_id,
            draw_position,
        })
}

fn referencing_match_ups(
    draw: &DrawDefinition,
    structure_id: StructureId,
    draw_position: DrawPosition,
) -> Vec<MatchUpId> {
    draw.structure(structure_id)
        .map(|s| {
            s.match_ups
                .iter()
                .filter(|m| m.side_of(draw_position).is_some())
                .map(|m| m.match_up_id)
                .collect()
        })
        .unwrap_or_default()
}

fn assign(
    draw: &mut DrawDefinition,
    structure_id: StructureId,
    draw_position: DrawPosition,
    occupant: Occupant,
    ctx: &mut Context<'_>,
) -> Result<PositionChange, ProgressionError> {
    let owner_id = owning_structure(draw, structure_id, draw_position)?;
    let occupied = ProgressionError::DrawPositionOccupied {
        structure_id: owner_id,
        draw_position,
    };

    let replacement = {
        let scope = draw
            .container_of(owner_id)
            .or_else(|| draw.structure(owner_id))
            .ok_or(ProgressionError::StructureNotFound(owner_id))?;
        if let Some(participant_id) = occupant.participant_id() {
            let duplicate = scope.all_position_assignments().iter().any(|a| {
                a.draw_position != draw_position && a.occupant.participant_id() == Some(participant_id)
            });
            if duplicate {
                return Err(ProgressionError::InvalidValues(format!(
                    "participant {participant_id} already holds a position in this structure"
                )));
            }
        }
        let current = scope
            .occupant(draw_position)
            .ok_or(ProgressionError::DrawPositionNotFound {
                structure_id: owner_id,
                draw_position,
            })?;
        match (current, occupant) {
            (current, requested) if current == requested => None,
            (Occupant::Qualifier(Some(held)), Occupant::Participant(requested)) if held == requested => {
                None
            }
            (Occupant::Unassigned, requested) => Some(requested),
            (Occupant::Qualifier(None), Occupant::Participant(p)) => Some(Occupant::Qualifier(Some(p))),
            _ => return Err(occupied),
        }
    };

    let mut propagation = Propagation::new(draw, &ctx.policies);
    if let Some(replacement) = replacement {
        let assignment = draw
            .structure_mut(owner_id)
            .and_then(|s| s.assignment_mut(draw_position))
            .ok_or(ProgressionError::DrawPositionNotFound {
                structure_id: owner_id,
                draw_position,
            })?;
        assignment.occupant = replacement;
        propagation.positions_modified(owner_id);
        for match_up_id in referencing_match_ups(draw, owner_id, draw_position) {
            propagation.push(Step::Evaluate((owner_id, match_up_id)));
        }
    }
    finish(draw, owner_id, draw_position, propagation, ctx)
}

/// Return a position to unassigned (a filled qualifier placeholder back to an empty one).
///
/// Refused while a match-up referencing the position carries a result.
pub fn clear_draw_position(
    draw: &mut DrawDefinition,
    structure_id: StructureId,
    draw_position: DrawPosition,
    ctx: &mut Context<'_>,
) -> Result<PositionChange, ProgressionError> {
    let owner_id = owning_structure(draw, structure_id, draw_position)?;
    let referencing = referencing_match_ups(draw, owner_id, draw_position);
    let mut auto_resolved = Vec::new();
    for match_up_id in &referencing {
        let match_up = match_up_ref(draw, (owner_id, *match_up_id))?;
        if match_up.is_active() {
            return Err(ProgressionError::IncompatibleMatchUpStatus);
        }
        if match_up.is_auto_resolved() {
            auto_resolved.push(*match_up_id);
        }
    }

    let mut propagation = Propagation::new(draw, &ctx.policies);
    let assignment = draw
        .structure_mut(owner_id)
        .and_then(|s| s.assignment_mut(draw_position))
        .ok_or(ProgressionError::DrawPositionNotFound {
            structure_id: owner_id,
            draw_position,
        })?;
    let cleared = match assignment.occupant {
        Occupant::Qualifier(_) => Occupant::Qualifier(None),
        _ => Occupant::Unassigned,
    };
    if assignment.occupant != cleared {
        assignment.occupant = cleared;
        propagation.positions_modified(owner_id);
        let is_group = draw.container_of(owner_id).is_some();
        for match_up_id in referencing {
            let key = (owner_id, match_up_id);
            propagation.push(if auto_resolved.contains(&match_up_id) && !is_group {
                Step::Retract(key)
            } else {
                Step::Evaluate(key)
            });
        }
    }
    finish(draw, owner_id, draw_position, propagation, ctx)
}

fn finish(
    draw: &mut DrawDefinition,
    owner_id: StructureId,
    draw_position: DrawPosition,
    mut propagation: Propagation,
    ctx: &mut Context<'_>,
) -> Result<PositionChange, ProgressionError> {
    let result = propagation.run(draw);
    let aborted_branches = propagation.publish(draw, ctx);
    result?;
    let assignment = draw
        .structure(owner_id)
        .and_then(|s| s.assignment(draw_position))
        .cloned()
        .ok_or(ProgressionError::DrawPositionNotFound {
            structure_id: owner_id,
            draw_position,
        })?;
    Ok(PositionChange {
        structure_id: owner_id,
        assignment,
        aborted_branches,
    })
}

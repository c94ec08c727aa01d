//! Structure reset and match-up replacement, used when a bracket is regenerated.

use crate::logic::context::Context;
use crate::models::{
    DrawDefinition, MatchUp, MatchUpId, PositionAssignment, ProgressionError, Structure,
    StructureId,
};
use crate::notify::Notice;

fn clear(structure: &mut Structure, removed: &mut Vec<(StructureId, Vec<MatchUpId>)>) {
    for assignment in &mut structure.position_assignments {
        *assignment = PositionAssignment::new(assignment.draw_position);
    }
    let ids: Vec<MatchUpId> = structure.match_ups.drain(..).map(|m| m.match_up_id).collect();
    if !ids.is_empty() {
        removed.push((structure.structure_id, ids));
    }
    for child in &mut structure.structures {
        clear(child, removed);
    }
}

/// Unassign every position of the structure (children included) and drop its match-ups.
///
/// Returns the ids of the removed match-ups.
pub fn reset_structure(
    draw: &mut DrawDefinition,
    structure_id: StructureId,
    ctx: &mut Context<'_>,
) -> Result<Vec<MatchUpId>, ProgressionError> {
    let structure = draw
        .structure_mut(structure_id)
        .ok_or(ProgressionError::StructureNotFound(structure_id))?;
    let mut removed = Vec::new();
    clear(structure, &mut removed);
    let position_assignments: Vec<PositionAssignment> = structure
        .all_position_assignments()
        .into_iter()
        .cloned()
        .collect();

    let mut all_ids = Vec::new();
    for (owner_id, match_up_ids) in removed {
        all_ids.extend(match_up_ids.iter().copied());
        let notice = Notice::DeletedMatchUpIds {
            owner: ctx.owner,
            structure_id: owner_id,
            match_up_ids,
        };
        ctx.notify(notice);
    }
    let notice = Notice::ModifyPositionAssignments {
        owner: ctx.owner,
        structure_id,
        position_assignments,
    };
    ctx.notify(notice);
    log::info!("structure {structure_id} reset, {} match-ups removed", all_ids.len());
    Ok(all_ids)
}

/// Install regenerated match-ups in an ITEM structure, replacing any it holds.
///
/// Each match-up's draw positions must exist in the structure.
pub fn replace_structure_match_ups(
    draw: &mut DrawDefinition,
    structure_id: StructureId,
    mut match_ups: Vec<MatchUp>,
    ctx: &mut Context<'_>,
) -> Result<(), ProgressionError> {
    let container_id = draw.container_of(structure_id).map(|c| c.structure_id);
    let structure = draw
        .structure_mut(structure_id)
        .ok_or(ProgressionError::StructureNotFound(structure_id))?;
    if structure.is_container() {
        return Err(ProgressionError::InvalidStructure {
            structure_id,
            reason: "match-ups belong to the container's groups".to_string(),
        });
    }
    for match_up in &mut match_ups {
        for draw_position in match_up.draw_positions.iter().flatten() {
            if structure.assignment(*draw_position).is_none() {
                return Err(ProgressionError::DrawPositionNotFound {
                    structure_id,
                    draw_position: *draw_position,
                });
            }
        }
        match_up.structure_id = structure_id;
        match_up.container_structure_id = container_id;
        match_up.touch();
    }

    let replaced: Vec<MatchUpId> = structure.match_ups.iter().map(|m| m.match_up_id).collect();
    structure.match_ups = match_ups.clone();
    if !replaced.is_empty() {
        let notice = Notice::DeletedMatchUpIds {
            owner: ctx.owner,
            structure_id,
            match_up_ids: replaced,
        };
        ctx.notify(notice);
    }
    let notice = Notice::AddMatchUps {
        owner: ctx.owner,
        structure_id,
        match_ups,
    };
    ctx.notify(notice);
    Ok(())
}

//! Structural checks run before a draw is accepted.

use crate::logic::navigation::flatten_structures;
use crate::models::{DrawDefinition, DrawPosition, ProgressionError, Structure, StructureId};
use std::collections::{HashMap, HashSet};

fn invalid(structure_id: StructureId, reason: impl Into<String>) -> ProgressionError {
    ProgressionError::InvalidStructure {
        structure_id,
        reason: reason.into(),
    }
}

fn sorted_positions(structure: &Structure) -> Vec<DrawPosition> {
    let mut positions: Vec<DrawPosition> = structure
        .position_assignments
        .iter()
        .map(|a| a.draw_position)
        .collect();
    positions.sort_unstable();
    positions
}

fn is_contiguous_from_one(positions: &[DrawPosition]) -> bool {
    positions
        .iter()
        .enumerate()
        .all(|(i, dp)| usize::try_from(*dp).map_or(false, |dp| dp == i + 1))
}

fn check_positions(structure: &Structure) -> Result<(), ProgressionError> {
    if !structure.is_container() {
        if !is_contiguous_from_one(&sorted_positions(structure)) {
            return Err(invalid(
                structure.structure_id,
                "draw positions are not 1..N",
            ));
        }
        return Ok(());
    }
    let mut union = Vec::new();
    for group in &structure.structures {
        let positions = sorted_positions(group);
        if positions.windows(2).any(|w| w[0] == w[1]) {
            return Err(invalid(group.structure_id, "duplicate draw position"));
        }
        union.extend(positions);
    }
    union.sort_unstable();
    if union.windows(2).any(|w| w[0] == w[1]) {
        return Err(invalid(structure.structure_id, "groups share a draw position"));
    }
    if !is_contiguous_from_one(&union) {
        return Err(invalid(
            structure.structure_id,
            "group draw positions do not cover 1..N",
        ));
    }
    Ok(())
}

fn check_match_up_positions(structure: &Structure) -> Result<(), ProgressionError> {
    for match_up in &structure.match_ups {
        for draw_position in match_up.draw_positions.iter().flatten() {
            if structure.assignment(*draw_position).is_none() {
                return Err(ProgressionError::DrawPositionNotFound {
                    structure_id: structure.structure_id,
                    draw_position: *draw_position,
                });
            }
        }
    }
    Ok(())
}

fn check_links(draw: &DrawDefinition) -> Result<(), ProgressionError> {
    let mut inbound: HashSet<(StructureId, DrawPosition)> = HashSet::new();
    for link in &draw.links {
        let source_id = link.source.structure_id;
        if draw.structure(source_id).is_none() {
            return Err(ProgressionError::StructureNotFound(source_id));
        }
        let target_id = link.target.structure_id;
        let target = draw
            .structure(target_id)
            .ok_or(ProgressionError::StructureNotFound(target_id))?;
        for draw_position in &link.target.draw_positions {
            if target.assignment(*draw_position).is_none() {
                return Err(ProgressionError::DrawPositionNotFound {
                    structure_id: target_id,
                    draw_position: *draw_position,
                });
            }
            if !inbound.insert((target_id, *draw_position)) {
                return Err(invalid(
                    target_id,
                    format!("draw position {draw_position} has more than one inbound link"),
                ));
            }
        }
    }
    Ok(())
}

fn check_acyclic(draw: &DrawDefinition) -> Result<(), ProgressionError> {
    let mut edges: HashMap<StructureId, Vec<StructureId>> = HashMap::new();
    for link in &draw.links {
        edges
            .entry(link.source.structure_id)
            .or_default()
            .push(link.target.structure_id);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }
    let mut marks: HashMap<StructureId, Mark> = HashMap::new();
    for start in edges.keys().copied() {
        if marks.contains_key(&start) {
            continue;
        }
        // Iterative depth-first search; the stack holds (node, next edge index).
        let mut stack = vec![(start, 0usize)];
        marks.insert(start, Mark::Visiting);
        while let Some((node, index)) = stack.pop() {
            let next = edges.get(&node).and_then(|targets| targets.get(index)).copied();
            match next {
                Some(target) => {
                    stack.push((node, index + 1));
                    match marks.get(&target) {
                        Some(Mark::Visiting) => {
                            return Err(invalid(target, "link graph contains a cycle"));
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(target, Mark::Visiting);
                            stack.push((target, 0));
                        }
                    }
                }
                None => {
                    marks.insert(node, Mark::Done);
                }
            }
        }
    }
    Ok(())
}

/// Check the structural invariants of a draw.
pub fn validate_draw(draw: &DrawDefinition) -> Result<(), ProgressionError> {
    for structure in flatten_structures(&draw.structures) {
        if draw.container_of(structure.structure_id).is_none() {
            check_positions(structure)?;
        }
        check_match_up_positions(structure)?;
    }
    check_links(draw)?;
    check_acyclic(draw)
}

//! Read-only lookups: structures within a draw, match-ups within a structure, draw, event,
//! tournament, or a collection of tournaments.

use crate::models::{
    DrawDefinition, DrawId, Event, EventId, MatchUp, MatchUpId, ProgressionError, Stage,
    Structure, StructureId, TournamentId, TournamentRecord,
};
use serde::Serialize;

/// A structure given either directly or by id.
#[derive(Clone, Copy, Debug)]
pub enum StructureRef<'a> {
    Direct(&'a Structure),
    Id(StructureId),
}

/// Resolve a reference, walking the draw only when no direct reference is held.
pub fn resolve_structure<'a>(
    draw: &'a DrawDefinition,
    reference: StructureRef<'a>,
) -> Result<&'a Structure, ProgressionError> {
    match reference {
        StructureRef::Direct(structure) => Ok(structure),
        StructureRef::Id(structure_id) => draw
            .structure(structure_id)
            .ok_or(ProgressionError::StructureNotFound(structure_id)),
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StructureLookup<'a> {
    pub structure: &'a Structure,
    /// Container owning the structure when it is a round robin group.
    pub container: Option<&'a Structure>,
}

pub fn find_structure(
    draw: &DrawDefinition,
    structure_id: StructureId,
) -> Result<StructureLookup<'_>, ProgressionError> {
    let structure = draw
        .structure(structure_id)
        .ok_or(ProgressionError::StructureNotFound(structure_id))?;
    Ok(StructureLookup {
        structure,
        container: draw.container_of(structure_id),
    })
}

/// Optional criteria for `find_structures`; unset fields match anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructureFilter {
    pub stage: Option<Stage>,
    pub stage_sequence: Option<u32>,
    /// Round carrying the structure's round-target marker.
    pub round_target: Option<u32>,
}

impl StructureFilter {
    pub fn matches(&self, structure: &Structure) -> bool {
        self.stage.map_or(true, |stage| structure.stage == stage)
            && self
                .stage_sequence
                .map_or(true, |seq| structure.stage_sequence == seq)
            && self
                .round_target
                .map_or(true, |round| structure.extensions.round_target() == Some(round))
    }
}

/// Every structure, container children included, parents before children.
pub fn flatten_structures(structures: &[Structure]) -> Vec<&Structure> {
    let mut flat = Vec::new();
    for structure in structures {
        flat.push(structure);
        flat.extend(flatten_structures(&structure.structures));
    }
    flat
}

pub fn find_structures<'a>(draw: &'a DrawDefinition, filter: &StructureFilter) -> Vec<&'a Structure> {
    flatten_structures(&draw.structures)
        .into_iter()
        .filter(|s| filter.matches(s))
        .collect()
}

/// Where a match-up lives.
#[derive(Clone, Copy, Debug)]
pub struct MatchUpLocation<'a> {
    pub match_up: &'a MatchUp,
    /// Structure owning the match-up (for a tie match-up, the one owning its TEAM parent).
    pub structure: &'a Structure,
    pub container: Option<&'a Structure>,
    pub tie_parent: Option<&'a MatchUp>,
}

fn locate<'a>(
    structure: &'a Structure,
    container: Option<&'a Structure>,
    match_up_id: MatchUpId,
) -> Option<MatchUpLocation<'a>> {
    for match_up in &structure.match_ups {
        if match_up.match_up_id == match_up_id {
            return Some(MatchUpLocation {
                match_up,
                structure,
                container,
                tie_parent: None,
            });
        }
        if let Some(tie) = match_up.tie_match_up(match_up_id) {
            return Some(MatchUpLocation {
                match_up: tie,
                structure,
                container,
                tie_parent: Some(match_up),
            });
        }
    }
    structure
        .structures
        .iter()
        .find_map(|child| locate(child, Some(structure), match_up_id))
}

/// Match-up within one structure or its children.
pub fn find_structure_match_up(
    structure: &Structure,
    match_up_id: MatchUpId,
) -> Result<MatchUpLocation<'_>, ProgressionError> {
    locate(structure, None, match_up_id).ok_or(ProgressionError::MatchUpNotFound(match_up_id))
}

pub fn find_draw_match_up(
    draw: &DrawDefinition,
    match_up_id: MatchUpId,
) -> Result<MatchUpLocation<'_>, ProgressionError> {
    draw.structures
        .iter()
        .find_map(|s| locate(s, None, match_up_id))
        .ok_or(ProgressionError::MatchUpNotFound(match_up_id))
}

/// Match-up within any draw of an event, with the owning draw's id.
pub fn find_event_match_up(
    event: &Event,
    match_up_id: MatchUpId,
) -> Result<(DrawId, MatchUpLocation<'_>), ProgressionError> {
    event
        .draw_definitions
        .iter()
        .find_map(|draw| {
            find_draw_match_up(draw, match_up_id)
                .ok()
                .map(|location| (draw.draw_id, location))
        })
        .ok_or(ProgressionError::MatchUpNotFound(match_up_id))
}

/// Known owners of a match-up, used to skip the full scan.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchUpHints {
    pub tournament_id: Option<TournamentId>,
    pub event_id: Option<EventId>,
    pub draw_id: Option<DrawId>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupPath {
    /// Resolved through the hinted owners.
    Direct,
    /// Found by scanning every draw.
    BruteForce,
}

#[derive(Clone, Copy, Debug)]
pub struct FoundMatchUp<'a> {
    pub location: MatchUpLocation<'a>,
    pub tournament_id: TournamentId,
    pub event_id: EventId,
    pub draw_id: DrawId,
    pub path: LookupPath,
}

fn hinted<'a>(
    record: &'a TournamentRecord,
    match_up_id: MatchUpId,
    hints: &MatchUpHints,
) -> Option<FoundMatchUp<'a>> {
    let Some(draw_id) = hints.draw_id else {
        let event = record.event(hints.event_id?)?;
        let (draw_id, location) = find_event_match_up(event, match_up_id).ok()?;
        return Some(FoundMatchUp {
            location,
            tournament_id: record.tournament_id,
            event_id: event.event_id,
            draw_id,
            path: LookupPath::Direct,
        });
    };
    let mut events: Vec<&Event> = match hints.event_id {
        Some(event_id) => record.event(event_id).into_iter().collect(),
        None => record.events.iter().collect(),
    };
    events.retain(|e| e.draw(draw_id).is_some());
    let event = events.first()?;
    let location = find_draw_match_up(event.draw(draw_id)?, match_up_id).ok()?;
    Some(FoundMatchUp {
        location,
        tournament_id: record.tournament_id,
        event_id: event.event_id,
        draw_id,
        path: LookupPath::Direct,
    })
}

fn brute_force(record: &TournamentRecord, match_up_id: MatchUpId) -> Option<FoundMatchUp<'_>> {
    record.events.iter().find_map(|event| {
        find_event_match_up(event, match_up_id)
            .ok()
            .map(|(draw_id, location)| FoundMatchUp {
                location,
                tournament_id: record.tournament_id,
                event_id: event.event_id,
                draw_id,
                path: LookupPath::BruteForce,
            })
    })
}

/// Match-up within a tournament. Hinted owners are tried first; a failed hint
/// falls back to scanning every event and draw.
pub fn find_tournament_match_up<'a>(
    record: &'a TournamentRecord,
    match_up_id: MatchUpId,
    hints: &MatchUpHints,
) -> Result<FoundMatchUp<'a>, ProgressionError> {
    hinted(record, match_up_id, hints)
        .or_else(|| brute_force(record, match_up_id))
        .ok_or(ProgressionError::MatchUpNotFound(match_up_id))
}

/// Match-up across a collection of tournament records, borrowed from wherever the host keeps them.
pub fn find_match_up<'a, I>(
    records: I,
    match_up_id: MatchUpId,
    hints: &MatchUpHints,
) -> Result<FoundMatchUp<'a>, ProgressionError>
where
    I: IntoIterator<Item = &'a TournamentRecord>,
    I::IntoIter: Clone,
{
    let mut records = records.into_iter();
    if records.clone().next().is_none() {
        return Err(ProgressionError::MissingTournamentRecord);
    }
    if let Some(record) = hints
        .tournament_id
        .and_then(|id| records.clone().find(|r| r.tournament_id == id))
    {
        if let Ok(found) = find_tournament_match_up(record, match_up_id, hints) {
            return Ok(found);
        }
    }
    records
        .find_map(|record| brute_force(record, match_up_id))
        .ok_or(ProgressionError::MatchUpNotFound(match_up_id))
}

//! Progression engine: moves winners and losers along the link graph, resolves byes and exit
//! statuses, and undoes or swaps what an earlier result directed.
//!
//! Every effect goes through one bounded work queue. A step that cannot find its
//! structure or match-up abandons that branch only; any other error stops the run.

use crate::logic::context::Context;
use crate::logic::round_robin;
use crate::logic::score_validation::SetsScoreValidator;
use crate::logic::status::{resolve_outcome, MatchUpOutcome, OutcomeOrigin};
use crate::models::{
    DrawDefinition, DrawPosition, LinkType, MatchUp, MatchUpId, MatchUpStatus, Occupant,
    ParticipantId, ProgressionError, Side, Structure, StructureId,
};
use crate::notify::Notice;
use crate::policy::PolicySet;
use std::collections::VecDeque;

/// A match-up addressed by its owning structure.
pub type MatchUpKey = (StructureId, MatchUpId);

/// One side of a downstream match-up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MatchUpSlot {
    pub structure_id: StructureId,
    pub match_up_id: MatchUpId,
    pub side: Side,
}

impl MatchUpSlot {
    pub fn key(&self) -> MatchUpKey {
        (self.structure_id, self.match_up_id)
    }
}

/// A position in another structure reached through a link.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LinkedPosition {
    pub structure_id: StructureId,
    pub draw_position: DrawPosition,
    /// Match-up of the link's target round that holds the position.
    pub match_up: Option<MatchUpSlot>,
}

/// Where a match-up's winner and loser go.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PositionTargets {
    /// Next-round match-up in the same structure.
    pub winner_match_up: Option<MatchUpSlot>,
    /// Target of an outgoing LOSER link.
    pub loser: Option<LinkedPosition>,
    /// Target of an outgoing WINNER link.
    pub winner_link: Option<LinkedPosition>,
    /// Qualifier placeholder already filled, through a POSITION link, by one of the
    /// match-up's participants.
    pub qualifier: Option<LinkedPosition>,
    /// Links whose target structure is missing; each abandons its branch only.
    pub unresolved: Vec<ProgressionError>,
}

impl PositionTargets {
    fn linked(&self) -> impl Iterator<Item = LinkedPosition> {
        [self.loser, self.winner_link, self.qualifier].into_iter().flatten()
    }
}

/// Compute the targets of `match_up_id`. Round robin match-ups have none.
///
/// A link that names a missing position, or a round without the expected
/// next-round match-up, is a structural error. A link into a missing structure
/// is recorded in `unresolved` instead.
pub fn position_targets(
    draw: &DrawDefinition,
    structure_id: StructureId,
    match_up_id: MatchUpId,
) -> Result<PositionTargets, ProgressionError> {
    if draw.container_of(structure_id).is_some() {
        return Ok(PositionTargets::default());
    }
    let structure = draw
        .structure(structure_id)
        .ok_or(ProgressionError::StructureNotFound(structure_id))?;
    let match_up = structure
        .match_up(match_up_id)
        .ok_or(ProgressionError::MatchUpNotFound(match_up_id))?;
    let mut unresolved = Vec::new();
    let loser = per_branch(
        linked_position(draw, LinkType::Loser, structure_id, match_up),
        &mut unresolved,
    )?;
    let winner_link = per_branch(
        linked_position(draw, LinkType::Winner, structure_id, match_up),
        &mut unresolved,
    )?;
    let qualifier = per_branch(qualifier_position(draw, structure, match_up), &mut unresolved)?;
    Ok(PositionTargets {
        winner_match_up: winner_slot(structure, match_up)?,
        loser,
        winner_link,
        qualifier,
        unresolved,
    })
}

fn per_branch(
    found: Result<Option<LinkedPosition>, ProgressionError>,
    unresolved: &mut Vec<ProgressionError>,
) -> Result<Option<LinkedPosition>, ProgressionError> {
    match found {
        Err(e) if e.is_not_found() => {
            unresolved.push(e);
            Ok(None)
        }
        other => other,
    }
}

fn winner_slot(structure: &Structure, match_up: &MatchUp) -> Result<Option<MatchUpSlot>, ProgressionError> {
    let current = structure.round_match_ups(match_up.round_number).len();
    let next = structure.round_match_ups(match_up.round_number + 1);
    if next.is_empty() {
        return Ok(None);
    }
    let invalid = |reason: String| ProgressionError::InvalidStructure {
        structure_id: structure.structure_id,
        reason,
    };
    // Feed rounds keep the match-up count; fed positions are pre-listed in them.
    let feed_round = next.len() == current;
    let target_position = if feed_round {
        match_up.round_position
    } else {
        (match_up.round_position + 1) / 2
    };
    let target = next
        .iter()
        .find(|m| m.round_position == target_position)
        .ok_or_else(|| {
            invalid(format!(
                "no round {} match-up at position {target_position}",
                match_up.round_number + 1
            ))
        })?;
    let advanced = match_up
        .draw_positions
        .iter()
        .flatten()
        .find_map(|dp| target.side_of(*dp));
    let side = match advanced {
        Some(side) => side,
        None if feed_round => target
            .draw_positions
            .iter()
            .position(Option::is_none)
            .map(Side::from_index)
            .ok_or_else(|| invalid(format!("feed match-up {} has no open side", target.match_up_id)))?,
        None if match_up.round_position % 2 == 1 => Side::One,
        None => Side::Two,
    };
    Ok(Some(MatchUpSlot {
        structure_id: structure.structure_id,
        match_up_id: target.match_up_id,
        side,
    }))
}

fn linked_position(
    draw: &DrawDefinition,
    link_type: LinkType,
    structure_id: StructureId,
    match_up: &MatchUp,
) -> Result<Option<LinkedPosition>, ProgressionError> {
    let Some(link) = draw
        .links
        .iter()
        .find(|l| l.link_type == link_type && l.is_from_round(structure_id, match_up.round_number))
    else {
        return Ok(None);
    };
    let target_id = link.target.structure_id;
    let draw_position = link
        .target_position(match_up.round_position)
        .ok_or_else(|| ProgressionError::InvalidStructure {
            structure_id,
            reason: format!(
                "{link_type:?} link from round {} has no target for round position {}",
                match_up.round_number, match_up.round_position
            ),
        })?;
    let target = draw
        .structure(target_id)
        .ok_or(ProgressionError::StructureNotFound(target_id))?;
    if target.assignment(draw_position).is_none() {
        return Err(ProgressionError::DrawPositionNotFound {
            structure_id: target_id,
            draw_position,
        });
    }
    Ok(Some(LinkedPosition {
        structure_id: target_id,
        draw_position,
        match_up: round_slot(target, link.target.round_number, draw_position),
    }))
}

fn round_slot(target: &Structure, round_number: u32, draw_position: DrawPosition) -> Option<MatchUpSlot> {
    target.all_match_ups().into_iter().find_map(|m| {
        if m.round_number != round_number {
            return None;
        }
        m.side_of(draw_position).map(|side| MatchUpSlot {
            structure_id: m.structure_id,
            match_up_id: m.match_up_id,
            side,
        })
    })
}

/// The placeholder a POSITION link from this match-up's round filled with one of its participants.
/// A link without a source round qualifies the structure's last round.
fn qualifier_position(
    draw: &DrawDefinition,
    structure: &Structure,
    match_up: &MatchUp,
) -> Result<Option<LinkedPosition>, ProgressionError> {
    let participants: Vec<ParticipantId> = [Side::One, Side::Two]
        .into_iter()
        .filter_map(|side| structure.side_participant(match_up, side))
        .collect();
    if participants.is_empty() {
        return Ok(None);
    }
    let links = draw.links.iter().filter(|l| {
        l.link_type == LinkType::Position
            && l.source.structure_id == structure.structure_id
            && l.source.round_number.unwrap_or_else(|| structure.round_count()) == match_up.round_number
    });
    for link in links {
        let target_id = link.target.structure_id;
        let target = draw
            .structure(target_id)
            .ok_or(ProgressionError::StructureNotFound(target_id))?;
        let filled = target.position_assignments.iter().find_map(|a| match a.occupant {
            Occupant::Qualifier(Some(p)) if participants.contains(&p) => Some(a.draw_position),
            _ => None,
        });
        if let Some(draw_position) = filled {
            return Ok(Some(LinkedPosition {
                structure_id: target_id,
                draw_position,
                match_up: round_slot(target, link.target.round_number, draw_position),
            }));
        }
    }
    Ok(None)
}

pub(crate) fn match_up_mut(
    draw: &mut DrawDefinition,
    key: MatchUpKey,
) -> Result<&mut MatchUp, ProgressionError> {
    draw.structure_mut(key.0)
        .ok_or(ProgressionError::StructureNotFound(key.0))?
        .match_up_mut(key.1)
        .ok_or(ProgressionError::MatchUpNotFound(key.1))
}

pub(crate) fn match_up_ref(draw: &DrawDefinition, key: MatchUpKey) -> Result<&MatchUp, ProgressionError> {
    draw.structure(key.0)
        .ok_or(ProgressionError::StructureNotFound(key.0))?
        .match_up(key.1)
        .ok_or(ProgressionError::MatchUpNotFound(key.1))
}

/// Default step ceiling: a handful of visits per match-up covers the deepest legal chain.
pub fn propagation_limit(draw: &DrawDefinition) -> usize {
    4 * draw.match_up_count() + 4
}

#[derive(Clone, Debug)]
pub(crate) enum Step {
    /// Re-derive an unplayed match-up from its occupants and exit markers.
    Evaluate(MatchUpKey),
    /// Move the match-up's winner and loser to their targets.
    Direct(MatchUpKey),
    /// Carry an exit into one side of a match-up.
    Exit {
        slot: MatchUpSlot,
        marker: MatchUpStatus,
        codes: Vec<String>,
    },
    /// Undo an auto-resolved result and what it directed.
    Retract(MatchUpKey),
}

/// What an unplayed match-up should become.
enum Resolution {
    Keep,
    Reset,
    Bye {
        advance: Option<DrawPosition>,
        marker: Option<MatchUpStatus>,
    },
    Exit {
        status: MatchUpStatus,
        winning_side: Side,
    },
    DoubleExit(MatchUpStatus),
}

fn resolution(match_up: &MatchUp, occupants: [Option<Occupant>; 2]) -> Resolution {
    let has_participant =
        |side: Side| occupants[side.index()].and_then(|o| o.participant_id()).is_some();
    let is_bye = |side: Side| occupants[side.index()].map_or(false, |o| o.is_bye());
    match match_up.exit_markers {
        [Some(marker), Some(_)] => Resolution::DoubleExit(marker.doubled()),
        [Some(marker), None] | [None, Some(marker)] => {
            let exited = if match_up.exit_markers[0].is_some() {
                Side::One
            } else {
                Side::Two
            };
            let other = exited.opposite();
            if has_participant(other) {
                Resolution::Exit {
                    status: marker,
                    winning_side: other,
                }
            } else if is_bye(other) {
                let advance = if has_participant(exited) {
                    match_up.draw_position(exited)
                } else {
                    None
                };
                Resolution::Bye {
                    advance,
                    marker: Some(marker),
                }
            } else {
                Resolution::Keep
            }
        }
        [None, None] => {
            let both_set = match_up.draw_positions.iter().all(Option::is_some);
            if both_set && (is_bye(Side::One) || is_bye(Side::Two)) {
                let advancing = if is_bye(Side::One) { Side::Two } else { Side::One };
                Resolution::Bye {
                    advance: match_up.draw_position(advancing),
                    marker: None,
                }
            } else if match_up.match_up_status != MatchUpStatus::ToBePlayed {
                Resolution::Reset
            } else {
                Resolution::Keep
            }
        }
    }
}

/// Work queue and change log for one operation.
pub(crate) struct Propagation {
    policies: PolicySet,
    limit: usize,
    steps: usize,
    queue: VecDeque<Step>,
    modified_match_ups: Vec<MatchUpKey>,
    modified_positions: Vec<StructureId>,
    aborted: Vec<ProgressionError>,
}

impl Propagation {
    pub(crate) fn new(draw: &DrawDefinition, policies: &PolicySet) -> Self {
        let limit = policies
            .progression
            .max_propagation_steps
            .unwrap_or_else(|| propagation_limit(draw));
        Self {
            policies: policies.clone(),
            limit,
            steps: 0,
            queue: VecDeque::new(),
            modified_match_ups: Vec::new(),
            modified_positions: Vec::new(),
            aborted: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, step: Step) {
        self.queue.push_back(step);
    }

    pub(crate) fn match_up_modified(&mut self, key: MatchUpKey) {
        if !self.modified_match_ups.contains(&key) {
            self.modified_match_ups.push(key);
        }
    }

    pub(crate) fn positions_modified(&mut self, structure_id: StructureId) {
        if !self.modified_positions.contains(&structure_id) {
            self.modified_positions.push(structure_id);
        }
    }

    fn tick(&mut self) -> Result<(), ProgressionError> {
        self.steps += 1;
        if self.steps > self.limit {
            log::warn!("propagation stopped after {} steps", self.limit);
            return Err(ProgressionError::PropagationDidNotConverge { limit: self.limit });
        }
        Ok(())
    }

    fn abandon(&mut self, error: ProgressionError) {
        if !self.aborted.contains(&error) {
            log::warn!("propagation branch abandoned: {error}");
            self.aborted.push(error);
        }
    }

    fn propagate_exits(&self) -> bool {
        self.policies.progression.propagate_exit_status
    }

    /// Drain the queue. Fails with `PropagationDidNotConverge` past the step ceiling.
    pub(crate) fn run(&mut self, draw: &mut DrawDefinition) -> Result<(), ProgressionError> {
        while let Some(step) = self.queue.pop_front() {
            self.tick()?;
            log::debug!("propagation step {:?}", step);
            let result = match step {
                Step::Evaluate(key) => self.evaluate(draw, key),
                Step::Direct(key) => position_targets(draw, key.0, key.1)
                    .and_then(|targets| self.direct(draw, key, &targets)),
                Step::Exit {
                    slot,
                    marker,
                    codes,
                } => self.mark_exit(draw, slot, marker, codes),
                Step::Retract(key) => self.retract(draw, key),
            };
            match result {
                Err(e) if e.is_not_found() => self.abandon(e),
                other => other?,
            }
        }
        Ok(())
    }

    /// Stamp and announce everything modified. Returns the abandoned branches.
    pub(crate) fn publish(self, draw: &mut DrawDefinition, ctx: &mut Context<'_>) -> Vec<ProgressionError> {
        for key in &self.modified_match_ups {
            if let Ok(match_up) = match_up_mut(draw, *key) {
                match_up.touch();
                let notice = Notice::ModifyMatchUp {
                    owner: ctx.owner,
                    structure_id: key.0,
                    match_up: match_up.clone(),
                };
                ctx.notify(notice);
            }
        }
        for structure_id in &self.modified_positions {
            if let Some(structure) = draw.structure(*structure_id) {
                let notice = Notice::ModifyPositionAssignments {
                    owner: ctx.owner,
                    structure_id: *structure_id,
                    position_assignments: structure
                        .all_position_assignments()
                        .into_iter()
                        .cloned()
                        .collect(),
                };
                ctx.notify(notice);
            }
        }
        self.aborted
    }

    /// Send the winner and loser of `key` to `targets`; double exits send markers instead.
    pub(crate) fn direct(
        &mut self,
        draw: &mut DrawDefinition,
        key: MatchUpKey,
        targets: &PositionTargets,
    ) -> Result<(), ProgressionError> {
        for error in &targets.unresolved {
            self.abandon(error.clone());
        }
        let (status, codes, winner, loser) = {
            let structure = draw
                .structure(key.0)
                .ok_or(ProgressionError::StructureNotFound(key.0))?;
            let match_up = structure
                .match_up(key.1)
                .ok_or(ProgressionError::MatchUpNotFound(key.1))?;
            let occupant_of = |dp: Option<DrawPosition>| {
                dp.and_then(|dp| structure.occupant(dp))
                    .and_then(|o| o.participant_id())
            };
            let winner = match_up
                .winning_side
                .map(|side| (match_up.draw_position(side), occupant_of(match_up.draw_position(side))));
            let loser = match_up
                .winning_side
                .and_then(|side| occupant_of(match_up.draw_position(side.opposite())));
            (
                match_up.match_up_status,
                match_up.match_up_status_codes.clone(),
                winner,
                loser,
            )
        };

        if status.is_double_exit() {
            let Some(marker) = status.exit_marker() else {
                return Ok(());
            };
            if let Some(slot) = targets.winner_match_up {
                self.push(Step::Exit {
                    slot,
                    marker,
                    codes: codes.clone(),
                });
            }
            if self.propagate_exits() {
                if let Some(slot) = targets.loser.and_then(|l| l.match_up) {
                    self.push(Step::Exit { slot, marker, codes });
                }
            }
            return Ok(());
        }

        let Some((winner_position, winner_participant)) = winner else {
            return Ok(());
        };
        if let (Some(slot), Some(draw_position)) = (targets.winner_match_up, winner_position) {
            self.advance(draw, slot, draw_position)?;
        }
        if let Some(target) = targets.winner_link {
            if let Some(participant_id) = winner_participant {
                self.place(draw, target, participant_id)?;
            }
            if let Some(slot) = target.match_up {
                self.push(Step::Evaluate(slot.key()));
            }
        }
        if let (Some(target), Some(participant_id)) = (targets.qualifier, winner_participant) {
            self.requalify(draw, target, participant_id)?;
        }
        if let Some(target) = targets.loser {
            if let Some(participant_id) = loser {
                self.place(draw, target, participant_id)?;
            }
            let marker = if self.propagate_exits() {
                status.exit_marker()
            } else {
                None
            };
            match (target.match_up, marker) {
                (Some(slot), Some(marker)) => self.push(Step::Exit { slot, marker, codes }),
                (Some(slot), None) => self.push(Step::Evaluate(slot.key())),
                (None, _) => {}
            }
        }
        Ok(())
    }

    /// Put `draw_position` into one side of a next-round match-up.
    fn advance(
        &mut self,
        draw: &mut DrawDefinition,
        slot: MatchUpSlot,
        draw_position: DrawPosition,
    ) -> Result<(), ProgressionError> {
        let target = match_up_mut(draw, slot.key())?;
        match target.draw_positions[slot.side.index()] {
            Some(dp) if dp == draw_position => return Ok(()),
            Some(dp) => {
                return Err(ProgressionError::DrawPositionOccupied {
                    structure_id: slot.structure_id,
                    draw_position: dp,
                })
            }
            None => target.draw_positions[slot.side.index()] = Some(draw_position),
        }
        self.match_up_modified(slot.key());
        self.push(Step::Evaluate(slot.key()));
        Ok(())
    }

    /// Assign a participant to a linked position; an identical occupant is a no-op.
    fn place(
        &mut self,
        draw: &mut DrawDefinition,
        target: LinkedPosition,
        participant_id: ParticipantId,
    ) -> Result<(), ProgressionError> {
        let structure = draw
            .structure_mut(target.structure_id)
            .ok_or(ProgressionError::StructureNotFound(target.structure_id))?;
        let assignment = structure.assignment_mut(target.draw_position).ok_or(
            ProgressionError::DrawPositionNotFound {
                structure_id: target.structure_id,
                draw_position: target.draw_position,
            },
        )?;
        match assignment.occupant {
            Occupant::Participant(p) if p == participant_id => return Ok(()),
            Occupant::Unassigned => assignment.occupant = Occupant::Participant(participant_id),
            _ => {
                return Err(ProgressionError::DrawPositionOccupied {
                    structure_id: target.structure_id,
                    draw_position: target.draw_position,
                })
            }
        }
        self.positions_modified(target.structure_id);
        Ok(())
    }

    /// Refill a qualifier placeholder emptied by a corrected result.
    fn requalify(
        &mut self,
        draw: &mut DrawDefinition,
        target: LinkedPosition,
        participant_id: ParticipantId,
    ) -> Result<(), ProgressionError> {
        let structure = draw
            .structure_mut(target.structure_id)
            .ok_or(ProgressionError::StructureNotFound(target.structure_id))?;
        if structure
            .position_assignments
            .iter()
            .any(|a| a.occupant.participant_id() == Some(participant_id))
        {
            return Ok(());
        }
        let Some(assignment) = structure.assignment_mut(target.draw_position) else {
            return Ok(());
        };
        if !assignment.occupant.is_unfilled_qualifier() {
            return Ok(());
        }
        assignment.occupant = Occupant::Qualifier(Some(participant_id));
        log::info!(
            "qualifier {participant_id} placed at draw position {}",
            target.draw_position
        );
        self.positions_modified(target.structure_id);
        if let Some(slot) = target.match_up {
            self.push(Step::Evaluate(slot.key()));
        }
        Ok(())
    }

    /// Clear a linked position if it holds one of `participants`. A filled qualifier
    /// placeholder goes back to unfilled.
    fn unplace(
        &mut self,
        draw: &mut DrawDefinition,
        target: LinkedPosition,
        participants: &[ParticipantId],
    ) -> Result<(), ProgressionError> {
        let structure = draw
            .structure_mut(target.structure_id)
            .ok_or(ProgressionError::StructureNotFound(target.structure_id))?;
        if let Some(assignment) = structure.assignment_mut(target.draw_position) {
            let cleared = match assignment.occupant {
                Occupant::Participant(p) if participants.contains(&p) => Occupant::Unassigned,
                Occupant::Qualifier(Some(p)) if participants.contains(&p) => Occupant::Qualifier(None),
                _ => return Ok(()),
            };
            assignment.occupant = cleared;
            self.positions_modified(target.structure_id);
        }
        Ok(())
    }

    fn replace_occupant(
        &mut self,
        draw: &mut DrawDefinition,
        target: LinkedPosition,
        from: ParticipantId,
        to: ParticipantId,
    ) -> Result<(), ProgressionError> {
        let structure = draw
            .structure_mut(target.structure_id)
            .ok_or(ProgressionError::StructureNotFound(target.structure_id))?;
        let Some(assignment) = structure.assignment_mut(target.draw_position) else {
            return Ok(());
        };
        let replaced = match assignment.occupant {
            Occupant::Participant(p) if p == from => Occupant::Participant(to),
            Occupant::Qualifier(Some(p)) if p == from => Occupant::Qualifier(Some(to)),
            _ => return Ok(()),
        };
        assignment.occupant = replaced;
        self.positions_modified(target.structure_id);
        if let Some(slot) = target.match_up {
            self.match_up_modified(slot.key());
        }
        Ok(())
    }

    fn evaluate(&mut self, draw: &mut DrawDefinition, key: MatchUpKey) -> Result<(), ProgressionError> {
        if draw.container_of(key.0).is_some() {
            return round_robin::restamp_group(draw, key.0, self);
        }
        let (resolution, exit_outcome) = {
            let structure = draw
                .structure(key.0)
                .ok_or(ProgressionError::StructureNotFound(key.0))?;
            let match_up = structure
                .match_up(key.1)
                .ok_or(ProgressionError::MatchUpNotFound(key.1))?;
            if match_up.is_active() {
                return Ok(());
            }
            let occupants = structure.side_occupants(match_up);
            let resolution = resolution(match_up, occupants);
            let exit_outcome = match resolution {
                Resolution::Exit {
                    status,
                    winning_side,
                } => {
                    if match_up.match_up_status == status && match_up.winning_side == Some(winning_side) {
                        return Ok(());
                    }
                    let outcome = MatchUpOutcome {
                        match_up_status: Some(status),
                        winning_side: Some(winning_side),
                        match_up_status_codes: match_up.match_up_status_codes.clone(),
                        ..MatchUpOutcome::default()
                    };
                    Some(resolve_outcome(
                        match_up,
                        occupants,
                        &outcome,
                        OutcomeOrigin::ExitPropagation,
                        &self.policies,
                        &SetsScoreValidator,
                    )?)
                }
                Resolution::DoubleExit(status) if match_up.match_up_status == status => return Ok(()),
                _ => None,
            };
            (resolution, exit_outcome)
        };

        match resolution {
            Resolution::Keep => {}
            Resolution::Reset => self.push(Step::Retract(key)),
            Resolution::Bye { advance, marker } => {
                let match_up = match_up_mut(draw, key)?;
                if match_up.match_up_status != MatchUpStatus::Bye {
                    match_up.match_up_status = MatchUpStatus::Bye;
                    match_up.winning_side = None;
                    self.match_up_modified(key);
                }
                let targets = position_targets(draw, key.0, key.1)?;
                if let Some(slot) = targets.winner_match_up {
                    // An exit that meets a bye travels on with the position.
                    if let Some(draw_position) = advance {
                        self.advance(draw, slot, draw_position)?;
                    }
                    if let Some(marker) = marker {
                        self.push(Step::Exit {
                            slot,
                            marker,
                            codes: Vec::new(),
                        });
                    }
                }
            }
            Resolution::Exit { .. } => {
                if let Some(resolved) = exit_outcome {
                    resolved.write_to(match_up_mut(draw, key)?);
                    self.match_up_modified(key);
                    self.push(Step::Direct(key));
                }
            }
            Resolution::DoubleExit(status) => {
                let match_up = match_up_mut(draw, key)?;
                match_up.match_up_status = status;
                match_up.winning_side = None;
                self.match_up_modified(key);
                self.push(Step::Direct(key));
            }
        }
        Ok(())
    }

    fn mark_exit(
        &mut self,
        draw: &mut DrawDefinition,
        slot: MatchUpSlot,
        marker: MatchUpStatus,
        codes: Vec<String>,
    ) -> Result<(), ProgressionError> {
        if draw.container_of(slot.structure_id).is_some() {
            return Ok(());
        }
        let match_up = match_up_mut(draw, slot.key())?;
        if match_up.is_active() {
            log::warn!(
                "{marker} not carried into match-up {} which already has a result",
                slot.match_up_id
            );
            return Ok(());
        }
        if match_up.exit_markers[slot.side.index()] == Some(marker) {
            return Ok(());
        }
        match_up.exit_markers[slot.side.index()] = Some(marker);
        for code in codes {
            if !match_up.match_up_status_codes.contains(&code) {
                match_up.match_up_status_codes.push(code);
            }
        }
        self.match_up_modified(slot.key());
        self.push(Step::Evaluate(slot.key()));
        Ok(())
    }

    /// Undo an auto-resolved result. Dependents that were themselves auto-resolved are
    /// retracted first, while they still hold what this match-up sent them.
    fn retract(&mut self, draw: &mut DrawDefinition, key: MatchUpKey) -> Result<(), ProgressionError> {
        let targets = position_targets(draw, key.0, key.1)?;
        self.undo_direction(draw, key, &targets)?;
        match_up_mut(draw, key)?.clear_result();
        self.match_up_modified(key);
        self.push(Step::Evaluate(key));
        Ok(())
    }

    fn retract_nested(&mut self, draw: &mut DrawDefinition, key: MatchUpKey) -> Result<(), ProgressionError> {
        self.tick()?;
        self.retract(draw, key)
    }

    /// Remove whatever `key` sent to its targets: the advanced draw position, linked
    /// participants, and markers it produced.
    pub(crate) fn undo_direction(
        &mut self,
        draw: &mut DrawDefinition,
        key: MatchUpKey,
        targets: &PositionTargets,
    ) -> Result<(), ProgressionError> {
        let (draw_positions, participants) = {
            let structure = draw
                .structure(key.0)
                .ok_or(ProgressionError::StructureNotFound(key.0))?;
            let match_up = structure
                .match_up(key.1)
                .ok_or(ProgressionError::MatchUpNotFound(key.1))?;
            let participants: Vec<ParticipantId> = match_up
                .draw_positions
                .iter()
                .flatten()
                .filter_map(|dp| structure.occupant(*dp))
                .filter_map(|o| o.participant_id())
                .collect();
            (match_up.draw_positions, participants)
        };

        if let Some(slot) = targets.winner_match_up {
            let i = slot.side.index();
            let (fed, was_auto) = {
                let target = match_up_ref(draw, slot.key())?;
                let fed = target.exit_markers[i].is_some()
                    || target.draw_positions[i].map_or(false, |dp| draw_positions.contains(&Some(dp)));
                (fed, target.is_auto_resolved())
            };
            if fed {
                if was_auto {
                    self.retract_nested(draw, slot.key())?;
                }
                let target = match_up_mut(draw, slot.key())?;
                target.exit_markers[i] = None;
                if target.draw_positions[i].map_or(false, |dp| draw_positions.contains(&Some(dp))) {
                    target.draw_positions[i] = None;
                }
                self.match_up_modified(slot.key());
                self.push(Step::Evaluate(slot.key()));
            }
        }

        for target in targets.linked() {
            let holds_participant = draw
                .structure(target.structure_id)
                .and_then(|s| s.occupant(target.draw_position))
                .and_then(|o| o.participant_id())
                .map_or(false, |p| participants.contains(&p));
            if let Some(slot) = target.match_up {
                if holds_participant && match_up_ref(draw, slot.key())?.is_auto_resolved() {
                    self.retract_nested(draw, slot.key())?;
                }
            }
            self.unplace(draw, target, &participants)?;
            if let Some(slot) = target.match_up {
                let match_up = match_up_mut(draw, slot.key())?;
                if match_up.exit_markers[slot.side.index()].take().is_some() {
                    self.match_up_modified(slot.key());
                }
                self.push(Step::Evaluate(slot.key()));
            }
        }
        Ok(())
    }

    /// Exchange winner and loser of `key` in everything already directed downstream.
    ///
    /// Order: the winner's path through the same structure (round order), then
    /// link targets along that path, then the match-up's own loser target.
    pub(crate) fn swap_downstream(
        &mut self,
        draw: &mut DrawDefinition,
        key: MatchUpKey,
        old_winner: Side,
    ) -> Result<(), ProgressionError> {
        let (old_position, new_position, old_participant, new_participant) = {
            let structure = draw
                .structure(key.0)
                .ok_or(ProgressionError::StructureNotFound(key.0))?;
            let match_up = structure
                .match_up(key.1)
                .ok_or(ProgressionError::MatchUpNotFound(key.1))?;
            (
                match_up.draw_position(old_winner),
                match_up.draw_position(old_winner.opposite()),
                structure.side_participant(match_up, old_winner),
                structure.side_participant(match_up, old_winner.opposite()),
            )
        };
        let (Some(old_position), Some(new_position)) = (old_position, new_position) else {
            return Err(ProgressionError::InvalidValues(
                "winner swap needs both draw positions".to_string(),
            ));
        };

        // Collect the path before touching anything so slot lookups see the original positions.
        let mut path = vec![(key, position_targets(draw, key.0, key.1)?)];
        let mut slots = Vec::new();
        while let Some(slot) = path.last().and_then(|(_, t)| t.winner_match_up) {
            let next = match_up_ref(draw, slot.key())?;
            if next.draw_positions[slot.side.index()] != Some(old_position) {
                break;
            }
            slots.push(slot);
            if next.winning_side != Some(slot.side) {
                path.push((slot.key(), position_targets(draw, slot.structure_id, slot.match_up_id)?));
                break;
            }
            path.push((slot.key(), position_targets(draw, slot.structure_id, slot.match_up_id)?));
        }

        for slot in &slots {
            match_up_mut(draw, slot.key())?.draw_positions[slot.side.index()] = Some(new_position);
            self.match_up_modified(slot.key());
        }

        let (Some(old_participant), Some(new_participant)) = (old_participant, new_participant) else {
            return Ok(());
        };
        for (i, (_, targets)) in path.iter().enumerate() {
            for target in targets.linked() {
                if i == 0 && Some(target) == targets.loser {
                    continue;
                }
                self.replace_occupant(draw, target, old_participant, new_participant)?;
            }
        }
        if let Some(target) = path[0].1.loser {
            self.replace_occupant(draw, target, new_participant, old_participant)?;
        }
        Ok(())
    }
}

/// Whether anything downstream of `key` carries a recorded result that depends on it.
/// Auto-resolved dependents are looked through.
pub(crate) fn has_active_downstream(
    draw: &DrawDefinition,
    key: MatchUpKey,
    targets: &PositionTargets,
    limit: usize,
) -> Result<bool, ProgressionError> {
    let mut pending = vec![(key, targets.clone())];
    let mut visited = 0;
    while let Some((source_key, targets)) = pending.pop() {
        visited += 1;
        if visited > limit {
            return Err(ProgressionError::PropagationDidNotConverge { limit });
        }
        let structure = draw
            .structure(source_key.0)
            .ok_or(ProgressionError::StructureNotFound(source_key.0))?;
        let source = match_up_ref(draw, source_key)?;
        let participants: Vec<ParticipantId> = source
            .draw_positions
            .iter()
            .flatten()
            .filter_map(|dp| structure.occupant(*dp))
            .filter_map(|o| o.participant_id())
            .collect();

        let mut dependents = Vec::new();
        if let Some(slot) = targets.winner_match_up {
            let next = match_up_ref(draw, slot.key())?;
            let i = slot.side.index();
            let fed = next.draw_positions[i].map_or(false, |dp| source.draw_positions.contains(&Some(dp)));
            if fed || next.exit_markers[i].is_some() {
                dependents.push(slot.key());
            }
        }
        for target in targets.linked() {
            let Some(slot) = target.match_up else {
                continue;
            };
            let occupant = draw
                .structure(target.structure_id)
                .and_then(|s| s.occupant(target.draw_position));
            let holds_participant = occupant
                .and_then(|o| o.participant_id())
                .map_or(false, |p| participants.contains(&p));
            let next = match_up_ref(draw, slot.key())?;
            if holds_participant || next.exit_markers[slot.side.index()].is_some() {
                dependents.push(slot.key());
            }
        }

        for dependent in dependents {
            let match_up = match_up_ref(draw, dependent)?;
            if match_up.is_active() {
                return Ok(true);
            }
            if match_up.is_auto_resolved() {
                if let Ok(next_targets) = position_targets(draw, dependent.0, dependent.1) {
                    pending.push((dependent, next_targets));
                }
            }
        }
    }
    Ok(false)
}

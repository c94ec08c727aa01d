//! Recording match-up outcomes: validate, write, then run progression.

use crate::logic::context::Context;
use crate::logic::navigation::{find_draw_match_up, find_tournament_match_up, MatchUpHints};
use crate::logic::progression::{
    has_active_downstream, match_up_mut, match_up_ref, position_targets, propagation_limit,
    MatchUpKey, PositionTargets, Propagation, Step,
};
use crate::logic::round_robin;
use crate::logic::status::{resolve_outcome, MatchUpOutcome, OutcomeOrigin, ResolvedOutcome};
use crate::logic::team;
use crate::models::{
    DrawDefinition, DrawId, MatchUp, MatchUpId, MatchUpStatus, ProgressionError, Score, SetScore, Side,
    StructureId, TournamentRecord,
};
use crate::notify::Owner;
use serde::Deserialize;

/// Result of an accepted status change.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusChange {
    /// The match-up as stored after the change.
    pub match_up: MatchUp,
    /// Propagation branches abandoned on a missing structure or match-up.
    pub aborted_branches: Vec<ProgressionError>,
}

/// How a write affects what the match-up already sent downstream.
enum Plan {
    /// Nothing downstream changes.
    Local,
    /// First directing result.
    Direct(PositionTargets),
    /// Undo the earlier direction, then direct the new result.
    Redirect(PositionTargets),
    /// Exchange winner and loser everywhere they were already placed.
    Swap(Side),
}

/// Set the status, winning side and score of a match-up in `draw`.
///
/// A tie match-up is written into its TEAM parent, whose outcome is re-aggregated.
pub fn set_match_up_status(
    draw: &mut DrawDefinition,
    match_up_id: MatchUpId,
    outcome: &MatchUpOutcome,
    ctx: &mut Context<'_>,
) -> Result<StatusChange, ProgressionError> {
    let location = find_draw_match_up(draw, match_up_id)?;
    let structure_id = location.structure.structure_id;
    if let Some(parent) = location.tie_parent {
        let parent_id = parent.match_up_id;
        return set_tie_match_up_status(draw, structure_id, parent_id, match_up_id, outcome, ctx);
    }
    let resolved = resolve_outcome(
        location.match_up,
        location.structure.side_occupants(location.match_up),
        outcome,
        OutcomeOrigin::Caller,
        &ctx.policies,
        ctx.score_validator(),
    )?;
    apply_outcome(
        draw,
        (structure_id, match_up_id),
        resolved,
        outcome.allow_change_propagation,
        ctx,
        |_| {},
    )
}

fn set_tie_match_up_status(
    draw: &mut DrawDefinition,
    structure_id: StructureId,
    parent_id: MatchUpId,
    tie_id: MatchUpId,
    outcome: &MatchUpOutcome,
    ctx: &mut Context<'_>,
) -> Result<StatusChange, ProgressionError> {
    let (tie_outcome, parent_outcome) = {
        let structure = draw
            .structure(structure_id)
            .ok_or(ProgressionError::StructureNotFound(structure_id))?;
        let parent = structure
            .match_up(parent_id)
            .ok_or(ProgressionError::MatchUpNotFound(parent_id))?;
        let tie = parent
            .tie_match_up(tie_id)
            .ok_or(ProgressionError::MatchUpNotFound(tie_id))?;
        let tie_outcome = resolve_outcome(
            tie,
            structure.side_occupants(parent),
            outcome,
            OutcomeOrigin::Caller,
            &ctx.policies,
            ctx.score_validator(),
        )?;
        let parent_outcome = if parent.extensions.disable_auto_calc() {
            team::recorded_outcome(parent)
        } else {
            let mut preview = parent.clone();
            if let Some(tie) = preview.tie_match_up_mut(tie_id) {
                tie_outcome.clone().write_to(tie);
            }
            team::aggregate_outcome(&preview)
        };
        (tie_outcome, parent_outcome)
    };

    let mut change = apply_outcome(
        draw,
        (structure_id, parent_id),
        parent_outcome,
        outcome.allow_change_propagation,
        ctx,
        move |parent| {
            if let Some(tie) = parent.tie_match_up_mut(tie_id) {
                tie_outcome.write_to(tie);
                tie.touch();
            }
        },
    )?;
    if let Some(tie) = change.match_up.tie_match_up(tie_id) {
        change.match_up = tie.clone();
    }
    Ok(change)
}

/// Reverse the winner of a decided match-up and everything it already directed.
///
/// The score is mirrored so it keeps agreeing with the new winner.
pub fn swap_winner_loser(
    draw: &mut DrawDefinition,
    match_up_id: MatchUpId,
    ctx: &mut Context<'_>,
) -> Result<StatusChange, ProgressionError> {
    let location = find_draw_match_up(draw, match_up_id)?;
    if location.tie_parent.is_some() {
        return Err(ProgressionError::InvalidValues(
            "tie match-up winners change through their result".to_string(),
        ));
    }
    let structure_id = location.structure.structure_id;
    let match_up = location.match_up;
    let Some(winning_side) = match_up.winning_side else {
        return Err(ProgressionError::InvalidMatchUpStatus);
    };
    let mirrored = Score {
        sets: match_up
            .score
            .sets
            .iter()
            .map(|set| SetScore {
                side_1: set.side_2,
                side_2: set.side_1,
                side_1_tiebreak: set.side_2_tiebreak,
                side_2_tiebreak: set.side_1_tiebreak,
            })
            .collect(),
    };
    let resolved = ResolvedOutcome {
        match_up_status: match_up.match_up_status,
        winning_side: Some(winning_side.opposite()),
        score: mirrored,
        match_up_status_codes: match_up.match_up_status_codes.clone(),
    };
    apply_outcome(draw, (structure_id, match_up_id), resolved, true, ctx, |_| {})
}

/// Classify, write and propagate a resolved outcome. `pre_write` runs on the stored
/// match-up just before the outcome is written, after every check has passed.
fn apply_outcome<F>(
    draw: &mut DrawDefinition,
    key: MatchUpKey,
    resolved: ResolvedOutcome,
    allow_change_propagation: bool,
    ctx: &mut Context<'_>,
    pre_write: F,
) -> Result<StatusChange, ProgressionError>
where
    F: FnOnce(&mut MatchUp),
{
    let plan = plan_for(draw, key, &resolved, allow_change_propagation, ctx)?;
    let is_round_robin = draw.container_of(key.0).is_some();
    let mut propagation = Propagation::new(draw, &ctx.policies);
    let is_bye = resolved.match_up_status == MatchUpStatus::Bye;

    {
        let match_up = match_up_mut(draw, key)?;
        pre_write(match_up);
        if resolved.is_directing() {
            match_up.exit_markers = [None, None];
        }
        resolved.write_to(match_up);
    }
    propagation.match_up_modified(key);

    let mut result = match plan {
        Plan::Local => Ok(()),
        Plan::Direct(targets) => propagation.direct(draw, key, &targets),
        Plan::Redirect(targets) => propagation
            .undo_direction(draw, key, &targets)
            .and_then(|_| propagation.direct(draw, key, &targets)),
        Plan::Swap(old_winner) => propagation.swap_downstream(draw, key, old_winner),
    };
    if result.is_ok() && is_round_robin {
        result = round_robin::tally_group(draw, key.0, &mut propagation);
    }
    if is_bye {
        // Let the bye advance its opponent like an assigned bye would.
        propagation.push(Step::Evaluate(key));
    }
    if result.is_ok() {
        result = propagation.run(draw);
    }
    let aborted_branches = propagation.publish(draw, ctx);
    result?;

    Ok(StatusChange {
        match_up: match_up_ref(draw, key)?.clone(),
        aborted_branches,
    })
}

fn plan_for(
    draw: &DrawDefinition,
    key: MatchUpKey,
    resolved: &ResolvedOutcome,
    allow_change_propagation: bool,
    ctx: &Context<'_>,
) -> Result<Plan, ProgressionError> {
    if draw.container_of(key.0).is_some() {
        return Ok(Plan::Local);
    }
    let current = match_up_ref(draw, key)?;
    let prior_winner = current.winning_side;
    let prior_double = current.match_up_status.is_double_exit();
    let prior_directed = prior_winner.is_some() || prior_double;

    if !prior_directed && !resolved.is_directing() {
        return Ok(Plan::Local);
    }
    // Markers leave through the loser link only when exits propagate; double exits always send them.
    let markers_travel = prior_double || ctx.policies.progression.propagate_exit_status;
    let same_marker = !markers_travel
        || current.match_up_status.exit_marker() == resolved.match_up_status.exit_marker();
    if prior_directed
        && prior_winner == resolved.winning_side
        && prior_double == resolved.match_up_status.is_double_exit()
        && same_marker
    {
        return Ok(Plan::Local);
    }

    let targets = position_targets(draw, key.0, key.1)?;
    if !prior_directed {
        return Ok(Plan::Direct(targets));
    }
    let limit = ctx
        .policies
        .progression
        .max_propagation_steps
        .unwrap_or_else(|| propagation_limit(draw));
    let active = has_active_downstream(draw, key, &targets, limit)?;
    match (prior_winner, resolved.winning_side) {
        (Some(old_winner), Some(new_winner)) if old_winner != new_winner => {
            if !allow_change_propagation
                || !ctx.policies.progression.allow_winning_side_change_cascade
            {
                return Err(ProgressionError::CannotChangeWinningSide);
            }
            if active {
                Ok(Plan::Swap(old_winner))
            } else {
                Ok(Plan::Redirect(targets))
            }
        }
        _ if active => Err(ProgressionError::CannotChangeWinningSide),
        _ => Ok(Plan::Redirect(targets)),
    }
}

/// Input of the tournament-level entry point.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetMatchUpStatusParams {
    /// Draw owning the match-up; looked up when absent.
    pub draw_id: Option<DrawId>,
    pub match_up_id: Option<MatchUpId>,
    pub outcome: MatchUpOutcome,
}

/// Set a match-up's status within a tournament record.
///
/// Missing inputs are reported before any traversal. Notices carry the owning
/// tournament, event and draw.
pub fn set_tournament_match_up_status(
    record: Option<&mut TournamentRecord>,
    params: &SetMatchUpStatusParams,
    ctx: &mut Context<'_>,
) -> Result<StatusChange, ProgressionError> {
    let record = record.ok_or(ProgressionError::MissingTournamentRecord)?;
    let match_up_id = params.match_up_id.ok_or(ProgressionError::MissingMatchUpId)?;
    if record.events.iter().all(|e| e.draw_definitions.is_empty()) {
        return Err(ProgressionError::MissingDrawDefinition);
    }
    let draw_id = match params.draw_id {
        Some(draw_id) => draw_id,
        None => find_tournament_match_up(record, match_up_id, &MatchUpHints::default())?.draw_id,
    };
    let tournament_id = record.tournament_id;
    let (event_id, draw) = record
        .draw_mut(draw_id)
        .ok_or(ProgressionError::DrawDefinitionNotFound(draw_id))?;
    ctx.owner = Owner {
        tournament_id: Some(tournament_id),
        event_id: Some(event_id),
        draw_id: Some(draw_id),
    };
    set_match_up_status(draw, match_up_id, &params.outcome, ctx)
}

mod common;

use common::*;
use draw_progression::logic::{
    qualified_participants, qualifier_progression, random_qualifier_order,
    tournament_qualifier_progression, MatchUpOutcome, QualifierProgression,
};
use draw_progression::models::{
    DrawDefinition, Event, MatchUpStatus, MatchUpType, Occupant, ParticipantId, Stage,
    TournamentRecord,
};
use draw_progression::notify::{Notice, Topic};
use draw_progression::{Context, PolicySet, ProgressionError, Side};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn progress(
    draw: &mut DrawDefinition,
    order: Option<&[ParticipantId]>,
    policies: PolicySet,
) -> Result<QualifierProgression, ProgressionError> {
    let mut notices: Vec<Notice> = Vec::new();
    let mut ctx = Context::new(&mut notices).with_policies(policies);
    qualifier_progression(draw, 1, order, &mut ctx)
}

/// Play qualifying round 1 (side one always wins) and the given round 2 match-ups.
fn play_qualifying(f: &mut Qualifying, finals: &[u32]) {
    for rp in 1..=4 {
        let id = round_match_up(&f.draw, f.qualifying, 1, rp);
        win(&mut f.draw, id, Side::One);
    }
    for rp in finals {
        let id = round_match_up(&f.draw, f.qualifying, 2, *rp);
        win(&mut f.draw, id, Side::One);
    }
}

#[test]
fn round_two_winners_fill_the_placeholders_in_order() {
    let mut f = qualifying_into_main();
    assert!(matches!(
        progress(&mut f.draw, None, PolicySet::default()),
        Err(ProgressionError::MissingQualifiedParticipants)
    ));

    play_qualifying(&mut f, &[1]);
    let first = progress(&mut f.draw, None, PolicySet::default()).unwrap();
    assert_eq!(first.assignments.len(), 1);
    assert_eq!(first.assignments[0].participant_id, f.qualifying_players[0]);
    assert_eq!(first.assignments[0].draw_position, 2);
    assert_eq!(
        occupant(&f.draw, f.main, 2),
        Occupant::Qualifier(Some(f.qualifying_players[0]))
    );

    // Nobody new has qualified: no reassignment.
    assert!(matches!(
        progress(&mut f.draw, None, PolicySet::default()),
        Err(ProgressionError::MissingQualifiedParticipants)
    ));

    let second_final = round_match_up(&f.draw, f.qualifying, 2, 2);
    win(&mut f.draw, second_final, Side::One);
    let second = progress(&mut f.draw, None, PolicySet::default()).unwrap();
    assert_eq!(second.assignments.len(), 1);
    assert_eq!(second.assignments[0].draw_position, 7);
    assert_eq!(
        occupant(&f.draw, f.main, 7),
        Occupant::Qualifier(Some(f.qualifying_players[4]))
    );

    assert!(matches!(
        progress(&mut f.draw, None, PolicySet::default()),
        Err(ProgressionError::NoDrawPositionsAvailableForQualifiers)
    ));
}

#[test]
fn placed_qualifier_can_play_the_main_draw() {
    let mut f = qualifying_into_main();
    let main_first = round_match_up(&f.draw, f.main, 1, 1);
    let (result, _) = apply(&mut f.draw, main_first, MatchUpOutcome::winner(Side::Two));
    assert!(matches!(result, Err(ProgressionError::MissingParticipants)));

    play_qualifying(&mut f, &[1, 2]);
    progress(&mut f.draw, None, PolicySet::default()).unwrap();
    win(&mut f.draw, main_first, Side::Two);

    let main_r2 = round_match_up(&f.draw, f.main, 2, 1);
    assert_eq!(match_up(&f.draw, main_r2).draw_positions, [Some(2), None]);
}

#[test]
fn ordering_decides_which_placeholder_each_qualifier_takes() {
    let mut f = qualifying_into_main();
    play_qualifying(&mut f, &[1, 2]);
    let order = [f.qualifying_players[4], f.qualifying_players[0]];
    let result = progress(&mut f.draw, Some(&order[..]), PolicySet::default()).unwrap();

    let placed: Vec<_> = result
        .assignments
        .iter()
        .map(|a| (a.draw_position, a.participant_id))
        .collect();
    assert_eq!(placed, vec![(2, order[0]), (7, order[1])]);
}

#[test]
fn random_order_is_a_permutation_of_the_candidates() {
    let mut f = qualifying_into_main();
    play_qualifying(&mut f, &[1, 2]);
    let candidates = qualified_participants(&f.draw, 1, &PolicySet::default()).unwrap();
    assert_eq!(candidates, vec![f.qualifying_players[0], f.qualifying_players[4]]);

    let mut rng = StdRng::seed_from_u64(7);
    let mut order = random_qualifier_order(&candidates, &mut rng);
    assert_eq!(order.len(), 2);
    order.sort();
    let mut expected = candidates.clone();
    expected.sort();
    assert_eq!(order, expected);
}

#[test]
fn completion_policy_waits_for_the_whole_qualifying_structure() {
    let mut f = qualifying_into_main();
    play_qualifying(&mut f, &[1]);
    let mut policies = PolicySet::default();
    policies.progression.require_completed_qualifying_structures = true;
    assert!(matches!(
        progress(&mut f.draw, None, policies.clone()),
        Err(ProgressionError::MissingQualifiedParticipants)
    ));

    let second_final = round_match_up(&f.draw, f.qualifying, 2, 2);
    win(&mut f.draw, second_final, Side::One);
    let result = progress(&mut f.draw, None, policies).unwrap();
    assert_eq!(result.assignments.len(), 2);
}

#[test]
fn draw_without_main_stage_has_no_qualifier_targets() {
    let mut f = round_robin();
    assert!(matches!(
        progress(&mut f.draw, None, PolicySet::default()),
        Err(ProgressionError::MissingMainStructure)
    ));
}

#[test]
fn group_winners_qualify_once_their_groups_conclude() {
    let mut f = round_robin();
    let main_players = participants(2);
    let mut main = elimination("Main", Stage::Main, 4);
    fill(
        &mut main,
        &[
            Occupant::Qualifier(None),
            Occupant::Participant(main_players[0]),
            Occupant::Qualifier(None),
            Occupant::Participant(main_players[1]),
        ],
    );
    let main_id = main.structure_id;
    f.draw.links.push(position_link(f.container, None, vec![1], main_id, 1));
    f.draw.structures.push(main);

    assert!(matches!(
        progress(&mut f.draw, None, PolicySet::default()),
        Err(ProgressionError::MissingQualifiedParticipants)
    ));

    // Side one always wins: the lowest position of each group tops it.
    for group in f.groups {
        let ids: Vec<_> = f
            .draw
            .structure(group)
            .unwrap()
            .match_ups
            .iter()
            .map(|m| m.match_up_id)
            .collect();
        for id in ids {
            win(&mut f.draw, id, Side::One);
        }
    }

    let result = progress(&mut f.draw, None, PolicySet::default()).unwrap();
    let placed: Vec<_> = result
        .assignments
        .iter()
        .map(|a| (a.draw_position, a.participant_id))
        .collect();
    assert_eq!(placed, vec![(1, f.players[0]), (3, f.players[4])]);
    assert!(f
        .draw
        .structure(f.container)
        .unwrap()
        .all_match_ups()
        .iter()
        .all(|m| m.match_up_status == MatchUpStatus::Completed));
}

#[test]
fn tournament_entry_names_the_owner_in_notices() {
    let mut notices: Vec<Notice> = Vec::new();
    let mut ctx = Context::new(&mut notices);
    assert!(matches!(
        tournament_qualifier_progression(None, None, 1, None, &mut ctx),
        Err(ProgressionError::MissingTournamentRecord)
    ));

    let mut f = qualifying_into_main();
    play_qualifying(&mut f, &[1, 2]);
    let draw_id = f.draw.draw_id;
    let mut record = TournamentRecord::new("Open");
    let mut event = Event::new("Singles", MatchUpType::Singles);
    event.draw_definitions.push(f.draw);
    record.events.push(event);

    assert!(matches!(
        tournament_qualifier_progression(Some(&mut record), None, 1, None, &mut ctx),
        Err(ProgressionError::MissingDrawDefinition)
    ));
    let result =
        tournament_qualifier_progression(Some(&mut record), Some(draw_id), 1, None, &mut ctx)
            .unwrap();
    assert_eq!(result.assignments.len(), 2);
    drop(ctx);

    let positions: Vec<_> = notices
        .iter()
        .filter(|n| n.topic() == Topic::ModifyPositionAssignments)
        .collect();
    assert_eq!(positions.len(), 1);
    assert!(matches!(
        positions[0],
        Notice::ModifyPositionAssignments { owner, .. } if owner.draw_id == Some(draw_id)
    ));
}

#[test]
fn corrected_qualifying_final_moves_the_placed_qualifier() {
    let mut f = qualifying_into_main();
    play_qualifying(&mut f, &[1, 2]);
    progress(&mut f.draw, None, PolicySet::default()).unwrap();
    assert_eq!(
        occupant(&f.draw, f.main, 2),
        Occupant::Qualifier(Some(f.qualifying_players[0]))
    );

    let first_final = round_match_up(&f.draw, f.qualifying, 2, 1);
    let (result, _) = apply(
        &mut f.draw,
        first_final,
        MatchUpOutcome::winner(Side::Two).allowing_change_propagation(),
    );
    assert_eq!(result.unwrap().match_up.winning_side, Some(Side::Two));
    assert_eq!(
        occupant(&f.draw, f.main, 2),
        Occupant::Qualifier(Some(f.qualifying_players[2]))
    );
    assert_eq!(
        occupant(&f.draw, f.main, 7),
        Occupant::Qualifier(Some(f.qualifying_players[4]))
    );
    assert!(matches!(
        progress(&mut f.draw, None, PolicySet::default()),
        Err(ProgressionError::NoDrawPositionsAvailableForQualifiers)
    ));
}

#[test]
fn reverted_qualifying_final_reopens_its_placeholder() {
    let mut f = qualifying_into_main();
    play_qualifying(&mut f, &[1, 2]);
    progress(&mut f.draw, None, PolicySet::default()).unwrap();

    let first_final = round_match_up(&f.draw, f.qualifying, 2, 1);
    let (result, _) = apply(
        &mut f.draw,
        first_final,
        MatchUpOutcome::status(MatchUpStatus::ToBePlayed),
    );
    result.unwrap();
    assert_eq!(occupant(&f.draw, f.main, 2), Occupant::Qualifier(None));

    win(&mut f.draw, first_final, Side::Two);
    let replaced = progress(&mut f.draw, None, PolicySet::default()).unwrap();
    assert_eq!(replaced.assignments.len(), 1);
    assert_eq!(replaced.assignments[0].participant_id, f.qualifying_players[2]);
    assert_eq!(replaced.assignments[0].draw_position, 2);
}

#[test]
fn qualifier_result_in_the_main_draw_guards_the_qualifying_final() {
    let mut f = qualifying_into_main();
    play_qualifying(&mut f, &[1, 2]);
    progress(&mut f.draw, None, PolicySet::default()).unwrap();
    let main_first = round_match_up(&f.draw, f.main, 1, 1);
    win(&mut f.draw, main_first, Side::Two);

    let first_final = round_match_up(&f.draw, f.qualifying, 2, 1);
    let (result, _) = apply(
        &mut f.draw,
        first_final,
        MatchUpOutcome::status(MatchUpStatus::ToBePlayed),
    );
    assert!(matches!(result, Err(ProgressionError::CannotChangeWinningSide)));
    let (result, _) = apply(&mut f.draw, first_final, MatchUpOutcome::winner(Side::Two));
    assert!(matches!(result, Err(ProgressionError::CannotChangeWinningSide)));
    assert_eq!(
        occupant(&f.draw, f.main, 2),
        Occupant::Qualifier(Some(f.qualifying_players[0]))
    );

    // With propagation allowed the new qualifier inherits the main draw result.
    let (result, _) = apply(
        &mut f.draw,
        first_final,
        MatchUpOutcome::winner(Side::Two).allowing_change_propagation(),
    );
    result.unwrap();
    assert_eq!(
        occupant(&f.draw, f.main, 2),
        Occupant::Qualifier(Some(f.qualifying_players[2]))
    );
    let main_match_up = match_up(&f.draw, main_first);
    assert_eq!(main_match_up.winning_side, Some(Side::Two));
    assert_eq!(main_match_up.match_up_status, MatchUpStatus::Completed);
}

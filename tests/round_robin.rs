mod common;

use common::*;
use draw_progression::logic::{
    assign_draw_position, assign_draw_position_bye, clear_draw_position, group_standings,
    MatchUpOutcome,
};
use draw_progression::models::{DrawPosition, MatchUpId, MatchUpStatus, Occupant, Score};
use draw_progression::notify::{Notice, Topic};
use draw_progression::{Context, DrawDefinition, ProgressionError, Side, StructureId};

fn group_match_ups(draw: &DrawDefinition, group: StructureId) -> Vec<(MatchUpId, [Option<DrawPosition>; 2])> {
    draw.structure(group)
        .unwrap()
        .match_ups
        .iter()
        .map(|m| (m.match_up_id, m.draw_positions))
        .collect()
}

#[test]
fn bye_restamps_group_match_ups_without_advancing() {
    let mut f = round_robin();
    let before = group_match_ups(&f.draw, f.groups[0]);
    let mut notices: Vec<Notice> = Vec::new();
    let mut ctx = Context::new(&mut notices);

    let cleared = clear_draw_position(&mut f.draw, f.container, 4, &mut ctx).unwrap();
    assert_eq!(cleared.structure_id, f.groups[0]);
    assert_eq!(cleared.assignment.occupant, Occupant::Unassigned);

    let change = assign_draw_position_bye(&mut f.draw, f.container, 4, &mut ctx).unwrap();
    assert_eq!(change.structure_id, f.groups[0]);
    assert_eq!(change.assignment.occupant, Occupant::Bye);
    drop(ctx);

    for (id, positions) in &before {
        let stamped = match_up(&f.draw, *id);
        let expected = if positions.contains(&Some(4)) {
            MatchUpStatus::Bye
        } else {
            MatchUpStatus::ToBePlayed
        };
        assert_eq!(stamped.match_up_status, expected);
        assert_eq!(stamped.winning_side, None);
        assert_eq!(stamped.draw_positions, *positions);
    }
    assert_eq!(group_match_ups(&f.draw, f.groups[0]), before);

    let bye_notices = notices
        .iter()
        .filter_map(Notice::match_up)
        .filter(|m| m.match_up_status == MatchUpStatus::Bye)
        .count();
    assert_eq!(bye_notices, 3);
}

#[test]
fn restamp_leaves_played_match_ups_alone() {
    let mut f = round_robin();
    let played = group_match_ups(&f.draw, f.groups[0])
        .into_iter()
        .find(|(_, dps)| *dps == [Some(3), Some(4)])
        .map(|(id, _)| id)
        .unwrap();
    win(&mut f.draw, played, Side::One);

    let mut notices: Vec<Notice> = Vec::new();
    let mut ctx = Context::new(&mut notices);
    assert!(matches!(
        clear_draw_position(&mut f.draw, f.container, 4, &mut ctx),
        Err(ProgressionError::IncompatibleMatchUpStatus)
    ));
    assert_eq!(occupant(&f.draw, f.groups[0], 4), Occupant::Participant(f.players[3]));
}

#[test]
fn results_build_the_group_tally() {
    let mut f = round_robin();
    let group = f.groups[0];
    let ids: Vec<_> = group_match_ups(&f.draw, group).into_iter().map(|(id, _)| id).collect();

    let scored = MatchUpOutcome::winner(Side::One).with_score(Score::from_sets(&[(6, 3), (6, 4)]));
    let (result, notices) = apply(&mut f.draw, ids[0], scored);
    result.unwrap();
    assert!(notices
        .iter()
        .any(|n| n.topic() == Topic::ModifyPositionAssignments));
    let modified: Vec<_> = notices.iter().filter_map(Notice::match_up).collect();
    assert_eq!(modified.len(), 1);

    let tally = f
        .draw
        .structure(group)
        .unwrap()
        .assignment(1)
        .unwrap()
        .extensions
        .tally()
        .cloned()
        .unwrap();
    assert_eq!((tally.wins, tally.sets_won, tally.sets_lost), (1, 2, 0));
    assert_eq!(tally.provisional_order, 1);
    assert_eq!(tally.group_order, None);

    for id in &ids[1..] {
        win(&mut f.draw, *id, Side::One);
    }
    let standings = group_standings(&f.draw, group).unwrap();
    let order: Vec<_> = standings
        .iter()
        .map(|(dp, tally)| (*dp, tally.wins, tally.group_order))
        .collect();
    assert_eq!(
        order,
        vec![(1, 3, Some(1)), (2, 2, Some(2)), (3, 1, Some(3)), (4, 0, Some(4))]
    );
    let stored = f
        .draw
        .structure(group)
        .unwrap()
        .assignment(4)
        .unwrap()
        .extensions
        .tally()
        .cloned()
        .unwrap();
    assert_eq!((stored.losses, stored.group_order), (3, Some(4)));

    // Reopening one match-up withdraws the final order.
    let (result, _) = apply(&mut f.draw, ids[5], MatchUpOutcome::status(MatchUpStatus::ToBePlayed));
    result.unwrap();
    let reopened = f
        .draw
        .structure(group)
        .unwrap()
        .assignment(3)
        .unwrap()
        .extensions
        .tally()
        .cloned()
        .unwrap();
    assert_eq!((reopened.wins, reopened.group_order), (0, None));
}

#[test]
fn set_difference_breaks_equal_wins() {
    let mut f = round_robin();
    let group = f.groups[1];
    let matches = group_match_ups(&f.draw, group);
    let find = |a: DrawPosition, b: DrawPosition| {
        matches
            .iter()
            .find(|(_, dps)| *dps == [Some(a), Some(b)])
            .map(|(id, _)| *id)
            .unwrap()
    };
    // 5, 6 and 7 beat each other in a circle; 8 loses everything.
    let results = [
        (find(5, 6), Side::One, vec![(6, 0), (6, 0)]),
        (find(6, 7), Side::One, vec![(6, 4), (3, 6), (6, 4)]),
        (find(5, 7), Side::Two, vec![(4, 6), (6, 4), (4, 6)]),
        (find(5, 8), Side::One, vec![(6, 1), (6, 1)]),
        (find(6, 8), Side::One, vec![(6, 1), (6, 1)]),
        (find(7, 8), Side::One, vec![(6, 1), (6, 1)]),
    ];
    for (id, side, sets) in results {
        let outcome = MatchUpOutcome::winner(side).with_score(Score::from_sets(&sets));
        apply(&mut f.draw, id, outcome).0.unwrap();
    }

    let order: Vec<_> = group_standings(&f.draw, group)
        .unwrap()
        .into_iter()
        .map(|(dp, _)| dp)
        .collect();
    // Two wins each for 5, 6 and 7; sets 5-2 (5), 5-3 (7) and 4-3 (6) separate them.
    assert_eq!(order, vec![5, 7, 6, 8]);
}

#[test]
fn a_participant_holds_one_position_per_container() {
    let mut f = round_robin();
    let mut notices: Vec<Notice> = Vec::new();
    let mut ctx = Context::new(&mut notices);
    clear_draw_position(&mut f.draw, f.container, 5, &mut ctx).unwrap();
    let newcomer = participants(1)[0];

    assert!(matches!(
        assign_draw_position(&mut f.draw, f.container, 5, f.players[0], &mut ctx),
        Err(ProgressionError::InvalidValues(_))
    ));
    assert!(matches!(
        assign_draw_position(&mut f.draw, f.container, 1, f.players[1], &mut ctx),
        Err(ProgressionError::InvalidValues(_))
    ));
    assert!(matches!(
        assign_draw_position(&mut f.draw, f.container, 2, newcomer, &mut ctx),
        Err(ProgressionError::DrawPositionOccupied { draw_position: 2, .. })
    ));

    // Re-assigning the same occupant is accepted and changes nothing.
    let same = assign_draw_position(&mut f.draw, f.container, 2, f.players[1], &mut ctx).unwrap();
    assert_eq!(same.assignment.occupant, Occupant::Participant(f.players[1]));

    let placed = assign_draw_position(&mut f.draw, f.container, 5, f.players[4], &mut ctx).unwrap();
    assert_eq!(placed.structure_id, f.groups[1]);
    assert!(matches!(
        assign_draw_position(&mut f.draw, f.container, 9, f.players[4], &mut ctx),
        Err(ProgressionError::DrawPositionNotFound { draw_position: 9, .. })
    ));
}

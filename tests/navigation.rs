mod common;

use common::*;
use draw_progression::logic::{
    find_draw_match_up, find_event_match_up, find_match_up, find_structure,
    find_structure_match_up, find_structures, find_tournament_match_up, flatten_structures,
    resolve_structure, LookupPath, MatchUpHints, StructureFilter, StructureRef,
};
use draw_progression::models::{Event, MatchUpType, Stage, StructureId, TournamentRecord};
use draw_progression::ProgressionError;
use std::collections::HashMap;
use uuid::Uuid;

fn record_with(draws: Vec<draw_progression::DrawDefinition>) -> TournamentRecord {
    let mut record = TournamentRecord::new("Open");
    for (i, draw) in draws.into_iter().enumerate() {
        let mut event = Event::new(format!("Event {}", i + 1), MatchUpType::Singles);
        event.draw_definitions.push(draw);
        record.events.push(event);
    }
    record
}

#[test]
fn structures_are_found_directly_or_by_id() {
    let f = round_robin();
    let group = f.groups[1];

    let lookup = find_structure(&f.draw, group).unwrap();
    assert_eq!(lookup.structure.structure_id, group);
    assert_eq!(lookup.container.map(|c| c.structure_id), Some(f.container));

    let top = find_structure(&f.draw, f.container).unwrap();
    assert!(top.container.is_none());

    let direct = resolve_structure(&f.draw, StructureRef::Direct(lookup.structure)).unwrap();
    assert_eq!(direct.structure_id, group);

    let missing: StructureId = Uuid::new_v4();
    assert!(matches!(
        resolve_structure(&f.draw, StructureRef::Id(missing)),
        Err(ProgressionError::StructureNotFound(id)) if id == missing
    ));
}

#[test]
fn flattening_lists_parents_before_children() {
    let f = round_robin();
    let ids: Vec<_> = flatten_structures(&f.draw.structures)
        .iter()
        .map(|s| s.structure_id)
        .collect();
    assert_eq!(ids, vec![f.container, f.groups[0], f.groups[1]]);
}

#[test]
fn structure_filter_matches_stage_and_round_target() {
    let mut f = qualifying_into_main();
    f.draw
        .structure_mut(f.qualifying)
        .unwrap()
        .extensions
        .set_round_target(1);

    let main = StructureFilter {
        stage: Some(Stage::Main),
        ..StructureFilter::default()
    };
    let found: Vec<_> = find_structures(&f.draw, &main).iter().map(|s| s.structure_id).collect();
    assert_eq!(found, vec![f.main]);

    let targeted = StructureFilter {
        round_target: Some(1),
        ..StructureFilter::default()
    };
    let found: Vec<_> = find_structures(&f.draw, &targeted)
        .iter()
        .map(|s| s.structure_id)
        .collect();
    assert_eq!(found, vec![f.qualifying]);

    let nothing = StructureFilter {
        stage: Some(Stage::Consolation),
        ..StructureFilter::default()
    };
    assert!(find_structures(&f.draw, &nothing).is_empty());
    assert_eq!(find_structures(&f.draw, &StructureFilter::default()).len(), 2);
}

#[test]
fn match_up_lookup_reports_group_and_tie_owners() {
    let f = round_robin();
    let in_group = f.draw.structure(f.groups[0]).unwrap().match_ups[2].match_up_id;
    let location = find_draw_match_up(&f.draw, in_group).unwrap();
    assert_eq!(location.structure.structure_id, f.groups[0]);
    assert_eq!(location.container.map(|c| c.structure_id), Some(f.container));
    assert!(location.tie_parent.is_none());

    let container = f.draw.structure(f.container).unwrap();
    assert!(find_structure_match_up(container, in_group).is_ok());

    let teams = team_draw();
    let parent = round_match_up(&teams.draw, teams.main, 1, 1);
    let tie = match_up(&teams.draw, parent).tie_match_ups[1].match_up_id;
    let location = find_draw_match_up(&teams.draw, tie).unwrap();
    assert_eq!(location.match_up.match_up_id, tie);
    assert_eq!(location.tie_parent.map(|p| p.match_up_id), Some(parent));
    assert_eq!(location.structure.structure_id, teams.main);
}

#[test]
fn unknown_match_up_is_not_found() {
    let f = single_elimination(4);
    let missing = Uuid::new_v4();
    assert!(matches!(
        find_draw_match_up(&f.draw, missing),
        Err(ProgressionError::MatchUpNotFound(id)) if id == missing
    ));
    let mut event = Event::new("Singles", MatchUpType::Singles);
    event.draw_definitions.push(f.draw);
    assert!(matches!(
        find_event_match_up(&event, missing),
        Err(ProgressionError::MatchUpNotFound(_))
    ));
}

#[test]
fn hinted_lookup_is_direct_and_falls_back_to_a_scan() {
    let first = single_elimination(4);
    let second = single_elimination(8);
    let target = round_match_up(&second.draw, second.main, 2, 2);
    let second_draw = second.draw.draw_id;
    let first_draw = first.draw.draw_id;
    let record = record_with(vec![first.draw, second.draw]);

    let found = find_tournament_match_up(&record, target, &MatchUpHints::default()).unwrap();
    assert_eq!(found.path, LookupPath::BruteForce);
    assert_eq!(found.draw_id, second_draw);
    assert_eq!(found.event_id, record.events[1].event_id);

    let hints = MatchUpHints {
        draw_id: Some(second_draw),
        ..MatchUpHints::default()
    };
    let found = find_tournament_match_up(&record, target, &hints).unwrap();
    assert_eq!(found.path, LookupPath::Direct);
    assert_eq!(found.location.match_up.match_up_id, target);

    // A wrong hint still finds the match-up.
    let wrong = MatchUpHints {
        draw_id: Some(first_draw),
        ..MatchUpHints::default()
    };
    let found = find_tournament_match_up(&record, target, &wrong).unwrap();
    assert_eq!(found.path, LookupPath::BruteForce);
    assert_eq!(found.draw_id, second_draw);
}

#[test]
fn lookup_across_tournaments() {
    let none: Vec<TournamentRecord> = Vec::new();
    assert!(matches!(
        find_match_up(&none, Uuid::new_v4(), &MatchUpHints::default()),
        Err(ProgressionError::MissingTournamentRecord)
    ));

    let first = single_elimination(4);
    let second = single_elimination(4);
    let target = round_match_up(&second.draw, second.main, 1, 2);
    let draw_id = second.draw.draw_id;
    let records = vec![record_with(vec![first.draw]), record_with(vec![second.draw])];

    let found = find_match_up(&records, target, &MatchUpHints::default()).unwrap();
    assert_eq!(found.tournament_id, records[1].tournament_id);
    assert_eq!(found.path, LookupPath::BruteForce);

    let hints = MatchUpHints {
        tournament_id: Some(records[1].tournament_id),
        event_id: Some(records[1].events[0].event_id),
        draw_id: Some(draw_id),
    };
    let found = find_match_up(&records, target, &hints).unwrap();
    assert_eq!(found.path, LookupPath::Direct);

    let missing = Uuid::new_v4();
    assert!(matches!(
        find_match_up(&records, missing, &hints),
        Err(ProgressionError::MatchUpNotFound(id)) if id == missing
    ));
}

#[test]
fn event_hint_alone_resolves_directly() {
    let first = single_elimination(4);
    let second = single_elimination(8);
    let target = round_match_up(&second.draw, second.main, 3, 1);
    let second_draw = second.draw.draw_id;
    let record = record_with(vec![first.draw, second.draw]);

    let hints = MatchUpHints {
        event_id: Some(record.events[1].event_id),
        ..MatchUpHints::default()
    };
    let found = find_tournament_match_up(&record, target, &hints).unwrap();
    assert_eq!(found.path, LookupPath::Direct);
    assert_eq!(found.draw_id, second_draw);
    assert_eq!(found.event_id, record.events[1].event_id);

    let wrong = MatchUpHints {
        event_id: Some(record.events[0].event_id),
        ..MatchUpHints::default()
    };
    let found = find_tournament_match_up(&record, target, &wrong).unwrap();
    assert_eq!(found.path, LookupPath::BruteForce);
    assert_eq!(found.draw_id, second_draw);
}

#[test]
fn lookup_borrows_records_from_a_map() {
    let first = single_elimination(4);
    let second = single_elimination(4);
    let target = round_match_up(&second.draw, second.main, 2, 1);
    let by_id: HashMap<_, _> = [record_with(vec![first.draw]), record_with(vec![second.draw])]
        .into_iter()
        .map(|r| (r.tournament_id, r))
        .collect();
    let owner = by_id
        .values()
        .find(|r| r.events[0].draw_definitions[0].all_match_ups().iter().any(|m| m.match_up_id == target))
        .unwrap()
        .tournament_id;

    let found = find_match_up(by_id.values(), target, &MatchUpHints::default()).unwrap();
    assert_eq!(found.tournament_id, owner);

    let hints = MatchUpHints {
        tournament_id: Some(owner),
        ..MatchUpHints::default()
    };
    let found = find_match_up(by_id.values(), target, &hints).unwrap();
    assert_eq!(found.tournament_id, owner);
    assert_eq!(found.location.match_up.match_up_id, target);

    let empty: HashMap<draw_progression::models::TournamentId, TournamentRecord> = HashMap::new();
    assert!(matches!(
        find_match_up(empty.values(), target, &MatchUpHints::default()),
        Err(ProgressionError::MissingTournamentRecord)
    ));
}

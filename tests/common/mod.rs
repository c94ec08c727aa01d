//! Shared draw fixtures. Draws are assembled by hand here; bracket generation lives elsewhere.
#![allow(dead_code)]

use draw_progression::logic::MatchUpOutcome;
use draw_progression::models::{
    CollectionDefinition, DrawDefinition, DrawLink, DrawPosition, LinkSource, LinkTarget,
    LinkType, MatchUp, MatchUpId, MatchUpType, Occupant, Participant, ParticipantId, Stage,
    Structure, StructureId, TieFormat,
};
use draw_progression::notify::Notice;
use draw_progression::{
    set_match_up_status, Context, PolicySet, ProgressionError, Side, StatusChange,
};

pub fn participants(n: usize) -> Vec<ParticipantId> {
    (0..n)
        .map(|i| Participant::new(format!("P{}", i + 1)).participant_id)
        .collect()
}

/// Elimination structure with positions 1..=draw_size: round 1 pairs (1,2), (3,4)...,
/// later rounds empty until advanced into.
pub fn elimination(name: &str, stage: Stage, draw_size: u32) -> Structure {
    let mut structure = Structure::item(name, stage, 1, draw_size);
    let id = structure.structure_id;
    let mut count = draw_size / 2;
    let mut round = 1;
    while count >= 1 {
        for rp in 1..=count {
            let draw_positions = if round == 1 {
                [Some(2 * rp - 1), Some(2 * rp)]
            } else {
                [None, None]
            };
            structure.match_ups.push(MatchUp::new(id, round, rp, draw_positions));
        }
        count /= 2;
        round += 1;
    }
    structure
}

/// Round robin group over positions `first..first + size`, every pair meeting once.
pub fn round_robin_group(name: &str, first: DrawPosition, size: u32) -> Structure {
    let mut group = Structure::item(name, Stage::Qualifying, first, size);
    let id = group.structure_id;
    let positions: Vec<DrawPosition> = (first..first + size).collect();
    let mut rp = 0;
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            rp += 1;
            group.match_ups.push(MatchUp::new(id, 1, rp, [Some(*a), Some(*b)]));
        }
    }
    group
}

/// Fill positions 1.. of a structure in order.
pub fn fill(structure: &mut Structure, occupants: &[Occupant]) {
    for (i, occupant) in occupants.iter().enumerate() {
        if let Some(a) = structure.assignment_mut(i as DrawPosition + 1) {
            a.occupant = *occupant;
        }
    }
}

pub fn as_occupants(ids: &[ParticipantId]) -> Vec<Occupant> {
    ids.iter().map(|p| Occupant::Participant(*p)).collect()
}

pub fn round_match_up(draw: &DrawDefinition, structure_id: StructureId, round: u32, rp: u32) -> MatchUpId {
    draw.structure(structure_id)
        .unwrap()
        .round_match_ups(round)
        .into_iter()
        .find(|m| m.round_position == rp)
        .unwrap()
        .match_up_id
}

pub fn match_up(draw: &DrawDefinition, match_up_id: MatchUpId) -> &MatchUp {
    draw.all_match_ups()
        .into_iter()
        .find(|m| m.match_up_id == match_up_id)
        .unwrap()
}

pub fn occupant(draw: &DrawDefinition, structure_id: StructureId, draw_position: DrawPosition) -> Occupant {
    draw.structure(structure_id)
        .unwrap()
        .occupant(draw_position)
        .unwrap()
}

/// Apply `outcome` with default policies, returning the result and the notices raised.
pub fn apply(
    draw: &mut DrawDefinition,
    match_up_id: MatchUpId,
    outcome: MatchUpOutcome,
) -> (Result<StatusChange, ProgressionError>, Vec<Notice>) {
    let mut notices: Vec<Notice> = Vec::new();
    let result = {
        let mut ctx = Context::new(&mut notices);
        set_match_up_status(draw, match_up_id, &outcome, &mut ctx)
    };
    (result, notices)
}

/// Like [`apply`] with explicit policies.
pub fn apply_with(
    draw: &mut DrawDefinition,
    match_up_id: MatchUpId,
    outcome: MatchUpOutcome,
    policies: &PolicySet,
) -> Result<StatusChange, ProgressionError> {
    let mut notices: Vec<Notice> = Vec::new();
    let mut ctx = Context::new(&mut notices).with_policies(policies.clone());
    set_match_up_status(draw, match_up_id, &outcome, &mut ctx)
}

pub fn propagating_exits() -> PolicySet {
    let mut policies = PolicySet::default();
    policies.progression.propagate_exit_status = true;
    policies
}

pub fn win(draw: &mut DrawDefinition, match_up_id: MatchUpId, side: Side) -> StatusChange {
    apply(draw, match_up_id, MatchUpOutcome::winner(side)).0.unwrap()
}

/// Single elimination main draw of `draw_size`, fully filled with participants.
pub struct SingleElimination {
    pub draw: DrawDefinition,
    pub main: StructureId,
    pub players: Vec<ParticipantId>,
}

pub fn single_elimination(draw_size: u32) -> SingleElimination {
    let players = participants(draw_size as usize);
    let mut main = elimination("Main", Stage::Main, draw_size);
    fill(&mut main, &as_occupants(&players));
    let id = main.structure_id;
    let mut draw = DrawDefinition::new("Singles");
    draw.structures.push(main);
    SingleElimination {
        draw,
        main: id,
        players,
    }
}

/// Main draw of 8 with a feed-in consolation: round 1 losers fill consolation positions 1-4,
/// round 2 losers are fed into positions 5-6 of consolation round 2.
pub struct FeedIn {
    pub draw: DrawDefinition,
    pub main: StructureId,
    pub consolation: StructureId,
    pub players: Vec<ParticipantId>,
}

pub fn feed_in_consolation() -> FeedIn {
    let players = participants(8);
    let mut main = elimination("Main", Stage::Main, 8);
    fill(&mut main, &as_occupants(&players));

    let mut consolation = Structure::item("Consolation", Stage::Consolation, 1, 6);
    let cid = consolation.structure_id;
    consolation.match_ups = vec![
        MatchUp::new(cid, 1, 1, [Some(1), Some(2)]),
        MatchUp::new(cid, 1, 2, [Some(3), Some(4)]),
        MatchUp::new(cid, 2, 1, [None, Some(5)]),
        MatchUp::new(cid, 2, 2, [None, Some(6)]),
        MatchUp::new(cid, 3, 1, [None, None]),
    ];

    let mid = main.structure_id;
    let mut draw = DrawDefinition::new("Feed in");
    draw.links = vec![
        loser_link(mid, 1, cid, 1, vec![1, 2, 3, 4]),
        loser_link(mid, 2, cid, 2, vec![5, 6]),
    ];
    draw.structures = vec![main, consolation];
    FeedIn {
        draw,
        main: mid,
        consolation: cid,
        players,
    }
}

pub fn loser_link(
    source: StructureId,
    source_round: u32,
    target: StructureId,
    target_round: u32,
    draw_positions: Vec<DrawPosition>,
) -> DrawLink {
    DrawLink {
        link_type: LinkType::Loser,
        source: LinkSource {
            structure_id: source,
            round_number: Some(source_round),
            finishing_positions: Vec::new(),
        },
        target: LinkTarget {
            structure_id: target,
            round_number: target_round,
            draw_positions,
        },
    }
}

pub fn position_link(source: StructureId, source_round: Option<u32>, finishing_positions: Vec<u32>, target: StructureId, target_round: u32) -> DrawLink {
    DrawLink {
        link_type: LinkType::Position,
        source: LinkSource {
            structure_id: source,
            round_number: source_round,
            finishing_positions,
        },
        target: LinkTarget {
            structure_id: target,
            round_number: target_round,
            draw_positions: Vec::new(),
        },
    }
}

/// East 8 → West 4 (East round 1 losers) → South 2 (West round 1 losers).
pub struct Compass {
    pub draw: DrawDefinition,
    pub east: StructureId,
    pub west: StructureId,
    pub south: StructureId,
    pub players: Vec<ParticipantId>,
}

pub fn compass() -> Compass {
    let players = participants(8);
    let mut east = elimination("East", Stage::Main, 8);
    fill(&mut east, &as_occupants(&players));
    let west = elimination("West", Stage::Consolation, 4);
    let south = elimination("South", Stage::Consolation, 2);
    let (e, w, s) = (east.structure_id, west.structure_id, south.structure_id);
    let mut draw = DrawDefinition::new("Compass");
    draw.links = vec![loser_link(e, 1, w, 1, vec![1, 2, 3, 4]), loser_link(w, 1, s, 1, vec![1, 2])];
    draw.structures = vec![east, west, south];
    Compass {
        draw,
        east: e,
        west: w,
        south: s,
        players,
    }
}

/// Qualifying 8 (two rounds, round 2 winners qualify) feeding qualifier placeholders
/// at main positions 2 and 7.
pub struct Qualifying {
    pub draw: DrawDefinition,
    pub qualifying: StructureId,
    pub main: StructureId,
    pub qualifying_players: Vec<ParticipantId>,
    pub main_players: Vec<ParticipantId>,
}

pub fn qualifying_into_main() -> Qualifying {
    let qualifying_players = participants(8);
    let mut qualifying = elimination("Qualifying", Stage::Qualifying, 8);
    qualifying.match_ups.retain(|m| m.round_number <= 2);
    fill(&mut qualifying, &as_occupants(&qualifying_players));

    let main_players = participants(6);
    let mut main = elimination("Main", Stage::Main, 8);
    let mut occupants = as_occupants(&main_players);
    occupants.insert(1, Occupant::Qualifier(None));
    occupants.insert(6, Occupant::Qualifier(None));
    fill(&mut main, &occupants);

    let (q, m) = (qualifying.structure_id, main.structure_id);
    let mut draw = DrawDefinition::new("With qualifying");
    draw.links = vec![position_link(q, Some(2), Vec::new(), m, 1)];
    draw.structures = vec![main, qualifying];
    Qualifying {
        draw,
        qualifying: q,
        main: m,
        qualifying_players,
        main_players,
    }
}

/// Round robin container of two groups of four (positions 1-4 and 5-8).
pub struct RoundRobin {
    pub draw: DrawDefinition,
    pub container: StructureId,
    pub groups: [StructureId; 2],
    pub players: Vec<ParticipantId>,
}

pub fn round_robin() -> RoundRobin {
    let players = participants(8);
    let mut first = round_robin_group("Group A", 1, 4);
    let mut second = round_robin_group("Group B", 5, 4);
    for (i, p) in players.iter().enumerate() {
        let dp = i as DrawPosition + 1;
        let group = if dp <= 4 { &mut first } else { &mut second };
        group.assignment_mut(dp).unwrap().occupant = Occupant::Participant(*p);
    }
    let groups = [first.structure_id, second.structure_id];
    let container = Structure::container("Round robin", Stage::Qualifying, vec![first, second]);
    let cid = container.structure_id;
    let mut draw = DrawDefinition::new("Groups");
    draw.structures.push(container);
    RoundRobin {
        draw,
        container: cid,
        groups,
        players,
    }
}

pub fn tie_format() -> TieFormat {
    TieFormat {
        collection_definitions: vec![
            CollectionDefinition {
                collection_id: "singles".to_string(),
                match_up_type: MatchUpType::Singles,
                match_up_count: 2,
                match_up_value: 1,
            },
            CollectionDefinition {
                collection_id: "doubles".to_string(),
                match_up_type: MatchUpType::Doubles,
                match_up_count: 1,
                match_up_value: 1,
            },
        ],
        value_goal: Some(2),
    }
}

/// TEAM draw of four teams; each TEAM match-up holds two singles and one doubles tie.
pub fn team_draw() -> SingleElimination {
    let teams: Vec<ParticipantId> = (0..4)
        .map(|i| Participant::team(format!("Team {}", i + 1)).participant_id)
        .collect();
    let mut main = elimination("Main", Stage::Main, 4);
    fill(&mut main, &as_occupants(&teams));
    let id = main.structure_id;
    for parent in &mut main.match_ups {
        parent.match_up_type = MatchUpType::Team;
        parent.tie_format = Some(tie_format());
        for (i, collection) in ["singles", "singles", "doubles"].iter().enumerate() {
            let mut tie = MatchUp::new(id, parent.round_number, i as u32 + 1, [None, None]);
            tie.collection_id = Some(collection.to_string());
            tie.match_up_type = if *collection == "doubles" {
                MatchUpType::Doubles
            } else {
                MatchUpType::Singles
            };
            parent.tie_match_ups.push(tie);
        }
    }
    let mut draw = DrawDefinition::new("Teams");
    draw.match_up_type = MatchUpType::Team;
    draw.structures.push(main);
    SingleElimination {
        draw,
        main: id,
        players: teams,
    }
}

//! Structure, position assignments and occupants.

use crate::models::extension::Extensions;
use crate::models::match_up::{MatchUp, MatchUpId, Side};
use crate::models::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a structure.
pub type StructureId = Uuid;

/// 1-based slot within a structure, stable for the structure's lifetime.
pub type DrawPosition = u32;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Qualifying,
    Main,
    Consolation,
    Playoff,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StructureType {
    /// A normal bracket or group.
    #[default]
    Item,
    /// Owns child structures (round robin groups).
    Container,
}

/// What currently fills a draw position.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "participant_id", rename_all = "snake_case")]
pub enum Occupant {
    #[default]
    Unassigned,
    Participant(ParticipantId),
    Bye,
    /// Placeholder for a qualifier; holds the participant once qualifier progression fills it.
    Qualifier(Option<ParticipantId>),
}

impl Occupant {
    pub fn participant_id(&self) -> Option<ParticipantId> {
        match self {
            Occupant::Participant(id) | Occupant::Qualifier(Some(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Occupant::Bye)
    }

    pub fn is_unfilled_qualifier(&self) -> bool {
        matches!(self, Occupant::Qualifier(None))
    }

    pub fn is_vacant(&self) -> bool {
        matches!(self, Occupant::Unassigned | Occupant::Qualifier(None))
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PositionAssignment {
    pub draw_position: DrawPosition,
    pub occupant: Occupant,
    #[serde(default)]
    pub extensions: Extensions,
}

impl PositionAssignment {
    pub fn new(draw_position: DrawPosition) -> Self {
        Self {
            draw_position,
            ..Self::default()
        }
    }
}

/// One bracket, group, or sub-bracket within a draw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub structure_id: StructureId,
    pub structure_name: String,
    pub stage: Stage,
    pub stage_sequence: u32,
    pub structure_type: StructureType,
    /// Empty on containers; the children own the positions.
    #[serde(default)]
    pub position_assignments: Vec<PositionAssignment>,
    #[serde(default)]
    pub match_ups: Vec<MatchUp>,
    /// Child structures (only on containers).
    #[serde(default)]
    pub structures: Vec<Structure>,
    #[serde(default)]
    pub extensions: Extensions,
}

impl Structure {
    /// Create an ITEM structure with unassigned positions `first..first + draw_size`.
    pub fn item(name: impl Into<String>, stage: Stage, first: DrawPosition, draw_size: u32) -> Self {
        Self {
            structure_id: Uuid::new_v4(),
            structure_name: name.into(),
            stage,
            stage_sequence: 1,
            structure_type: StructureType::Item,
            position_assignments: (first..first + draw_size).map(PositionAssignment::new).collect(),
            match_ups: Vec::new(),
            structures: Vec::new(),
            extensions: Extensions::default(),
        }
    }

    /// Create a CONTAINER owning `children`; their match-ups are stamped with this container's id.
    pub fn container(name: impl Into<String>, stage: Stage, mut children: Vec<Structure>) -> Self {
        let structure_id = Uuid::new_v4();
        for child in &mut children {
            for m in &mut child.match_ups {
                m.container_structure_id = Some(structure_id);
            }
        }
        Self {
            structure_id,
            structure_name: name.into(),
            stage,
            stage_sequence: 1,
            structure_type: StructureType::Container,
            position_assignments: Vec::new(),
            match_ups: Vec::new(),
            structures: children,
            extensions: Extensions::default(),
        }
    }

    pub fn is_container(&self) -> bool {
        self.structure_type == StructureType::Container
    }

    pub fn draw_size(&self) -> usize {
        if self.is_container() {
            self.structures.iter().map(Structure::draw_size).sum()
        } else {
            self.position_assignments.len()
        }
    }

    /// Every position assignment, including those of child structures.
    pub fn all_position_assignments(&self) -> Vec<&PositionAssignment> {
        let mut all: Vec<&PositionAssignment> = self.position_assignments.iter().collect();
        for child in &self.structures {
            all.extend(child.all_position_assignments());
        }
        all
    }

    pub fn assignment(&self, draw_position: DrawPosition) -> Option<&PositionAssignment> {
        self.position_assignments
            .iter()
            .find(|a| a.draw_position == draw_position)
            .or_else(|| {
                self.structures
                    .iter()
                    .find_map(|child| child.assignment(draw_position))
            })
    }

    pub fn assignment_mut(&mut self, draw_position: DrawPosition) -> Option<&mut PositionAssignment> {
        if let Some(idx) = self
            .position_assignments
            .iter()
            .position(|a| a.draw_position == draw_position)
        {
            return self.position_assignments.get_mut(idx);
        }
        self.structures
            .iter_mut()
            .find_map(|child| child.assignment_mut(draw_position))
    }

    pub fn occupant(&self, draw_position: DrawPosition) -> Option<Occupant> {
        self.assignment(draw_position).map(|a| a.occupant)
    }

    /// Occupants feeding the two sides of `match_up` (`None` where no draw position is set yet).
    pub fn side_occupants(&self, match_up: &MatchUp) -> [Option<Occupant>; 2] {
        match_up
            .draw_positions
            .map(|dp| dp.and_then(|dp| self.occupant(dp)))
    }

    pub fn side_participant(&self, match_up: &MatchUp, side: Side) -> Option<ParticipantId> {
        self.side_occupants(match_up)[side.index()].and_then(|o| o.participant_id())
    }

    /// Every match-up, including those of child structures.
    pub fn all_match_ups(&self) -> Vec<&MatchUp> {
        let mut all: Vec<&MatchUp> = self.match_ups.iter().collect();
        for child in &self.structures {
            all.extend(child.all_match_ups());
        }
        all
    }

    pub fn match_up(&self, match_up_id: MatchUpId) -> Option<&MatchUp> {
        self.match_ups.iter().find(|m| m.match_up_id == match_up_id)
    }

    pub fn match_up_mut(&mut self, match_up_id: MatchUpId) -> Option<&mut MatchUp> {
        self.match_ups
            .iter_mut()
            .find(|m| m.match_up_id == match_up_id)
    }

    /// Match-ups of one round ordered by round position.
    pub fn round_match_ups(&self, round_number: u32) -> Vec<&MatchUp> {
        let mut round: Vec<&MatchUp> = self
            .match_ups
            .iter()
            .filter(|m| m.round_number == round_number)
            .collect();
        round.sort_by_key(|m| m.round_position);
        round
    }

    pub fn round_count(&self) -> u32 {
        self.match_ups.iter().map(|m| m.round_number).max().unwrap_or(0)
    }

    /// First round in which `draw_position` appears, if any.
    pub fn first_round_of(&self, draw_position: DrawPosition) -> Option<u32> {
        self.match_ups
            .iter()
            .filter(|m| m.side_of(draw_position).is_some())
            .map(|m| m.round_number)
            .min()
    }

    /// Every match-up (including children's) is concluded.
    pub fn is_complete(&self) -> bool {
        let all = self.all_match_ups();
        !all.is_empty() && all.iter().all(|m| m.match_up_status.is_concluded())
    }
}

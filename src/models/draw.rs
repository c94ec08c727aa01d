//! DrawDefinition and the link graph between its structures.

use crate::models::match_up::{MatchUp, MatchUpId, MatchUpType};
use crate::models::structure::{DrawPosition, Stage, Structure, StructureId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a draw.
pub type DrawId = Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkType {
    Winner,
    Loser,
    /// Finishing positions of a qualifying structure placed into main-draw qualifier slots.
    Position,
}

/// Where a link takes its occupants from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LinkSource {
    pub structure_id: StructureId,
    /// Round whose winners/losers are moved (WINNER/LOSER) or whose winners qualify (POSITION).
    pub round_number: Option<u32>,
    /// Group finishing positions that qualify (POSITION links from round robin containers).
    #[serde(default)]
    pub finishing_positions: Vec<u32>,
}

/// Where a link places its occupants.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LinkTarget {
    pub structure_id: StructureId,
    pub round_number: u32,
    /// Target position for the source round's match-up at round position `i + 1`.
    #[serde(default)]
    pub draw_positions: Vec<DrawPosition>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DrawLink {
    pub link_type: LinkType,
    pub source: LinkSource,
    pub target: LinkTarget,
}

impl DrawLink {
    /// Target position fed by the source round match-up at `round_position`.
    pub fn target_position(&self, round_position: u32) -> Option<DrawPosition> {
        let idx = usize::try_from(round_position).ok()?.checked_sub(1)?;
        self.target.draw_positions.get(idx).copied()
    }

    pub fn is_from_round(&self, structure_id: StructureId, round_number: u32) -> bool {
        self.source.structure_id == structure_id && self.source.round_number == Some(round_number)
    }
}

/// A draw: its structures and the links between them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawDefinition {
    pub draw_id: DrawId,
    pub draw_name: String,
    #[serde(default)]
    pub match_up_type: MatchUpType,
    pub structures: Vec<Structure>,
    #[serde(default)]
    pub links: Vec<DrawLink>,
}

impl DrawDefinition {
    pub fn new(draw_name: impl Into<String>) -> Self {
        Self {
            draw_id: Uuid::new_v4(),
            draw_name: draw_name.into(),
            match_up_type: MatchUpType::Singles,
            structures: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Structure by id, searching container children.
    pub fn structure(&self, structure_id: StructureId) -> Option<&Structure> {
        fn walk(list: &[Structure], id: StructureId) -> Option<&Structure> {
            list.iter().find_map(|s| {
                if s.structure_id == id {
                    Some(s)
                } else {
                    walk(&s.structures, id)
                }
            })
        }
        walk(&self.structures, structure_id)
    }

    pub fn structure_mut(&mut self, structure_id: StructureId) -> Option<&mut Structure> {
        fn walk(list: &mut [Structure], id: StructureId) -> Option<&mut Structure> {
            for s in list.iter_mut() {
                if s.structure_id == id {
                    return Some(s);
                }
                if let Some(found) = walk(&mut s.structures, id) {
                    return Some(found);
                }
            }
            None
        }
        walk(&mut self.structures, structure_id)
    }

    /// Container owning `structure_id`, if it is a child structure.
    pub fn container_of(&self, structure_id: StructureId) -> Option<&Structure> {
        fn walk(list: &[Structure], id: StructureId) -> Option<&Structure> {
            list.iter().find_map(|s| {
                if s.structures.iter().any(|c| c.structure_id == id) {
                    Some(s)
                } else {
                    walk(&s.structures, id)
                }
            })
        }
        walk(&self.structures, structure_id)
    }

    pub fn main_structure(&self) -> Option<&Structure> {
        self.structures
            .iter()
            .filter(|s| s.stage == Stage::Main)
            .min_by_key(|s| s.stage_sequence)
    }

    pub fn match_up_count(&self) -> usize {
        self.structures.iter().map(|s| s.all_match_ups().len()).sum()
    }

    /// Every match-up of every structure, tie match-ups excluded.
    pub fn all_match_ups(&self) -> Vec<&MatchUp> {
        self.structures.iter().flat_map(|s| s.all_match_ups()).collect()
    }

    /// Structure id owning the (top-level or tie) match-up.
    pub fn structure_id_of(&self, match_up_id: MatchUpId) -> Option<StructureId> {
        self.all_match_ups().into_iter().find_map(|m| {
            if m.match_up_id == match_up_id || m.tie_match_up(match_up_id).is_some() {
                Some(m.structure_id)
            } else {
                None
            }
        })
    }

    pub fn links_from(&self, structure_id: StructureId) -> impl Iterator<Item = &DrawLink> {
        self.links
            .iter()
            .filter(move |l| l.source.structure_id == structure_id)
    }
}

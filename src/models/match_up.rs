//! MatchUp, Side, and the TEAM tie format.

use crate::models::extension::Extensions;
use crate::models::score::Score;
use crate::models::status::MatchUpStatus;
use crate::models::structure::{DrawPosition, StructureId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match-up.
pub type MatchUpId = Uuid;

/// One of the two sides of a match-up.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }

    pub fn from_index(index: usize) -> Self {
        if index == 0 {
            Side::One
        } else {
            Side::Two
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchUpType {
    #[default]
    Singles,
    Doubles,
    Team,
}

/// One collection of a tie format, e.g. "2 singles worth 1 point each".
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CollectionDefinition {
    pub collection_id: String,
    pub match_up_type: MatchUpType,
    pub match_up_count: u32,
    pub match_up_value: u32,
}

/// Win criterion and composition of a TEAM match-up.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TieFormat {
    pub collection_definitions: Vec<CollectionDefinition>,
    /// Value a side must reach to win; defaults to a strict majority of the total.
    pub value_goal: Option<u32>,
}

impl TieFormat {
    pub fn total_value(&self) -> u32 {
        self.collection_definitions
            .iter()
            .map(|c| c.match_up_count * c.match_up_value)
            .sum()
    }

    pub fn value_goal(&self) -> u32 {
        self.value_goal.unwrap_or(self.total_value() / 2 + 1)
    }

    pub fn collection_value(&self, collection_id: &str) -> u32 {
        self.collection_definitions
            .iter()
            .find(|c| c.collection_id == collection_id)
            .map(|c| c.match_up_value)
            .unwrap_or(1)
    }
}

/// A single match-up inside a structure (or inside a TEAM match-up as a tie match-up).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchUp {
    pub match_up_id: MatchUpId,
    pub structure_id: StructureId,
    /// Round robin container owning the group this match-up belongs to.
    pub container_structure_id: Option<StructureId>,
    pub round_number: u32,
    pub round_position: u32,
    /// Draw positions feeding each side; `None` until advanced into.
    pub draw_positions: [Option<DrawPosition>; 2],
    pub match_up_type: MatchUpType,
    pub match_up_status: MatchUpStatus,
    pub winning_side: Option<Side>,
    #[serde(default)]
    pub score: Score,
    #[serde(default)]
    pub match_up_status_codes: Vec<String>,
    pub match_up_format: Option<String>,
    /// Pending exit carried into each side by propagation.
    #[serde(default)]
    pub exit_markers: [Option<MatchUpStatus>; 2],
    pub tie_format: Option<TieFormat>,
    #[serde(default)]
    pub tie_match_ups: Vec<MatchUp>,
    pub collection_id: Option<String>,
    #[serde(default)]
    pub extensions: Extensions,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MatchUp {
    pub fn new(
        structure_id: StructureId,
        round_number: u32,
        round_position: u32,
        draw_positions: [Option<DrawPosition>; 2],
    ) -> Self {
        Self {
            match_up_id: Uuid::new_v4(),
            structure_id,
            container_structure_id: None,
            round_number,
            round_position,
            draw_positions,
            match_up_type: MatchUpType::Singles,
            match_up_status: MatchUpStatus::ToBePlayed,
            winning_side: None,
            score: Score::default(),
            match_up_status_codes: Vec::new(),
            match_up_format: None,
            exit_markers: [None, None],
            tie_format: None,
            tie_match_ups: Vec::new(),
            collection_id: None,
            extensions: Extensions::default(),
            updated_at: None,
        }
    }

    /// Side fed by `draw_position`, if the match-up holds it.
    pub fn side_of(&self, draw_position: DrawPosition) -> Option<Side> {
        self.draw_positions
            .iter()
            .position(|dp| *dp == Some(draw_position))
            .map(Side::from_index)
    }

    pub fn draw_position(&self, side: Side) -> Option<DrawPosition> {
        self.draw_positions[side.index()]
    }

    pub fn winner_draw_position(&self) -> Option<DrawPosition> {
        self.winning_side.and_then(|side| self.draw_position(side))
    }

    pub fn loser_draw_position(&self) -> Option<DrawPosition> {
        self.winning_side
            .and_then(|side| self.draw_position(side.opposite()))
    }

    pub fn is_team(&self) -> bool {
        self.match_up_type == MatchUpType::Team
    }

    /// Resolved by propagation rather than by a recorded result: a BYE, or an exit
    /// whose losing side carries a pending marker.
    pub fn is_auto_resolved(&self) -> bool {
        match self.match_up_status {
            MatchUpStatus::Bye => true,
            MatchUpStatus::DoubleWalkover | MatchUpStatus::DoubleDefault => {
                self.exit_markers.iter().all(Option::is_some)
            }
            status if status.is_exit() => self
                .winning_side
                .map_or(false, |side| self.exit_markers[side.opposite().index()].is_some()),
            _ => false,
        }
    }

    /// Carries a result some other match-up could depend on.
    pub fn is_active(&self) -> bool {
        if self.is_auto_resolved() {
            return false;
        }
        self.score.has_value()
            || self.winning_side.is_some()
            || self.match_up_status != MatchUpStatus::ToBePlayed
            || self.tie_match_ups.iter().any(MatchUp::is_active)
    }

    pub fn tie_match_up(&self, match_up_id: MatchUpId) -> Option<&MatchUp> {
        self.tie_match_ups.iter().find(|m| m.match_up_id == match_up_id)
    }

    pub fn tie_match_up_mut(&mut self, match_up_id: MatchUpId) -> Option<&mut MatchUp> {
        self.tie_match_ups
            .iter_mut()
            .find(|m| m.match_up_id == match_up_id)
    }

    /// Clear any result, keeping draw positions.
    pub(crate) fn clear_result(&mut self) {
        self.match_up_status = MatchUpStatus::ToBePlayed;
        self.winning_side = None;
        self.score = Score::default();
        self.match_up_status_codes.clear();
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

//! Participant data structures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a participant (used in position assignments and lookups).
pub type ParticipantId = Uuid;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantType {
    #[default]
    Individual,
    Pair,
    Team,
}

/// A participant in the tournament.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub participant_id: ParticipantId,
    pub participant_name: String,
    #[serde(default)]
    pub participant_type: ParticipantType,
}

impl Participant {
    /// Create a new individual participant with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            participant_id: Uuid::new_v4(),
            participant_name: name.into(),
            participant_type: ParticipantType::Individual,
        }
    }

    pub fn team(name: impl Into<String>) -> Self {
        Self {
            participant_type: ParticipantType::Team,
            ..Self::new(name)
        }
    }
}

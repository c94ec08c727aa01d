//! Errors returned by every draw operation.

use crate::models::draw::DrawId;
use crate::models::match_up::MatchUpId;
use crate::models::structure::{DrawPosition, StructureId};
use crate::models::tournament::EventId;
use thiserror::Error;

/// Typed outcome of a failed operation. Nothing in the crate panics on bad input.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ProgressionError {
    // Missing input: checked before any traversal.
    #[error("Missing draw definition")]
    MissingDrawDefinition,
    #[error("Missing matchUpId")]
    MissingMatchUpId,
    #[error("Missing tournament record")]
    MissingTournamentRecord,
    #[error("Missing structureId")]
    MissingStructureId,
    #[error("Missing value: {0}")]
    MissingValue(&'static str),

    // Not found.
    #[error("MatchUp {0} not found")]
    MatchUpNotFound(MatchUpId),
    #[error("Structure {0} not found")]
    StructureNotFound(StructureId),
    #[error("Draw definition {0} not found")]
    DrawDefinitionNotFound(DrawId),
    #[error("Event {0} not found")]
    EventNotFound(EventId),
    #[error("Draw position {draw_position} not found in structure {structure_id}")]
    DrawPositionNotFound {
        structure_id: StructureId,
        draw_position: DrawPosition,
    },

    // Invalid state.
    #[error("Invalid matchUp status")]
    InvalidMatchUpStatus,
    #[error("BYE requires a bye-assigned draw position and no winning side")]
    InvalidMatchUpStatusBye,
    #[error("Incompatible matchUp status")]
    IncompatibleMatchUpStatus,
    #[error("Cannot change winning side")]
    CannotChangeWinningSide,
    #[error("Invalid values: {0}")]
    InvalidValues(String),
    #[error("Both sides need assigned participants")]
    MissingParticipants,
    #[error("Invalid score: {0}")]
    InvalidScore(String),
    #[error("Draw position {draw_position} in structure {structure_id} is already occupied")]
    DrawPositionOccupied {
        structure_id: StructureId,
        draw_position: DrawPosition,
    },
    #[error("Invalid structure {structure_id}: {reason}")]
    InvalidStructure {
        structure_id: StructureId,
        reason: String,
    },
    #[error("Propagation did not converge within {limit} steps")]
    PropagationDidNotConverge { limit: usize },

    // Qualifier progression.
    #[error("Missing main structure")]
    MissingMainStructure,
    #[error("No draw positions available for qualifiers")]
    NoDrawPositionsAvailableForQualifiers,
    #[error("Missing qualified participants")]
    MissingQualifiedParticipants,
}

impl ProgressionError {
    /// Stable error code for API replies.
    pub fn code(&self) -> &'static str {
        use ProgressionError::*;
        match self {
            MissingDrawDefinition => "MISSING_DRAW_DEFINITION",
            MissingMatchUpId => "MISSING_MATCHUP_ID",
            MissingTournamentRecord => "MISSING_TOURNAMENT_RECORD",
            MissingStructureId => "MISSING_STRUCTURE_ID",
            MissingValue(_) => "MISSING_VALUE",
            MatchUpNotFound(_) => "MATCHUP_NOT_FOUND",
            StructureNotFound(_) => "STRUCTURE_NOT_FOUND",
            DrawDefinitionNotFound(_) => "DRAW_DEFINITION_NOT_FOUND",
            EventNotFound(_) => "EVENT_NOT_FOUND",
            DrawPositionNotFound { .. } => "DRAW_POSITION_NOT_FOUND",
            InvalidMatchUpStatus => "INVALID_MATCHUP_STATUS",
            InvalidMatchUpStatusBye => "INVALID_MATCHUP_STATUS_BYE",
            IncompatibleMatchUpStatus => "INCOMPATIBLE_MATCHUP_STATUS",
            CannotChangeWinningSide => "CANNOT_CHANGE_WINNING_SIDE",
            InvalidValues(_) => "INVALID_VALUES",
            MissingParticipants => "MISSING_PARTICIPANTS",
            InvalidScore(_) => "INVALID_SCORE",
            DrawPositionOccupied { .. } => "DRAW_POSITION_OCCUPIED",
            InvalidStructure { .. } => "INVALID_STRUCTURE",
            PropagationDidNotConverge { .. } => "PROPAGATION_DID_NOT_CONVERGE",
            MissingMainStructure => "MISSING_MAIN_STRUCTURE",
            NoDrawPositionsAvailableForQualifiers => "NO_DRAW_POSITIONS_AVAILABLE_FOR_QUALIFIERS",
            MissingQualifiedParticipants => "MISSING_QUALIFIED_PARTICIPANTS",
        }
    }

    /// Not-found outcomes: a propagation branch hitting one of these is abandoned, not failed.
    pub fn is_not_found(&self) -> bool {
        use ProgressionError::*;
        matches!(
            self,
            MatchUpNotFound(_) | StructureNotFound(_) | DrawDefinitionNotFound(_) | EventNotFound(_)
        )
    }
}

//! Data structures for tournament draws: records, structures, positions, links, match-ups.

mod draw;
mod error;
mod extension;
mod match_up;
mod participant;
mod score;
mod status;
mod structure;
mod tournament;

pub use draw::{DrawDefinition, DrawId, DrawLink, LinkSource, LinkTarget, LinkType};
pub use error::ProgressionError;
pub use extension::{Extension, ExtensionKind, Extensions, ParticipantTally};
pub use match_up::{CollectionDefinition, MatchUp, MatchUpId, MatchUpType, Side, TieFormat};
pub use participant::{Participant, ParticipantId, ParticipantType};
pub use score::{best_of, ParseScoreError, Score, SetScore};
pub use status::MatchUpStatus;
pub use structure::{
    DrawPosition, Occupant, PositionAssignment, Stage, Structure, StructureId, StructureType,
};
pub use tournament::{Event, EventId, TournamentId, TournamentRecord};

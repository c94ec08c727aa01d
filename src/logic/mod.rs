//! Draw operations: lookups, status changes, progression, positions, qualifiers, reset.

mod context;
mod integrity;
mod navigation;
mod positions;
mod progression;
mod qualifiers;
mod reset;
mod round_robin;
mod score_validation;
mod scoring;
mod status;
mod team;

pub use context::Context;
pub use integrity::validate_draw;
pub use navigation::{
    find_draw_match_up, find_event_match_up, find_match_up, find_structure,
    find_structure_match_up, find_structures, find_tournament_match_up, flatten_structures,
    resolve_structure, FoundMatchUp, LookupPath, MatchUpHints, MatchUpLocation, StructureFilter,
    StructureLookup, StructureRef,
};
pub use positions::{
    assign_draw_position, assign_draw_position_bye, assign_qualifier_placeholder,
    clear_draw_position, set_draw_position, PositionChange, PositionRequest,
};
pub use progression::{
    position_targets, propagation_limit, LinkedPosition, MatchUpKey, MatchUpSlot, PositionTargets,
};
pub use qualifiers::{
    qualified_participants, qualifier_progression, random_qualifier_order,
    tournament_qualifier_progression, QualifierAssignment, QualifierProgression,
};
pub use reset::{replace_structure_match_ups, reset_structure};
pub use round_robin::group_standings;
pub use score_validation::{ScoreValidator, SetsScoreValidator};
pub use scoring::{
    set_match_up_status, set_tournament_match_up_status, swap_winner_loser, SetMatchUpStatusParams,
    StatusChange,
};
pub use status::{resolve_outcome, MatchUpOutcome, OutcomeOrigin, ResolvedOutcome};
pub use team::{tie_values, tie_winner};

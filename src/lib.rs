//! Tournament draw progression: structures, positions and links, the match-up status
//! state machine, and the engine that moves participants through a draw.

pub mod logic;
pub mod models;
pub mod notify;
pub mod policy;

pub use logic::{
    assign_draw_position, assign_draw_position_bye, assign_qualifier_placeholder,
    clear_draw_position, find_draw_match_up, find_match_up, find_structure,
    find_tournament_match_up, qualifier_progression, reset_structure, set_match_up_status,
    set_tournament_match_up_status, swap_winner_loser, validate_draw, Context, MatchUpOutcome,
    StatusChange,
};
pub use models::{
    DrawDefinition, MatchUp, MatchUpId, MatchUpStatus, ProgressionError, Side, Structure,
    StructureId, TournamentRecord,
};
pub use notify::{Notice, Notifier};
pub use policy::PolicySet;

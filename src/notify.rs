//! Change notices and the notifier capability the host injects.

use crate::models::{DrawId, EventId, MatchUp, MatchUpId, PositionAssignment, StructureId, TournamentId};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Topic {
    ModifyMatchUp,
    AddMatchUps,
    DeletedMatchUpIds,
    ModifyPositionAssignments,
}

/// Identifiers owning a modified entity.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Owner {
    pub tournament_id: Option<TournamentId>,
    pub event_id: Option<EventId>,
    pub draw_id: Option<DrawId>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "topic", rename_all = "camelCase")]
pub enum Notice {
    ModifyMatchUp {
        owner: Owner,
        structure_id: StructureId,
        match_up: MatchUp,
    },
    AddMatchUps {
        owner: Owner,
        structure_id: StructureId,
        match_ups: Vec<MatchUp>,
    },
    DeletedMatchUpIds {
        owner: Owner,
        structure_id: StructureId,
        match_up_ids: Vec<MatchUpId>,
    },
    ModifyPositionAssignments {
        owner: Owner,
        structure_id: StructureId,
        position_assignments: Vec<PositionAssignment>,
    },
}

impl Notice {
    pub fn topic(&self) -> Topic {
        match self {
            Notice::ModifyMatchUp { .. } => Topic::ModifyMatchUp,
            Notice::AddMatchUps { .. } => Topic::AddMatchUps,
            Notice::DeletedMatchUpIds { .. } => Topic::DeletedMatchUpIds,
            Notice::ModifyPositionAssignments { .. } => Topic::ModifyPositionAssignments,
        }
    }

    /// Match-up carried by a `ModifyMatchUp` notice.
    pub fn match_up(&self) -> Option<&MatchUp> {
        match self {
            Notice::ModifyMatchUp { match_up, .. } => Some(match_up),
            _ => None,
        }
    }
}

/// Publish function supplied by the host. The crate keeps no subscriber list.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Collects notices, for hosts that reply with them and for tests.
impl Notifier for Vec<Notice> {
    fn notify(&mut self, notice: Notice) {
        self.push(notice);
    }
}

/// Wraps any closure as a notifier.
pub struct FnNotifier<F: FnMut(Notice)>(pub F);

impl<F: FnMut(Notice)> Notifier for FnNotifier<F> {
    fn notify(&mut self, notice: Notice) {
        (self.0)(notice)
    }
}

/// Drops every notice.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&mut self, _notice: Notice) {}
}

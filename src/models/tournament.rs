//! TournamentRecord and Event.

use crate::models::draw::{DrawDefinition, DrawId};
use crate::models::match_up::{MatchUpType, TieFormat};
use crate::models::participant::{Participant, ParticipantId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Unique identifier for an event.
pub type EventId = Uuid;

/// One competition within a tournament (e.g. "Men's Singles"), owning its draws.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub event_name: String,
    #[serde(default)]
    pub event_type: MatchUpType,
    pub tie_format: Option<TieFormat>,
    #[serde(default)]
    pub draw_definitions: Vec<DrawDefinition>,
}

impl Event {
    pub fn new(event_name: impl Into<String>, event_type: MatchUpType) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_name: event_name.into(),
            event_type,
            tie_format: None,
            draw_definitions: Vec::new(),
        }
    }

    pub fn draw(&self, draw_id: DrawId) -> Option<&DrawDefinition> {
        self.draw_definitions.iter().find(|d| d.draw_id == draw_id)
    }

    pub fn draw_mut(&mut self, draw_id: DrawId) -> Option<&mut DrawDefinition> {
        self.draw_definitions.iter_mut().find(|d| d.draw_id == draw_id)
    }
}

/// Full tournament record: participants and events with their draws.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub tournament_id: TournamentId,
    pub tournament_name: String,
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl TournamentRecord {
    pub fn new(tournament_name: impl Into<String>) -> Self {
        Self {
            tournament_id: Uuid::new_v4(),
            tournament_name: tournament_name.into(),
            start_date: None,
            participants: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn participant(&self, participant_id: ParticipantId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.participant_id == participant_id)
    }

    pub fn event(&self, event_id: EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.event_id == event_id)
    }

    pub fn event_mut(&mut self, event_id: EventId) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.event_id == event_id)
    }

    /// Event owning the draw, and the draw itself.
    pub fn draw_mut(&mut self, draw_id: DrawId) -> Option<(EventId, &mut DrawDefinition)> {
        self.events.iter_mut().find_map(|e| {
            let event_id = e.event_id;
            e.draw_mut(draw_id).map(|d| (event_id, d))
        })
    }
}

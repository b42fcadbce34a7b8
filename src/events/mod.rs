//! Event model shared by the capture client, the ingest path and the report
//! aggregator.

pub mod batch;
pub mod kind;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use self::batch::{BatchIngestRequest, BatchIngestResult, BatchRow};
pub use self::kind::{
    CATALOGUE_VERSION, CorrectionType, DisciplineType, EventCategory, EventKind, EventTypeTag,
    PossessionType, RestartType, ScoreComponent, ScoringType, SubstitutionType, UnknownEventType,
};

/// Client-generated idempotency key, unique per event per fixture.
pub type ClientId = String;

/// Maximum accepted length of a [`ClientId`].
pub const MAX_CLIENT_ID_LEN: usize = 64;

/// Home or away designation of a team within a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    /// The other side of the fixture.
    pub fn opposite(self) -> Self {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    /// Uppercase wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Home => "HOME",
            Side::Away => "AWAY",
        }
    }
}

/// Active scoring segment of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum Half {
    #[default]
    H1,
    H2,
}

/// Categorical sub-result, mostly the direction of a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EventOutcome {
    Left,
    Centre,
    Right,
    Short,
    Long,
}

impl EventOutcome {
    /// Wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            EventOutcome::Left => "Left",
            EventOutcome::Centre => "Centre",
            EventOutcome::Right => "Right",
            EventOutcome::Short => "Short",
            EventOutcome::Long => "Long",
        }
    }
}

/// One occurrence captured during a match.
///
/// Events are immutable once created. Corrections are recorded as a new
/// `Corrections/Undo` event naming the voided event in [`MatchEvent::voids`];
/// the only in-place edit is the server-side zone/outcome/notes path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchEvent {
    /// Fixture the event belongs to.
    pub fixture_id: Uuid,
    /// Attributed player, absent for team-level events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    pub side: Side,
    /// Elapsed match-clock seconds at capture.
    pub timestamp: u32,
    #[serde(flatten)]
    #[schema(value_type = EventTypeTag)]
    pub kind: EventKind,
    pub half: Half,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<EventOutcome>,
    /// Coarse spatial bucket, used only by heatmaps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Client id of the event compensated by this correction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voids: Option<ClientId>,
    /// Idempotency key assigned by the capturing client.
    pub client_id: ClientId,
    /// Local-only flag, never sent nor stored server-side.
    #[serde(skip)]
    pub synced: bool,
}

impl MatchEvent {
    /// Build a fresh event with a newly generated client id.
    pub fn new(fixture_id: Uuid, side: Side, half: Half, timestamp: u32, kind: EventKind) -> Self {
        Self {
            fixture_id,
            player_id: None,
            side,
            timestamp,
            kind,
            half,
            outcome: None,
            zone: None,
            notes: None,
            voids: None,
            client_id: Uuid::new_v4().simple().to_string(),
            synced: false,
        }
    }

    /// Compensating event voiding `target`, stamped at `timestamp`.
    pub fn undo_of(target: &MatchEvent, timestamp: u32) -> Self {
        let mut undo = Self::new(
            target.fixture_id,
            target.side,
            target.half,
            timestamp,
            EventKind::Correction(CorrectionType::Undo),
        );
        undo.voids = Some(target.client_id.clone());
        undo
    }

    pub fn with_player(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_outcome(mut self, outcome: EventOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Category of the event.
    pub fn category(&self) -> EventCategory {
        self.kind.category()
    }

    /// Side and running-score counter affected by this event, if any.
    pub fn score_effect(&self) -> Option<(Side, ScoreComponent)> {
        self.kind
            .score_component()
            .map(|component| (self.side, component))
    }
}

/// Reduce a raw event log to the canonical one: undo corrections and the
/// events they void are dropped, and the remainder is stably sorted by
/// match-clock timestamp.
pub fn canonical_log(events: impl IntoIterator<Item = MatchEvent>) -> Vec<MatchEvent> {
    let events: Vec<MatchEvent> = events.into_iter().collect();
    let voided: HashSet<ClientId> = events
        .iter()
        .filter(|event| event.kind.is_correction())
        .filter_map(|event| event.voids.clone())
        .collect();

    let mut log: Vec<MatchEvent> = events
        .into_iter()
        .filter(|event| !event.kind.is_correction() && !voided.contains(&event.client_id))
        .collect();
    log.sort_by_key(|event| event.timestamp);
    log
}

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::{
    events::{Half, MatchEvent, Side},
    state::{match_state::MatchState, state_machine::MatchStatus},
};

/// Minimal fixture record the tracker needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixtureEntity {
    /// Stable identifier for the fixture.
    pub id: Uuid,
    /// Display name of the home team.
    pub home_team: String,
    /// Display name of the away team.
    pub away_team: String,
    /// Competition the fixture belongs to; first half of the benchmark bucket.
    pub competition: String,
    /// Season label; second half of the benchmark bucket.
    pub season: String,
    /// Regulation duration used to split the match into quarters.
    pub duration_minutes: u32,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

impl FixtureEntity {
    /// Regulation duration in seconds.
    pub fn duration_seconds(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    /// Whether `other` shares this fixture's `(competition, season)` bucket.
    pub fn same_bucket(&self, other: &FixtureEntity) -> bool {
        self.competition == other.competition && self.season == other.season
    }
}

/// Persisted snapshot of a fixture's match state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchStateEntity {
    pub fixture_id: Uuid,
    pub status: MatchStatus,
    pub home_goals: u32,
    pub home_points: u32,
    pub away_goals: u32,
    pub away_points: u32,
    pub match_clock: u32,
    pub half: Half,
    pub started_at: Option<SystemTime>,
    pub completed_at: Option<SystemTime>,
    pub version: u64,
}

impl From<MatchState> for MatchStateEntity {
    fn from(value: MatchState) -> Self {
        Self {
            fixture_id: value.fixture_id,
            status: value.status,
            home_goals: value.home_goals,
            home_points: value.home_points,
            away_goals: value.away_goals,
            away_points: value.away_points,
            match_clock: value.match_clock,
            half: value.half,
            started_at: value.started_at,
            completed_at: value.completed_at,
            version: value.version,
        }
    }
}

impl From<MatchStateEntity> for MatchState {
    fn from(value: MatchStateEntity) -> Self {
        Self {
            fixture_id: value.fixture_id,
            status: value.status,
            home_goals: value.home_goals,
            home_points: value.home_points,
            away_goals: value.away_goals,
            away_points: value.away_points,
            match_clock: value.match_clock,
            half: value.half,
            started_at: value.started_at,
            completed_at: value.completed_at,
            version: value.version,
        }
    }
}

/// One player slot in a lineup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineupSlotEntity {
    pub player_id: String,
    pub name: String,
    pub jersey_number: u8,
    pub position: Option<String>,
}

/// Recorded player change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubEventEntity {
    pub player_off_id: String,
    pub player_on_id: String,
    /// Match-clock seconds of the change.
    pub match_time: u32,
    pub recorded_at: SystemTime,
}

/// Squad of one side of a fixture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SquadEntity {
    pub fixture_id: Uuid,
    pub side: Side,
    /// Players currently on the field.
    pub starting: Vec<LineupSlotEntity>,
    pub bench: Vec<LineupSlotEntity>,
    pub sub_events: Vec<SubEventEntity>,
}

impl SquadEntity {
    /// Empty squad for `side`.
    pub fn empty(fixture_id: Uuid, side: Side) -> Self {
        Self {
            fixture_id,
            side,
            starting: Vec::new(),
            bench: Vec::new(),
            sub_events: Vec::new(),
        }
    }

    /// Every player listed on the squad, starters first.
    pub fn players(&self) -> impl Iterator<Item = &LineupSlotEntity> {
        self.starting.iter().chain(self.bench.iter())
    }
}

/// Canonical event as held by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventEntity {
    pub event: MatchEvent,
    /// Server receive time, informational only; ordering uses the match clock.
    pub received_at: SystemTime,
}

/// Result of inserting an event keyed by `(fixture_id, client_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The event was stored.
    Inserted,
    /// An event with the same key already exists; nothing was written.
    Duplicate,
}

/// Fields of a stored event that may be edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub zone: Option<String>,
    pub outcome: Option<crate::events::EventOutcome>,
    pub notes: Option<String>,
}

impl EventPatch {
    /// Apply the patch, leaving absent fields untouched.
    pub fn apply_to(&self, event: &mut MatchEvent) {
        if let Some(zone) = &self.zone {
            event.zone = Some(zone.clone());
        }
        if let Some(outcome) = self.outcome {
            event.outcome = Some(outcome);
        }
        if let Some(notes) = &self.notes {
            event.notes = Some(notes.clone());
        }
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.zone.is_none() && self.outcome.is_none() && self.notes.is_none()
    }
}

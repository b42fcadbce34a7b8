use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::{
    dao::models::{
        EventEntity, FixtureEntity, LineupSlotEntity, MatchStateEntity, SquadEntity,
        SubEventEntity,
    },
    events::{EventCategory, EventKind, EventOutcome, Half, MatchEvent, Side},
    state::state_machine::MatchStatus,
};

pub const FIXTURE_COLLECTION: &str = "fixtures";
pub const MATCH_STATE_COLLECTION: &str = "match_states";
pub const SQUAD_COLLECTION: &str = "squads";
pub const EVENT_COLLECTION: &str = "match_events";

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn fixture_filter(id: Uuid) -> Document {
    doc! {"fixture_id": id.to_string()}
}

pub fn event_filter(fixture_id: Uuid, client_id: &str) -> Document {
    doc! {"fixture_id": fixture_id.to_string(), "client_id": client_id}
}

fn squad_id(fixture_id: Uuid, side: Side) -> String {
    format!("{fixture_id}:{}", side.as_str())
}

pub fn squad_filter(fixture_id: Uuid, side: Side) -> Document {
    doc! {"_id": squad_id(fixture_id, side)}
}

fn parse_id(collection: &'static str, raw: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(raw).map_err(|err| MongoDaoError::CorruptDocument {
        collection,
        message: format!("invalid id `{raw}`: {err}"),
    })
}

fn to_u32(collection: &'static str, field: &str, value: i64) -> MongoResult<u32> {
    u32::try_from(value).map_err(|_| MongoDaoError::CorruptDocument {
        collection,
        message: format!("`{field}` out of range: {value}"),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoFixtureDocument {
    #[serde(rename = "_id")]
    id: String,
    home_team: String,
    away_team: String,
    competition: String,
    season: String,
    duration_minutes: i64,
    created_at: DateTime,
}

impl From<FixtureEntity> for MongoFixtureDocument {
    fn from(value: FixtureEntity) -> Self {
        Self {
            id: value.id.to_string(),
            home_team: value.home_team,
            away_team: value.away_team,
            competition: value.competition,
            season: value.season,
            duration_minutes: i64::from(value.duration_minutes),
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoFixtureDocument> for FixtureEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoFixtureDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(FIXTURE_COLLECTION, &value.id)?,
            home_team: value.home_team,
            away_team: value.away_team,
            competition: value.competition,
            season: value.season,
            duration_minutes: to_u32(
                FIXTURE_COLLECTION,
                "duration_minutes",
                value.duration_minutes,
            )?,
            created_at: value.created_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchStateDocument {
    #[serde(rename = "_id")]
    fixture_id: String,
    status: MatchStatus,
    home_goals: i64,
    home_points: i64,
    away_goals: i64,
    away_points: i64,
    match_clock: i64,
    half: Half,
    started_at: Option<DateTime>,
    completed_at: Option<DateTime>,
    version: i64,
}

impl From<MatchStateEntity> for MongoMatchStateDocument {
    fn from(value: MatchStateEntity) -> Self {
        Self {
            fixture_id: value.fixture_id.to_string(),
            status: value.status,
            home_goals: i64::from(value.home_goals),
            home_points: i64::from(value.home_points),
            away_goals: i64::from(value.away_goals),
            away_points: i64::from(value.away_points),
            match_clock: i64::from(value.match_clock),
            half: value.half,
            started_at: value.started_at.map(DateTime::from_system_time),
            completed_at: value.completed_at.map(DateTime::from_system_time),
            version: i64::try_from(value.version).unwrap_or(i64::MAX),
        }
    }
}

impl TryFrom<MongoMatchStateDocument> for MatchStateEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMatchStateDocument) -> MongoResult<Self> {
        let c = MATCH_STATE_COLLECTION;
        Ok(Self {
            fixture_id: parse_id(c, &value.fixture_id)?,
            status: value.status,
            home_goals: to_u32(c, "home_goals", value.home_goals)?,
            home_points: to_u32(c, "home_points", value.home_points)?,
            away_goals: to_u32(c, "away_goals", value.away_goals)?,
            away_points: to_u32(c, "away_points", value.away_points)?,
            match_clock: to_u32(c, "match_clock", value.match_clock)?,
            half: value.half,
            started_at: value.started_at.map(|at| at.to_system_time()),
            completed_at: value.completed_at.map(|at| at.to_system_time()),
            version: u64::try_from(value.version).map_err(|_| MongoDaoError::CorruptDocument {
                collection: c,
                message: format!("negative version {}", value.version),
            })?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoLineupSlot {
    player_id: String,
    name: String,
    jersey_number: i32,
    position: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoSubEvent {
    player_off_id: String,
    player_on_id: String,
    match_time: i64,
    recorded_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSquadDocument {
    #[serde(rename = "_id")]
    id: String,
    fixture_id: String,
    side: Side,
    starting: Vec<MongoLineupSlot>,
    bench: Vec<MongoLineupSlot>,
    sub_events: Vec<MongoSubEvent>,
}

impl From<LineupSlotEntity> for MongoLineupSlot {
    fn from(value: LineupSlotEntity) -> Self {
        Self {
            player_id: value.player_id,
            name: value.name,
            jersey_number: i32::from(value.jersey_number),
            position: value.position,
        }
    }
}

impl TryFrom<MongoLineupSlot> for LineupSlotEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoLineupSlot) -> MongoResult<Self> {
        let jersey_number =
            u8::try_from(value.jersey_number).map_err(|_| MongoDaoError::CorruptDocument {
                collection: SQUAD_COLLECTION,
                message: format!("jersey number out of range: {}", value.jersey_number),
            })?;
        Ok(Self {
            player_id: value.player_id,
            name: value.name,
            jersey_number,
            position: value.position,
        })
    }
}

impl From<SquadEntity> for MongoSquadDocument {
    fn from(value: SquadEntity) -> Self {
        Self {
            id: squad_id(value.fixture_id, value.side),
            fixture_id: value.fixture_id.to_string(),
            side: value.side,
            starting: value.starting.into_iter().map(Into::into).collect(),
            bench: value.bench.into_iter().map(Into::into).collect(),
            sub_events: value
                .sub_events
                .into_iter()
                .map(|sub| MongoSubEvent {
                    player_off_id: sub.player_off_id,
                    player_on_id: sub.player_on_id,
                    match_time: i64::from(sub.match_time),
                    recorded_at: DateTime::from_system_time(sub.recorded_at),
                })
                .collect(),
        }
    }
}

impl TryFrom<MongoSquadDocument> for SquadEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSquadDocument) -> MongoResult<Self> {
        let sub_events = value
            .sub_events
            .into_iter()
            .map(|sub| {
                Ok(SubEventEntity {
                    player_off_id: sub.player_off_id,
                    player_on_id: sub.player_on_id,
                    match_time: to_u32(SQUAD_COLLECTION, "match_time", sub.match_time)?,
                    recorded_at: sub.recorded_at.to_system_time(),
                })
            })
            .collect::<MongoResult<Vec<_>>>()?;

        Ok(Self {
            fixture_id: parse_id(SQUAD_COLLECTION, &value.fixture_id)?,
            side: value.side,
            starting: value
                .starting
                .into_iter()
                .map(TryInto::try_into)
                .collect::<MongoResult<Vec<_>>>()?,
            bench: value
                .bench
                .into_iter()
                .map(TryInto::try_into)
                .collect::<MongoResult<Vec<_>>>()?,
            sub_events,
        })
    }
}

/// Flat event row; `_id` is left to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEventDocument {
    fixture_id: String,
    client_id: String,
    #[serde(default)]
    player_id: Option<String>,
    side: Side,
    timestamp: i64,
    event_category: EventCategory,
    event_type: String,
    half: Half,
    #[serde(default)]
    outcome: Option<EventOutcome>,
    #[serde(default)]
    zone: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    voids: Option<String>,
    received_at: DateTime,
}

impl From<EventEntity> for MongoEventDocument {
    fn from(value: EventEntity) -> Self {
        let EventEntity { event, received_at } = value;
        Self {
            fixture_id: event.fixture_id.to_string(),
            client_id: event.client_id,
            player_id: event.player_id,
            side: event.side,
            timestamp: i64::from(event.timestamp),
            event_category: event.kind.category(),
            event_type: event.kind.label().to_owned(),
            half: event.half,
            outcome: event.outcome,
            zone: event.zone,
            notes: event.notes,
            voids: event.voids,
            received_at: DateTime::from_system_time(received_at),
        }
    }
}

impl TryFrom<MongoEventDocument> for EventEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoEventDocument) -> MongoResult<Self> {
        let kind = EventKind::parse(value.event_category, &value.event_type).map_err(|err| {
            MongoDaoError::CorruptDocument {
                collection: EVENT_COLLECTION,
                message: err.to_string(),
            }
        })?;

        let event = MatchEvent {
            fixture_id: parse_id(EVENT_COLLECTION, &value.fixture_id)?,
            player_id: value.player_id,
            side: value.side,
            timestamp: to_u32(EVENT_COLLECTION, "timestamp", value.timestamp)?,
            kind,
            half: value.half,
            outcome: value.outcome,
            zone: value.zone,
            notes: value.notes,
            voids: value.voids,
            client_id: value.client_id,
            synced: false,
        };

        Ok(Self {
            event,
            received_at: value.received_at.to_system_time(),
        })
    }
}

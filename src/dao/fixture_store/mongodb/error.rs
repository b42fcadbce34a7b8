use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save fixture `{id}`")]
    SaveFixture {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load fixture `{id}`")]
    LoadFixture {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete fixture `{id}`")]
    DeleteFixture {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list fixtures of {competition}/{season}")]
    ListFixtures {
        competition: String,
        season: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to save match state of fixture `{fixture_id}`")]
    SaveMatchState {
        fixture_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load match state of fixture `{fixture_id}`")]
    LoadMatchState {
        fixture_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save squad of fixture `{fixture_id}`")]
    SaveSquad {
        fixture_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load squad of fixture `{fixture_id}`")]
    LoadSquad {
        fixture_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to insert event `{client_id}` of fixture `{fixture_id}`")]
    InsertEvent {
        fixture_id: Uuid,
        client_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load events of fixture `{fixture_id}`")]
    LoadEvents {
        fixture_id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to update event `{client_id}` of fixture `{fixture_id}`")]
    UpdateEvent {
        fixture_id: Uuid,
        client_id: String,
        #[source]
        source: MongoError,
    },
    #[error("corrupt document in `{collection}`: {message}")]
    CorruptDocument {
        collection: &'static str,
        message: String,
    },
}

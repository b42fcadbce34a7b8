#[cfg(feature = "mongo-store")]
pub mod mongodb;
pub mod memory;

use crate::dao::models::{
    EventEntity, EventPatch, FixtureEntity, InsertOutcome, MatchStateEntity, SquadEntity,
};
use crate::dao::storage::StorageResult;
use crate::events::{ClientId, Side};
use futures::future::BoxFuture;
use uuid::Uuid;

pub use self::memory::MemoryFixtureStore;

/// Abstraction over the persistence layer for fixtures, their match state,
/// squads and event log.
///
/// `insert_event` must be atomic on `(fixture_id, client_id)`: concurrent
/// inserts of the same key yield exactly one [`InsertOutcome::Inserted`].
pub trait FixtureStore: Send + Sync {
    fn save_fixture(&self, fixture: FixtureEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_fixture(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FixtureEntity>>>;
    /// Remove a fixture together with its match state, squads and events.
    fn delete_fixture(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Fixtures of a `(competition, season)` bucket.
    fn list_fixtures_in_bucket(
        &self,
        competition: String,
        season: String,
    ) -> BoxFuture<'static, StorageResult<Vec<FixtureEntity>>>;
    fn find_match_state(
        &self,
        fixture_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MatchStateEntity>>>;
    fn save_match_state(&self, state: MatchStateEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_squad(
        &self,
        fixture_id: Uuid,
        side: Side,
    ) -> BoxFuture<'static, StorageResult<Option<SquadEntity>>>;
    fn save_squad(&self, squad: SquadEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Every stored event of a fixture, in arrival order.
    fn list_events(&self, fixture_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>>;
    fn find_event(
        &self,
        fixture_id: Uuid,
        client_id: ClientId,
    ) -> BoxFuture<'static, StorageResult<Option<EventEntity>>>;
    fn insert_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<InsertOutcome>>;
    /// Apply `patch` to a stored event, returning the updated event if found.
    fn update_event(
        &self,
        fixture_id: Uuid,
        client_id: ClientId,
        patch: EventPatch,
    ) -> BoxFuture<'static, StorageResult<Option<EventEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

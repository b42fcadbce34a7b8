//! Process-local [`FixtureStore`] used by `STORAGE_BACKEND=memory` and tests.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use super::FixtureStore;
use crate::{
    dao::{
        models::{
            EventEntity, EventPatch, FixtureEntity, InsertOutcome, MatchStateEntity, SquadEntity,
        },
        storage::StorageResult,
    },
    events::{ClientId, Side},
};

#[derive(Default)]
struct MemoryInner {
    fixtures: DashMap<Uuid, FixtureEntity>,
    match_states: DashMap<Uuid, MatchStateEntity>,
    squads: DashMap<(Uuid, Side), SquadEntity>,
    events: DashMap<Uuid, Vec<EventEntity>>,
}

/// Fixture store backed by concurrent hash maps.
#[derive(Clone, Default)]
pub struct MemoryFixtureStore {
    inner: Arc<MemoryInner>,
}

impl MemoryFixtureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FixtureStore for MemoryFixtureStore {
    fn save_fixture(&self, fixture: FixtureEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.fixtures.insert(fixture.id, fixture);
            Ok(())
        })
    }

    fn find_fixture(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FixtureEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.fixtures.get(&id).map(|entry| entry.clone())) })
    }

    fn delete_fixture(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let removed = inner.fixtures.remove(&id).is_some();
            inner.match_states.remove(&id);
            inner.squads.remove(&(id, Side::Home));
            inner.squads.remove(&(id, Side::Away));
            inner.events.remove(&id);
            Ok(removed)
        })
    }

    fn list_fixtures_in_bucket(
        &self,
        competition: String,
        season: String,
    ) -> BoxFuture<'static, StorageResult<Vec<FixtureEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut fixtures: Vec<FixtureEntity> = inner
                .fixtures
                .iter()
                .filter(|entry| entry.competition == competition && entry.season == season)
                .map(|entry| entry.value().clone())
                .collect();
            fixtures.sort_by_key(|fixture| fixture.created_at);
            Ok(fixtures)
        })
    }

    fn find_match_state(
        &self,
        fixture_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MatchStateEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .match_states
                .get(&fixture_id)
                .map(|entry| entry.clone()))
        })
    }

    fn save_match_state(&self, state: MatchStateEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.match_states.insert(state.fixture_id, state);
            Ok(())
        })
    }

    fn find_squad(
        &self,
        fixture_id: Uuid,
        side: Side,
    ) -> BoxFuture<'static, StorageResult<Option<SquadEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .squads
                .get(&(fixture_id, side))
                .map(|entry| entry.clone()))
        })
    }

    fn save_squad(&self, squad: SquadEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.squads.insert((squad.fixture_id, squad.side), squad);
            Ok(())
        })
    }

    fn list_events(&self, fixture_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .events
                .get(&fixture_id)
                .map(|entry| entry.clone())
                .unwrap_or_default())
        })
    }

    fn find_event(
        &self,
        fixture_id: Uuid,
        client_id: ClientId,
    ) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner.events.get(&fixture_id).and_then(|events| {
                events
                    .iter()
                    .find(|stored| stored.event.client_id == client_id)
                    .cloned()
            }))
        })
    }

    fn insert_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            // The entry guard holds the shard lock for the whole check-then-push.
            let mut events = inner.events.entry(event.event.fixture_id).or_default();
            if events
                .iter()
                .any(|stored| stored.event.client_id == event.event.client_id)
            {
                return Ok(InsertOutcome::Duplicate);
            }
            events.push(event);
            Ok(InsertOutcome::Inserted)
        })
    }

    fn update_event(
        &self,
        fixture_id: Uuid,
        client_id: ClientId,
        patch: EventPatch,
    ) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let Some(mut events) = inner.events.get_mut(&fixture_id) else {
                return Ok(None);
            };
            let Some(stored) = events
                .iter_mut()
                .find(|stored| stored.event.client_id == client_id)
            else {
                return Ok(None);
            };
            patch.apply_to(&mut stored.event);
            Ok(Some(stored.clone()))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        EVENT_COLLECTION, FIXTURE_COLLECTION, MATCH_STATE_COLLECTION, MongoEventDocument,
        MongoFixtureDocument, MongoMatchStateDocument, MongoSquadDocument, SQUAD_COLLECTION,
        doc_id, event_filter, fixture_filter, squad_filter,
    },
};
use crate::{
    dao::{
        fixture_store::FixtureStore,
        models::{
            EventEntity, EventPatch, FixtureEntity, InsertOutcome, MatchStateEntity, SquadEntity,
        },
        storage::StorageResult,
    },
    events::{ClientId, Side},
};

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoFixtureStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}

impl MongoFixtureStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;
        info!(database = %config.database_name, "connected to MongoDB");

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let events = database.collection::<Document>(EVENT_COLLECTION);
        let idempotency_key = IndexModel::builder()
            .keys(doc! {"fixture_id": 1, "client_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("event_client_id_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        events
            .create_index(idempotency_key)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: EVENT_COLLECTION,
                index: "fixture_id,client_id",
                source,
            })?;

        let fixtures = database.collection::<Document>(FIXTURE_COLLECTION);
        let bucket = IndexModel::builder()
            .keys(doc! {"competition": 1, "season": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("fixture_bucket_idx".to_owned()))
                    .build(),
            )
            .build();
        fixtures
            .create_index(bucket)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: FIXTURE_COLLECTION,
                index: "competition,season",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn fixtures(&self) -> Collection<MongoFixtureDocument> {
        self.database().await.collection(FIXTURE_COLLECTION)
    }

    async fn match_states(&self) -> Collection<MongoMatchStateDocument> {
        self.database().await.collection(MATCH_STATE_COLLECTION)
    }

    async fn squads(&self) -> Collection<MongoSquadDocument> {
        self.database().await.collection(SQUAD_COLLECTION)
    }

    async fn events(&self) -> Collection<MongoEventDocument> {
        self.database().await.collection(EVENT_COLLECTION)
    }

    async fn save_fixture(&self, fixture: FixtureEntity) -> MongoResult<()> {
        let id = fixture.id;
        let document: MongoFixtureDocument = fixture.into();
        self.fixtures()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveFixture { id, source })?;
        Ok(())
    }

    async fn find_fixture(&self, id: Uuid) -> MongoResult<Option<FixtureEntity>> {
        self.fixtures()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadFixture { id, source })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn delete_fixture(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .fixtures()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteFixture { id, source })?;

        self.match_states()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteFixture { id, source })?;
        self.squads()
            .await
            .delete_many(fixture_filter(id))
            .await
            .map_err(|source| MongoDaoError::DeleteFixture { id, source })?;
        self.events()
            .await
            .delete_many(fixture_filter(id))
            .await
            .map_err(|source| MongoDaoError::DeleteFixture { id, source })?;

        Ok(result.deleted_count > 0)
    }

    async fn list_fixtures_in_bucket(
        &self,
        competition: String,
        season: String,
    ) -> MongoResult<Vec<FixtureEntity>> {
        let filter = doc! {"competition": competition.as_str(), "season": season.as_str()};
        let documents: Vec<MongoFixtureDocument> = self
            .fixtures()
            .await
            .find(filter)
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListFixtures {
                competition: competition.clone(),
                season: season.clone(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListFixtures {
                competition,
                season,
                source,
            })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_match_state(&self, fixture_id: Uuid) -> MongoResult<Option<MatchStateEntity>> {
        self.match_states()
            .await
            .find_one(doc_id(fixture_id))
            .await
            .map_err(|source| MongoDaoError::LoadMatchState { fixture_id, source })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn save_match_state(&self, state: MatchStateEntity) -> MongoResult<()> {
        let fixture_id = state.fixture_id;
        let document: MongoMatchStateDocument = state.into();
        self.match_states()
            .await
            .replace_one(doc_id(fixture_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveMatchState { fixture_id, source })?;
        Ok(())
    }

    async fn find_squad(&self, fixture_id: Uuid, side: Side) -> MongoResult<Option<SquadEntity>> {
        self.squads()
            .await
            .find_one(squad_filter(fixture_id, side))
            .await
            .map_err(|source| MongoDaoError::LoadSquad { fixture_id, source })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn save_squad(&self, squad: SquadEntity) -> MongoResult<()> {
        let fixture_id = squad.fixture_id;
        let filter = squad_filter(fixture_id, squad.side);
        let document: MongoSquadDocument = squad.into();
        self.squads()
            .await
            .replace_one(filter, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveSquad { fixture_id, source })?;
        Ok(())
    }

    async fn list_events(&self, fixture_id: Uuid) -> MongoResult<Vec<EventEntity>> {
        let documents: Vec<MongoEventDocument> = self
            .events()
            .await
            .find(fixture_filter(fixture_id))
            .sort(doc! {"_id": 1})
            .await
            .map_err(|source| MongoDaoError::LoadEvents { fixture_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadEvents { fixture_id, source })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_event(
        &self,
        fixture_id: Uuid,
        client_id: ClientId,
    ) -> MongoResult<Option<EventEntity>> {
        self.events()
            .await
            .find_one(event_filter(fixture_id, &client_id))
            .await
            .map_err(|source| MongoDaoError::LoadEvents { fixture_id, source })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn insert_event(&self, event: EventEntity) -> MongoResult<InsertOutcome> {
        let fixture_id = event.event.fixture_id;
        let client_id = event.event.client_id.clone();
        let document: MongoEventDocument = event.into();

        match self.events().await.insert_one(&document).await {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) if is_duplicate_key(&err) => Ok(InsertOutcome::Duplicate),
            Err(source) => Err(MongoDaoError::InsertEvent {
                fixture_id,
                client_id,
                source,
            }),
        }
    }

    async fn update_event(
        &self,
        fixture_id: Uuid,
        client_id: ClientId,
        patch: EventPatch,
    ) -> MongoResult<Option<EventEntity>> {
        let mut set = Document::new();
        if let Some(zone) = patch.zone {
            set.insert("zone", zone);
        }
        if let Some(outcome) = patch.outcome {
            set.insert("outcome", outcome.as_str());
        }
        if let Some(notes) = patch.notes {
            set.insert("notes", notes);
        }

        let collection = self.events().await;
        let filter = event_filter(fixture_id, &client_id);
        let updated = if set.is_empty() {
            collection.find_one(filter).await
        } else {
            collection
                .find_one_and_update(filter, doc! {"$set": set})
                .return_document(ReturnDocument::After)
                .await
        }
        .map_err(|source| MongoDaoError::UpdateEvent {
            fixture_id,
            client_id,
            source,
        })?;

        updated.map(TryInto::try_into).transpose()
    }
}

impl FixtureStore for MongoFixtureStore {
    fn save_fixture(&self, fixture: FixtureEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_fixture(fixture).await.map_err(Into::into) })
    }

    fn find_fixture(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FixtureEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_fixture(id).await.map_err(Into::into) })
    }

    fn delete_fixture(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_fixture(id).await.map_err(Into::into) })
    }

    fn list_fixtures_in_bucket(
        &self,
        competition: String,
        season: String,
    ) -> BoxFuture<'static, StorageResult<Vec<FixtureEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_fixtures_in_bucket(competition, season)
                .await
                .map_err(Into::into)
        })
    }

    fn find_match_state(
        &self,
        fixture_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MatchStateEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match_state(fixture_id).await.map_err(Into::into) })
    }

    fn save_match_state(&self, state: MatchStateEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_match_state(state).await.map_err(Into::into) })
    }

    fn find_squad(
        &self,
        fixture_id: Uuid,
        side: Side,
    ) -> BoxFuture<'static, StorageResult<Option<SquadEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_squad(fixture_id, side).await.map_err(Into::into) })
    }

    fn save_squad(&self, squad: SquadEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_squad(squad).await.map_err(Into::into) })
    }

    fn list_events(&self, fixture_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_events(fixture_id).await.map_err(Into::into) })
    }

    fn find_event(
        &self,
        fixture_id: Uuid,
        client_id: ClientId,
    ) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_event(fixture_id, client_id)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_event(&self, event: EventEntity) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let store = self.clone();
        Box::pin(async move { store.insert_event(event).await.map_err(Into::into) })
    }

    fn update_event(
        &self,
        fixture_id: Uuid,
        client_id: ClientId,
        patch: EventPatch,
    ) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_event(fixture_id, client_id, patch)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

use std::time::SystemTime;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{EventEntity, EventPatch, InsertOutcome},
    dto::{events::EditEventRequest, validation::validate_client_id},
    error::ServiceError,
    events::{BatchIngestRequest, BatchIngestResult, ClientId, MatchEvent, canonical_log},
    services::{fixture_service::load_fixture, match_state_service},
    state::SharedState,
};

/// Event log of a fixture ordered by match clock.
///
/// By default the canonical log is returned; `include_corrections` keeps
/// undo corrections and the events they void.
pub async fn list_events(
    state: &SharedState,
    fixture_id: Uuid,
    include_corrections: bool,
) -> Result<Vec<MatchEvent>, ServiceError> {
    load_fixture(state, fixture_id).await?;
    let store = state.require_store().await?;
    let events = store
        .list_events(fixture_id)
        .await?
        .into_iter()
        .map(|entity| entity.event);

    if include_corrections {
        let mut raw: Vec<MatchEvent> = events.collect();
        raw.sort_by_key(|event| event.timestamp);
        Ok(raw)
    } else {
        Ok(canonical_log(events))
    }
}

/// Idempotent batch upsert keyed by `(fixtureId, clientId)`.
///
/// Already-stored events count as duplicates. Unreadable rows (such as an
/// event type this server does not know), invalid ones and per-row storage
/// failures count as failed; none of them aborts the batch. Every synced or
/// duplicate client id is acknowledged so the caller can clear its queue.
pub async fn ingest_batch(
    state: &SharedState,
    request: BatchIngestRequest,
) -> Result<BatchIngestResult, ServiceError> {
    let BatchIngestRequest { fixture_id, events } = request;
    if fixture_id.is_nil() {
        return Err(ServiceError::InvalidInput("fixtureId is required".into()));
    }
    load_fixture(state, fixture_id).await?;
    let store = state.require_store().await?;

    let received = events.len();
    let mut result = BatchIngestResult::default();
    for row in events {
        let row_id = row.client_id().unwrap_or_default().to_owned();
        let event = match row.into_event() {
            Ok(event) => event,
            Err(reason) => {
                debug!(fixture_id = %fixture_id, client_id = %row_id, reason = %reason, "unreadable event in batch");
                result.failed += 1;
                continue;
            }
        };
        if let Err(reason) = check_event(&event, fixture_id) {
            debug!(fixture_id = %fixture_id, client_id = %event.client_id, reason = %reason, "rejected event in batch");
            result.failed += 1;
            continue;
        }

        let client_id: ClientId = event.client_id.clone();
        match store.find_event(fixture_id, client_id.clone()).await {
            Ok(Some(_)) => {
                result.duplicates += 1;
                result.acknowledged.push(client_id);
                continue;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(fixture_id = %fixture_id, client_id = %client_id, error = %err, "event lookup failed");
                result.failed += 1;
                continue;
            }
        }

        let entity = EventEntity {
            event,
            received_at: SystemTime::now(),
        };
        match store.insert_event(entity).await {
            Ok(InsertOutcome::Inserted) => {
                result.synced += 1;
                result.acknowledged.push(client_id);
            }
            Ok(InsertOutcome::Duplicate) => {
                result.duplicates += 1;
                result.acknowledged.push(client_id);
            }
            Err(err) => {
                warn!(fixture_id = %fixture_id, client_id = %client_id, error = %err, "event insert failed");
                result.failed += 1;
            }
        }
    }

    if result.synced > 0 {
        if let Err(err) = match_state_service::rescore(state, fixture_id).await {
            warn!(fixture_id = %fixture_id, error = %err, "failed to re-derive score after ingest");
        }
    }

    info!(
        fixture_id = %fixture_id,
        received,
        synced = result.synced,
        duplicates = result.duplicates,
        failed = result.failed,
        "event batch ingested"
    );
    Ok(result)
}

/// Edit the zone, outcome or notes of a stored event.
pub async fn edit_event(
    state: &SharedState,
    fixture_id: Uuid,
    client_id: ClientId,
    request: EditEventRequest,
) -> Result<MatchEvent, ServiceError> {
    let patch = EventPatch::from(request);
    if patch.is_empty() {
        return Err(ServiceError::InvalidInput(
            "at least one of zone, outcome or notes is required".into(),
        ));
    }
    load_fixture(state, fixture_id).await?;
    let store = state.require_store().await?;

    let updated = store
        .update_event(fixture_id, client_id.clone(), patch)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("event `{client_id}`")))?;
    info!(fixture_id = %fixture_id, client_id = %client_id, "event edited");
    Ok(updated.event)
}

fn check_event(event: &MatchEvent, fixture_id: Uuid) -> Result<(), String> {
    if event.fixture_id != fixture_id {
        return Err(format!("belongs to fixture `{}`", event.fixture_id));
    }
    validate_client_id(&event.client_id).map_err(|err| err.to_string())?;
    match (event.kind.is_correction(), event.voids.as_deref()) {
        (true, None) => Err("undo correction without a voided event".into()),
        (true, Some(voided)) if voided == event.client_id => Err("undo voids itself".into()),
        (false, Some(_)) => Err("only corrections may void events".into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            fixture_store::{FixtureStore, MemoryFixtureStore},
            models::{FixtureEntity, MatchStateEntity},
        },
        events::{BatchRow, EventKind, EventOutcome, Half, ScoringType, Side},
        state::{AppState, match_state::MatchState},
    };

    async fn fixture() -> (SharedState, Uuid) {
        let state = AppState::new(AppConfig::default());
        let store = MemoryFixtureStore::new();
        let id = Uuid::new_v4();
        store
            .save_fixture(FixtureEntity {
                id,
                home_team: "Clare".into(),
                away_team: "Cork".into(),
                competition: "League".into(),
                season: "2026".into(),
                duration_minutes: 70,
                created_at: SystemTime::now(),
            })
            .await
            .unwrap();
        store
            .save_match_state(MatchStateEntity::from(MatchState::new(id)))
            .await
            .unwrap();
        state.set_store(Arc::new(store)).await;
        (state, id)
    }

    fn event(fixture_id: Uuid, client_id: &str, kind: ScoringType, ts: u32) -> MatchEvent {
        let mut event = MatchEvent::new(fixture_id, Side::Home, Half::H1, ts, EventKind::Scoring(kind));
        event.client_id = client_id.into();
        event
    }

    fn batch(fixture_id: Uuid, events: Vec<MatchEvent>) -> BatchIngestRequest {
        BatchIngestRequest::new(fixture_id, events)
    }

    #[tokio::test]
    async fn same_batch_twice_is_idempotent() {
        let (state, id) = fixture().await;
        let goal = event(id, "a", ScoringType::Goal, 100);

        let first = ingest_batch(&state, batch(id, vec![goal.clone()])).await.unwrap();
        assert_eq!((first.synced, first.duplicates, first.failed), (1, 0, 0));

        let second = ingest_batch(&state, batch(id, vec![goal])).await.unwrap();
        assert_eq!((second.synced, second.duplicates, second.failed), (0, 1, 0));
        assert_eq!(second.acknowledged, vec!["a".to_owned()]);

        let score = match_state_service::get_match_state(&state, id).await.unwrap();
        assert_eq!(score.home_goals, 1);
        assert_eq!(list_events(&state, id, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_rows_fail_without_aborting_batch() {
        let (state, id) = fixture().await;
        let foreign = event(Uuid::new_v4(), "x", ScoringType::Point, 10);
        let blank = event(id, "", ScoringType::Point, 20);
        let good = event(id, "ok", ScoringType::Point, 30);

        let result = ingest_batch(&state, batch(id, vec![foreign, blank, good]))
            .await
            .unwrap();
        assert_eq!((result.synced, result.duplicates, result.failed), (1, 0, 2));
        assert_eq!(result.acknowledged, vec!["ok".to_owned()]);
    }

    #[tokio::test]
    async fn unknown_event_type_fails_only_its_row() {
        let (state, id) = fixture().await;
        let mut request = batch(id, vec![event(id, "good", ScoringType::Point, 10)]);
        request.events.push(BatchRow::Unreadable(serde_json::json!({
            "fixtureId": id,
            "clientId": "newer",
            "side": "HOME",
            "timestamp": 20,
            "half": "H1",
            "eventCategory": "Scoring",
            "eventType": "Own Goal"
        })));

        let result = ingest_batch(&state, request).await.unwrap();
        assert_eq!((result.synced, result.duplicates, result.failed), (1, 0, 1));
        assert_eq!(result.acknowledged, vec!["good".to_owned()]);

        let score = match_state_service::get_match_state(&state, id).await.unwrap();
        assert_eq!(score.home_points, 1);
    }

    #[tokio::test]
    async fn nil_fixture_is_rejected() {
        let (state, _) = fixture().await;
        assert!(matches!(
            ingest_batch(&state, batch(Uuid::nil(), Vec::new())).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn undo_tombstone_rescoring_and_log_views() {
        let (state, id) = fixture().await;
        let goal = event(id, "g", ScoringType::Goal, 100);
        let point = event(id, "p", ScoringType::Point, 50);
        ingest_batch(&state, batch(id, vec![goal.clone(), point])).await.unwrap();

        let mut undo = MatchEvent::undo_of(&goal, 120);
        undo.client_id = "u".into();
        ingest_batch(&state, batch(id, vec![undo])).await.unwrap();

        let score = match_state_service::get_match_state(&state, id).await.unwrap();
        assert_eq!((score.home_goals, score.home_points), (0, 1));

        let canonical: Vec<_> = list_events(&state, id, false)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.client_id)
            .collect();
        assert_eq!(canonical, vec!["p"]);

        let raw: Vec<_> = list_events(&state, id, true)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.client_id)
            .collect();
        assert_eq!(raw, vec!["p", "g", "u"]);
    }

    #[tokio::test]
    async fn edit_touches_only_descriptive_fields() {
        let (state, id) = fixture().await;
        ingest_batch(&state, batch(id, vec![event(id, "a", ScoringType::Wide, 10)]))
            .await
            .unwrap();

        let edited = edit_event(
            &state,
            id,
            "a".into(),
            EditEventRequest {
                zone: Some("D-left".into()),
                outcome: Some(EventOutcome::Left),
                notes: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(edited.zone.as_deref(), Some("D-left"));
        assert_eq!(edited.kind, EventKind::Scoring(ScoringType::Wide));

        let missing = edit_event(
            &state,
            id,
            "nope".into(),
            EditEventRequest {
                zone: Some("x".into()),
                outcome: None,
                notes: None,
            },
        )
        .await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
    }
}

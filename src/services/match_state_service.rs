use std::time::SystemTime;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{fixture_store::FixtureStore, models::MatchStateEntity},
    dto::match_state::{MatchStateView, UpdateMatchStateRequest},
    error::ServiceError,
    events::{Half, Side, canonical_log},
    state::{
        SharedState,
        match_state::MatchState,
        state_machine::{MatchTransition, start_preconditions},
    },
};

pub async fn get_match_state(
    state: &SharedState,
    fixture_id: Uuid,
) -> Result<MatchStateView, ServiceError> {
    Ok(load_state(state, fixture_id).await?.into())
}

/// Run a lifecycle transition and persist the resulting state.
///
/// `start` is gated on both starting lineups being non-empty.
pub async fn transition(
    state: &SharedState,
    fixture_id: Uuid,
    transition: MatchTransition,
    expected_version: Option<u64>,
) -> Result<MatchStateView, ServiceError> {
    transition_with(state, fixture_id, transition, expected_version, |_| Ok(())).await
}

/// Apply a partial update. Clock and half are last-write-wins unless
/// `expectedVersion` is supplied; a status change runs its transition.
pub async fn update_match_state(
    state: &SharedState,
    fixture_id: Uuid,
    request: UpdateMatchStateRequest,
) -> Result<MatchStateView, ServiceError> {
    let current = load_state(state, fixture_id).await?;
    if request.is_empty() {
        check_version(request.expected_version, current.version)?;
        return Ok(current.into());
    }

    if let Some(target) = request.status.filter(|target| *target != current.status) {
        let transition = MatchTransition::between(current.status, target).ok_or_else(|| {
            ServiceError::InvalidState(format!(
                "no transition leads from {:?} to {:?}",
                current.status, target
            ))
        })?;
        let (match_clock, half) = (request.match_clock, request.half);
        return transition_with(
            state,
            fixture_id,
            transition,
            request.expected_version,
            move |next| apply_clock(next, match_clock, half),
        )
        .await;
    }

    let store = state.require_store().await?;
    let gate = state.fixture_gate(fixture_id);
    let _guard = gate.lock().await;

    let mut next = load_state(state, fixture_id).await?;
    check_version(request.expected_version, next.version)?;
    apply_clock(&mut next, request.match_clock, request.half)?;
    next.version += 1;
    store
        .save_match_state(MatchStateEntity::from(next.clone()))
        .await?;
    debug!(fixture_id = %fixture_id, clock = next.match_clock, half = ?next.half, version = next.version, "match state updated");
    Ok(next.into())
}

/// Re-derive the running score from the stored event log.
///
/// Runs for completed matches too: late events synced after the final
/// whistle still count. The version is bumped only when the score moved.
pub async fn rescore(state: &SharedState, fixture_id: Uuid) -> Result<MatchState, ServiceError> {
    let store = state.require_store().await?;
    let gate = state.fixture_gate(fixture_id);
    let _guard = gate.lock().await;

    let mut next = load_state(state, fixture_id).await?;
    let before = (next.score(Side::Home), next.score(Side::Away));
    let events = store.list_events(fixture_id).await?;
    let log = canonical_log(events.into_iter().map(|entity| entity.event));
    next.rescore_from(&log);

    if (next.score(Side::Home), next.score(Side::Away)) != before {
        next.version += 1;
        store
            .save_match_state(MatchStateEntity::from(next.clone()))
            .await?;
        info!(
            fixture_id = %fixture_id,
            home = next.total(Side::Home),
            away = next.total(Side::Away),
            version = next.version,
            "score re-derived from event log"
        );
    }
    Ok(next)
}

async fn transition_with<F>(
    state: &SharedState,
    fixture_id: Uuid,
    transition: MatchTransition,
    expected_version: Option<u64>,
    adjust: F,
) -> Result<MatchStateView, ServiceError>
where
    F: FnOnce(&mut MatchState) -> Result<(), ServiceError>,
{
    let store = state.require_store().await?;
    let (next, _) = state
        .run_transition(fixture_id, transition, |current, plan| async move {
            check_version(expected_version, current.version)?;
            if transition == MatchTransition::Start {
                let (home, away) = squad_sizes(&*store, fixture_id).await?;
                start_preconditions(home, away)?;
            }

            let mut next = current;
            adjust(&mut next)?;
            next.enter(plan.to, SystemTime::now());
            next.version = plan.version_next;
            store
                .save_match_state(MatchStateEntity::from(next.clone()))
                .await?;
            Ok(next)
        })
        .await?;
    Ok(next.into())
}

async fn squad_sizes(
    store: &dyn FixtureStore,
    fixture_id: Uuid,
) -> Result<(usize, usize), ServiceError> {
    let home = store.find_squad(fixture_id, Side::Home).await?;
    let away = store.find_squad(fixture_id, Side::Away).await?;
    Ok((
        home.map_or(0, |squad| squad.starting.len()),
        away.map_or(0, |squad| squad.starting.len()),
    ))
}

fn apply_clock(
    state: &mut MatchState,
    match_clock: Option<u32>,
    half: Option<Half>,
) -> Result<(), ServiceError> {
    if match_clock.is_none() && half.is_none() {
        return Ok(());
    }
    let seconds = match_clock.unwrap_or(state.match_clock);
    let half = half.unwrap_or(state.half);
    state.set_clock(seconds, half)?;
    Ok(())
}

fn check_version(expected: Option<u64>, actual: u64) -> Result<(), ServiceError> {
    match expected {
        Some(expected) if expected != actual => {
            Err(ServiceError::VersionConflict { expected, actual })
        }
        _ => Ok(()),
    }
}

pub(crate) async fn load_state(
    state: &SharedState,
    fixture_id: Uuid,
) -> Result<MatchState, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_match_state(fixture_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("fixture `{fixture_id}`")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            fixture_store::MemoryFixtureStore,
            models::{LineupSlotEntity, SquadEntity},
        },
        state::{AppState, state_machine::MatchStatus},
    };

    async fn fixture(lineups: bool) -> (SharedState, MemoryFixtureStore, Uuid) {
        let state = AppState::new(AppConfig::default());
        let store = MemoryFixtureStore::new();
        let id = Uuid::new_v4();
        store
            .save_match_state(MatchStateEntity::from(MatchState::new(id)))
            .await
            .unwrap();
        for side in [Side::Home, Side::Away] {
            let mut squad = SquadEntity::empty(id, side);
            if lineups {
                squad.starting.push(LineupSlotEntity {
                    player_id: format!("{}-1", side.as_str()),
                    name: "Keeper".into(),
                    jersey_number: 1,
                    position: None,
                });
            }
            store.save_squad(squad).await.unwrap();
        }
        state.set_store(Arc::new(store.clone())).await;
        (state, store, id)
    }

    #[tokio::test]
    async fn start_requires_lineups() {
        let (state, _, id) = fixture(false).await;
        let err = transition(&state, id, MatchTransition::Start, None)
            .await
            .unwrap_err();
        match err {
            ServiceError::Precondition(checklist) => assert_eq!(checklist.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
        let view = get_match_state(&state, id).await.unwrap();
        assert_eq!(view.status, MatchStatus::NotStarted);
        assert_eq!(view.version, 0);
    }

    #[tokio::test]
    async fn lifecycle_bumps_version_and_stamps_times() {
        let (state, _, id) = fixture(true).await;
        let started = transition(&state, id, MatchTransition::Start, None).await.unwrap();
        assert_eq!(started.status, MatchStatus::InProgress);
        assert_eq!(started.version, 1);
        assert!(started.started_at.is_some());

        transition(&state, id, MatchTransition::Pause, None).await.unwrap();
        let done = transition(&state, id, MatchTransition::Complete, None).await.unwrap();
        assert_eq!(done.status, MatchStatus::Completed);
        assert_eq!(done.version, 3);
        assert!(done.completed_at.is_some());

        let err = transition(&state, id, MatchTransition::Resume, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts() {
        let (state, _, id) = fixture(true).await;
        let update = UpdateMatchStateRequest {
            match_clock: Some(30),
            expected_version: Some(0),
            ..Default::default()
        };
        let first = update_match_state(&state, id, update).await.unwrap();
        assert_eq!(first.version, 1);

        let stale = UpdateMatchStateRequest {
            match_clock: Some(40),
            expected_version: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            update_match_state(&state, id, stale).await,
            Err(ServiceError::VersionConflict {
                expected: 0,
                actual: 1
            })
        ));
    }

    #[tokio::test]
    async fn clock_cannot_move_backwards_within_half() {
        let (state, _, id) = fixture(true).await;
        let forward = UpdateMatchStateRequest {
            match_clock: Some(600),
            ..Default::default()
        };
        update_match_state(&state, id, forward).await.unwrap();

        let backward = UpdateMatchStateRequest {
            match_clock: Some(100),
            ..Default::default()
        };
        assert!(matches!(
            update_match_state(&state, id, backward).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn status_update_runs_transition() {
        let (state, _, id) = fixture(true).await;
        let update = UpdateMatchStateRequest {
            status: Some(MatchStatus::InProgress),
            match_clock: Some(5),
            ..Default::default()
        };
        let view = update_match_state(&state, id, update).await.unwrap();
        assert_eq!(view.status, MatchStatus::InProgress);
        assert_eq!(view.match_clock, 5);

        let skip = UpdateMatchStateRequest {
            status: Some(MatchStatus::NotStarted),
            ..Default::default()
        };
        assert!(matches!(
            update_match_state(&state, id, skip).await,
            Err(ServiceError::InvalidState(_))
        ));
    }
}

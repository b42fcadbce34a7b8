use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{FixtureEntity, MatchStateEntity, SquadEntity},
    dto::fixture::{CreateFixtureRequest, FixtureView},
    error::ServiceError,
    events::Side,
    state::{SharedState, match_state::MatchState},
};

/// Create a fixture with a fresh match state and empty squads.
pub async fn create_fixture(
    state: &SharedState,
    request: CreateFixtureRequest,
) -> Result<FixtureView, ServiceError> {
    let store = state.require_store().await?;

    let fixture = FixtureEntity {
        id: Uuid::new_v4(),
        home_team: request.home_team.trim().to_owned(),
        away_team: request.away_team.trim().to_owned(),
        competition: request.competition.trim().to_owned(),
        season: request.season.trim().to_owned(),
        duration_minutes: request
            .duration_minutes
            .unwrap_or(state.config().default_match_minutes),
        created_at: SystemTime::now(),
    };

    store.save_fixture(fixture.clone()).await?;
    store
        .save_match_state(MatchStateEntity::from(MatchState::new(fixture.id)))
        .await?;
    for side in [Side::Home, Side::Away] {
        store.save_squad(SquadEntity::empty(fixture.id, side)).await?;
    }

    info!(fixture_id = %fixture.id, competition = %fixture.competition, season = %fixture.season, "fixture created");
    Ok(fixture.into())
}

pub async fn get_fixture(state: &SharedState, id: Uuid) -> Result<FixtureView, ServiceError> {
    Ok(load_fixture(state, id).await?.into())
}

/// Delete a fixture and everything recorded for it.
pub async fn delete_fixture(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    let gate = state.fixture_gate(id);
    let removed = {
        let _guard = gate.lock().await;
        store.delete_fixture(id).await?
    };
    if !removed {
        return Err(ServiceError::NotFound(format!("fixture `{id}`")));
    }
    state.forget_fixture(id);
    info!(fixture_id = %id, "fixture deleted");
    Ok(())
}

/// Fetch a fixture or fail with [`ServiceError::NotFound`].
pub(crate) async fn load_fixture(
    state: &SharedState,
    id: Uuid,
) -> Result<FixtureEntity, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_fixture(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("fixture `{id}`")))
}

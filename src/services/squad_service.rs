use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{SquadEntity, SubEventEntity},
    dto::squad::{SetLineupRequest, SquadView, SquadsResponse, SubstitutionRequest},
    error::ServiceError,
    events::Side,
    services::fixture_service::load_fixture,
    state::SharedState,
};

/// Both squads of a fixture; a side never set is returned empty.
pub async fn get_squads(state: &SharedState, fixture_id: Uuid) -> Result<SquadsResponse, ServiceError> {
    load_fixture(state, fixture_id).await?;
    let home = load_squad(state, fixture_id, Side::Home).await?;
    let away = load_squad(state, fixture_id, Side::Away).await?;
    Ok(SquadsResponse {
        home: home.into(),
        away: away.into(),
    })
}

/// Replace the lineup of `side`, keeping its substitution history.
pub async fn set_lineup(
    state: &SharedState,
    fixture_id: Uuid,
    side: Side,
    request: SetLineupRequest,
) -> Result<SquadView, ServiceError> {
    load_fixture(state, fixture_id).await?;
    let store = state.require_store().await?;
    let gate = state.fixture_gate(fixture_id);
    let _guard = gate.lock().await;

    let mut squad = load_squad(state, fixture_id, side).await?;
    squad.starting = request.starting.into_iter().map(Into::into).collect();
    squad.bench = request.bench.into_iter().map(Into::into).collect();
    store.save_squad(squad.clone()).await?;

    info!(fixture_id = %fixture_id, side = side.as_str(), starters = squad.starting.len(), bench = squad.bench.len(), "lineup set");
    Ok(squad.into())
}

/// Swap a player on the field with one from the bench.
///
/// Only the squad changes; a `Substitutions` event, if wanted, is captured
/// separately through the event log.
pub async fn substitute(
    state: &SharedState,
    fixture_id: Uuid,
    side: Side,
    request: SubstitutionRequest,
) -> Result<SquadView, ServiceError> {
    load_fixture(state, fixture_id).await?;
    let store = state.require_store().await?;
    let gate = state.fixture_gate(fixture_id);
    let _guard = gate.lock().await;

    let mut squad = load_squad(state, fixture_id, side).await?;
    apply_substitution(&mut squad, &request)?;
    store.save_squad(squad.clone()).await?;

    info!(
        fixture_id = %fixture_id,
        side = side.as_str(),
        off = %request.player_off_id,
        on = %request.player_on_id,
        match_time = request.match_time,
        "substitution recorded"
    );
    Ok(squad.into())
}

fn apply_substitution(
    squad: &mut SquadEntity,
    request: &SubstitutionRequest,
) -> Result<(), ServiceError> {
    let off_index = squad
        .starting
        .iter()
        .position(|slot| slot.player_id == request.player_off_id)
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "player `{}` is not on the field",
                request.player_off_id
            ))
        })?;
    let on_index = squad
        .bench
        .iter()
        .position(|slot| slot.player_id == request.player_on_id)
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!(
                "player `{}` is not on the bench",
                request.player_on_id
            ))
        })?;

    let coming_on = squad.bench.remove(on_index);
    let going_off = std::mem::replace(&mut squad.starting[off_index], coming_on);
    squad.bench.push(going_off);
    squad.sub_events.push(SubEventEntity {
        player_off_id: request.player_off_id.clone(),
        player_on_id: request.player_on_id.clone(),
        match_time: request.match_time,
        recorded_at: SystemTime::now(),
    });
    Ok(())
}

async fn load_squad(
    state: &SharedState,
    fixture_id: Uuid,
    side: Side,
) -> Result<SquadEntity, ServiceError> {
    let store = state.require_store().await?;
    Ok(store
        .find_squad(fixture_id, side)
        .await?
        .unwrap_or_else(|| SquadEntity::empty(fixture_id, side)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::LineupSlotEntity;

    fn slot(id: &str, jersey: u8) -> LineupSlotEntity {
        LineupSlotEntity {
            player_id: id.into(),
            name: id.to_uppercase(),
            jersey_number: jersey,
            position: None,
        }
    }

    fn request(off: &str, on: &str) -> SubstitutionRequest {
        SubstitutionRequest {
            player_off_id: off.into(),
            player_on_id: on.into(),
            match_time: 1_800,
        }
    }

    #[test]
    fn substitution_swaps_field_and_bench() {
        let mut squad = SquadEntity::empty(Uuid::new_v4(), Side::Home);
        squad.starting = vec![slot("p1", 1), slot("p2", 2)];
        squad.bench = vec![slot("p16", 16)];

        apply_substitution(&mut squad, &request("p2", "p16")).unwrap();

        let on_field: Vec<_> = squad.starting.iter().map(|s| s.player_id.as_str()).collect();
        let bench: Vec<_> = squad.bench.iter().map(|s| s.player_id.as_str()).collect();
        assert_eq!(on_field, vec!["p1", "p16"]);
        assert_eq!(bench, vec!["p2"]);
        assert_eq!(squad.sub_events.len(), 1);
        assert_eq!(squad.sub_events[0].match_time, 1_800);
    }

    #[test]
    fn substitution_rejects_unknown_players() {
        let mut squad = SquadEntity::empty(Uuid::new_v4(), Side::Away);
        squad.starting = vec![slot("p1", 1)];
        squad.bench = vec![slot("p16", 16)];

        assert!(apply_substitution(&mut squad, &request("p16", "p1")).is_err());
        assert!(apply_substitution(&mut squad, &request("p1", "p99")).is_err());
        assert!(squad.sub_events.is_empty());
        assert_eq!(squad.starting[0].player_id, "p1");
    }
}

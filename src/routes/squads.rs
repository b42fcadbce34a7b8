use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::squad::{SetLineupRequest, SquadView, SquadsResponse, SubstitutionRequest},
    error::{AppError, ErrorBody},
    events::Side,
    services::squad_service,
    state::SharedState,
};

/// Lineups and substitutions of both sides.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/fixtures/{id}/squads", get(get_squads))
        .route("/fixtures/{id}/squads/{side}", put(set_lineup))
        .route("/fixtures/{id}/squads/{side}/substitute", post(substitute))
}

#[utoipa::path(
    get,
    path = "/fixtures/{id}/squads",
    tag = "squads",
    params(("id" = Uuid, Path, description = "Fixture identifier")),
    responses(
        (status = 200, description = "Home and away squads", body = SquadsResponse),
        (status = 404, description = "Unknown fixture", body = ErrorBody)
    )
)]
pub async fn get_squads(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SquadsResponse>, AppError> {
    Ok(Json(squad_service::get_squads(&state, id).await?))
}

/// Replace the starting fifteen and bench of one side.
#[utoipa::path(
    put,
    path = "/fixtures/{id}/squads/{side}",
    tag = "squads",
    params(
        ("id" = Uuid, Path, description = "Fixture identifier"),
        ("side" = Side, Path, description = "HOME or AWAY")
    ),
    request_body = SetLineupRequest,
    responses(
        (status = 200, description = "Updated squad", body = SquadView),
        (status = 400, description = "Invalid lineup", body = ErrorBody)
    )
)]
pub async fn set_lineup(
    State(state): State<SharedState>,
    Path((id, side)): Path<(Uuid, Side)>,
    Valid(Json(payload)): Valid<Json<SetLineupRequest>>,
) -> Result<Json<SquadView>, AppError> {
    Ok(Json(squad_service::set_lineup(&state, id, side, payload).await?))
}

#[utoipa::path(
    post,
    path = "/fixtures/{id}/squads/{side}/substitute",
    tag = "squads",
    params(
        ("id" = Uuid, Path, description = "Fixture identifier"),
        ("side" = Side, Path, description = "HOME or AWAY")
    ),
    request_body = SubstitutionRequest,
    responses(
        (status = 200, description = "Squad after the substitution", body = SquadView),
        (status = 400, description = "Player not on the field or bench", body = ErrorBody)
    )
)]
pub async fn substitute(
    State(state): State<SharedState>,
    Path((id, side)): Path<(Uuid, Side)>,
    Valid(Json(payload)): Valid<Json<SubstitutionRequest>>,
) -> Result<Json<SquadView>, AppError> {
    Ok(Json(squad_service::substitute(&state, id, side, payload).await?))
}

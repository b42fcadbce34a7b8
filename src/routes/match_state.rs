use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::match_state::{MatchStateView, TransitionQuery, UpdateMatchStateRequest},
    error::{AppError, ErrorBody},
    services::match_state_service,
    state::{SharedState, state_machine::MatchTransition},
};

/// Match state reads, partial updates and lifecycle transitions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/fixtures/{id}/match-state",
            get(get_match_state).put(update_match_state),
        )
        .route(
            "/fixtures/{id}/match-state/{transition}",
            post(transition_match),
        )
}

#[utoipa::path(
    get,
    path = "/fixtures/{id}/match-state",
    tag = "match-state",
    params(("id" = Uuid, Path, description = "Fixture identifier")),
    responses(
        (status = 200, description = "Current match state", body = MatchStateView),
        (status = 404, description = "Unknown fixture", body = ErrorBody)
    )
)]
pub async fn get_match_state(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchStateView>, AppError> {
    Ok(Json(match_state_service::get_match_state(&state, id).await?))
}

/// Merge clock, half or status into the stored match state.
#[utoipa::path(
    put,
    path = "/fixtures/{id}/match-state",
    tag = "match-state",
    params(("id" = Uuid, Path, description = "Fixture identifier")),
    request_body = UpdateMatchStateRequest,
    responses(
        (status = 200, description = "Merged match state", body = MatchStateView),
        (status = 400, description = "Clock moved backwards", body = ErrorBody),
        (status = 409, description = "Invalid transition or stale version", body = ErrorBody),
        (status = 422, description = "Start preconditions not met", body = ErrorBody)
    )
)]
pub async fn update_match_state(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMatchStateRequest>,
) -> Result<Json<MatchStateView>, AppError> {
    Ok(Json(
        match_state_service::update_match_state(&state, id, payload).await?,
    ))
}

/// Run one of `start`, `pause`, `resume` or `complete`.
#[utoipa::path(
    post,
    path = "/fixtures/{id}/match-state/{transition}",
    tag = "match-state",
    params(
        ("id" = Uuid, Path, description = "Fixture identifier"),
        ("transition" = MatchTransition, Path, description = "Lifecycle transition"),
        TransitionQuery
    ),
    responses(
        (status = 200, description = "Transition applied", body = MatchStateView),
        (status = 409, description = "Transition not allowed from the current status", body = ErrorBody),
        (status = 422, description = "Start preconditions not met", body = ErrorBody)
    )
)]
pub async fn transition_match(
    State(state): State<SharedState>,
    Path((id, transition)): Path<(Uuid, MatchTransition)>,
    Query(query): Query<TransitionQuery>,
) -> Result<Json<MatchStateView>, AppError> {
    Ok(Json(
        match_state_service::transition(&state, id, transition, query.expected_version).await?,
    ))
}

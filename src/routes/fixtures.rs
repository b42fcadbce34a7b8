use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::fixture::{CreateFixtureRequest, FixtureView},
    error::{AppError, ErrorBody},
    services::fixture_service,
    state::SharedState,
};

/// Fixture lifecycle: creation, lookup and removal.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/fixtures", post(create_fixture))
        .route("/fixtures/{id}", get(get_fixture).delete(delete_fixture))
}

/// Create a fixture with a fresh match state and empty squads.
#[utoipa::path(
    post,
    path = "/fixtures",
    tag = "fixtures",
    request_body = CreateFixtureRequest,
    responses(
        (status = 201, description = "Fixture created", body = FixtureView),
        (status = 400, description = "Invalid fixture", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn create_fixture(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateFixtureRequest>>,
) -> Result<(StatusCode, Json<FixtureView>), AppError> {
    let fixture = fixture_service::create_fixture(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(fixture)))
}

#[utoipa::path(
    get,
    path = "/fixtures/{id}",
    tag = "fixtures",
    params(("id" = Uuid, Path, description = "Fixture identifier")),
    responses(
        (status = 200, description = "Fixture", body = FixtureView),
        (status = 404, description = "Unknown fixture", body = ErrorBody)
    )
)]
pub async fn get_fixture(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FixtureView>, AppError> {
    Ok(Json(fixture_service::get_fixture(&state, id).await?))
}

/// Delete a fixture with its match state, squads and events.
#[utoipa::path(
    delete,
    path = "/fixtures/{id}",
    tag = "fixtures",
    params(("id" = Uuid, Path, description = "Fixture identifier")),
    responses(
        (status = 204, description = "Fixture deleted"),
        (status = 404, description = "Unknown fixture", body = ErrorBody)
    )
)]
pub async fn delete_fixture(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    fixture_service::delete_fixture(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

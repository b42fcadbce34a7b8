use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::events::{EditEventRequest, EventLogQuery},
    error::{AppError, ErrorBody},
    events::{BatchIngestRequest, BatchIngestResult, ClientId, MatchEvent},
    services::event_service,
    state::SharedState,
};

/// Event log reads, idempotent batch ingest and in-place edits.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/fixtures/{id}/events", get(list_events))
        .route("/fixtures/{id}/events/{client_id}", patch(edit_event))
        .route("/match-events/batch", post(ingest_batch))
}

/// Event log ordered by match clock.
#[utoipa::path(
    get,
    path = "/fixtures/{id}/events",
    tag = "events",
    params(("id" = Uuid, Path, description = "Fixture identifier"), EventLogQuery),
    responses(
        (status = 200, description = "Ordered event log", body = [MatchEvent]),
        (status = 404, description = "Unknown fixture", body = ErrorBody)
    )
)]
pub async fn list_events(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<EventLogQuery>,
) -> Result<Json<Vec<MatchEvent>>, AppError> {
    Ok(Json(
        event_service::list_events(&state, id, query.include_corrections).await?,
    ))
}

/// Upsert a batch of captured events keyed by `(fixtureId, clientId)`.
///
/// Re-sending events already stored is safe: they are counted as
/// duplicates and acknowledged again.
#[utoipa::path(
    post,
    path = "/match-events/batch",
    tag = "events",
    request_body = BatchIngestRequest,
    responses(
        (status = 200, description = "Per-batch ingest counts", body = BatchIngestResult),
        (status = 400, description = "Missing fixture identifier", body = ErrorBody),
        (status = 404, description = "Unknown fixture", body = ErrorBody),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn ingest_batch(
    State(state): State<SharedState>,
    Json(payload): Json<BatchIngestRequest>,
) -> Result<Json<BatchIngestResult>, AppError> {
    Ok(Json(event_service::ingest_batch(&state, payload).await?))
}

#[utoipa::path(
    patch,
    path = "/fixtures/{id}/events/{client_id}",
    tag = "events",
    params(
        ("id" = Uuid, Path, description = "Fixture identifier"),
        ("client_id" = String, Path, description = "Client-generated event identifier")
    ),
    request_body = EditEventRequest,
    responses(
        (status = 200, description = "Edited event", body = MatchEvent),
        (status = 400, description = "Nothing to edit", body = ErrorBody),
        (status = 404, description = "Unknown fixture or event", body = ErrorBody)
    )
)]
pub async fn edit_event(
    State(state): State<SharedState>,
    Path((id, client_id)): Path<(Uuid, ClientId)>,
    Valid(Json(payload)): Valid<Json<EditEventRequest>>,
) -> Result<Json<MatchEvent>, AppError> {
    Ok(Json(
        event_service::edit_event(&state, id, client_id, payload).await?,
    ))
}

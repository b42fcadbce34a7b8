use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    analytics::{BenchmarkComparison, MatchReport},
    dto::report::SideQuery,
    error::{AppError, ErrorBody},
    services::report_service,
    state::SharedState,
};

/// Post-match analytics recomputed from the event log.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/fixtures/{id}/report", get(report))
        .route("/fixtures/{id}/benchmarks", get(benchmarks))
}

#[utoipa::path(
    get,
    path = "/fixtures/{id}/report",
    tag = "reports",
    params(("id" = Uuid, Path, description = "Fixture identifier"), SideQuery),
    responses(
        (status = 200, description = "Match report of one side", body = MatchReport),
        (status = 404, description = "Unknown fixture", body = ErrorBody)
    )
)]
pub async fn report(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SideQuery>,
) -> Result<Json<MatchReport>, AppError> {
    Ok(Json(report_service::report(&state, id, query.side()).await?))
}

/// Compare one side against the other fixtures of its competition and season.
#[utoipa::path(
    get,
    path = "/fixtures/{id}/benchmarks",
    tag = "reports",
    params(("id" = Uuid, Path, description = "Fixture identifier"), SideQuery),
    responses(
        (status = 200, description = "Benchmark comparison", body = BenchmarkComparison),
        (status = 404, description = "Unknown fixture", body = ErrorBody)
    )
)]
pub async fn benchmarks(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SideQuery>,
) -> Result<Json<BenchmarkComparison>, AppError> {
    Ok(Json(
        report_service::benchmarks(&state, id, query.side()).await?,
    ))
}

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document of the match tracker back-end.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::fixtures::create_fixture,
        crate::routes::fixtures::get_fixture,
        crate::routes::fixtures::delete_fixture,
        crate::routes::match_state::get_match_state,
        crate::routes::match_state::update_match_state,
        crate::routes::match_state::transition_match,
        crate::routes::squads::get_squads,
        crate::routes::squads::set_lineup,
        crate::routes::squads::substitute,
        crate::routes::events::list_events,
        crate::routes::events::ingest_batch,
        crate::routes::events::edit_event,
        crate::routes::reports::report,
        crate::routes::reports::benchmarks,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::fixture::CreateFixtureRequest,
            crate::dto::fixture::FixtureView,
            crate::dto::match_state::MatchStateView,
            crate::dto::match_state::UpdateMatchStateRequest,
            crate::dto::squad::LineupSlotDto,
            crate::dto::squad::SetLineupRequest,
            crate::dto::squad::SubstitutionRequest,
            crate::dto::squad::SubEventDto,
            crate::dto::squad::SquadView,
            crate::dto::squad::SquadsResponse,
            crate::dto::events::EditEventRequest,
            crate::events::MatchEvent,
            crate::events::Side,
            crate::events::Half,
            crate::events::EventOutcome,
            crate::events::kind::EventCategory,
            crate::events::kind::EventTypeTag,
            crate::events::BatchIngestRequest,
            crate::events::BatchIngestResult,
            crate::state::state_machine::MatchStatus,
            crate::state::state_machine::MatchTransition,
            crate::analytics::MatchReport,
            crate::analytics::TeamTotals,
            crate::analytics::BenchmarkComparison,
            crate::analytics::benchmark::StatLine,
            crate::analytics::benchmark::BenchmarkFlag,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "fixtures", description = "Fixture creation and removal"),
        (name = "match-state", description = "Match clock, status and lifecycle transitions"),
        (name = "squads", description = "Lineups and substitutions"),
        (name = "events", description = "Event log and idempotent batch sync"),
        (name = "reports", description = "Match reports and competition benchmarks"),
    )
)]
pub struct ApiDoc;

/// OpenAPI documentation generation.
pub mod documentation;
/// Event log listing, idempotent batch ingest and in-place edits.
pub mod event_service;
/// Fixture creation, lookup and cascading deletion.
pub mod fixture_service;
/// Health check service.
pub mod health_service;
/// Match state reads, partial updates, lifecycle transitions and rescoring.
pub mod match_state_service;
/// Match reports and bucket benchmarks.
pub mod report_service;
/// Lineups and substitutions.
pub mod squad_service;
/// Background storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;

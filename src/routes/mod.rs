use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod events;
pub mod fixtures;
pub mod health;
pub mod match_state;
pub mod reports;
pub mod squads;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(fixtures::router())
        .merge(match_state::router())
        .merge(squads::router())
        .merge(events::router())
        .merge(reports::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}

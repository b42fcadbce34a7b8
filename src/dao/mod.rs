/// Fixture, match-state, squad and event persistence behind [`fixture_store::FixtureStore`].
pub mod fixture_store;
/// Backend-agnostic records exchanged with the stores.
pub mod models;
/// Error type shared by every storage backend.
pub mod storage;

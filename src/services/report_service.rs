use tracing::debug;
use uuid::Uuid;

use crate::{
    analytics::{
        BenchmarkComparison, MatchReport, PlayerDirectory,
        benchmark::{BenchmarkSubject, StatLine, compare},
        build_report,
        report::side_tally,
    },
    dao::fixture_store::FixtureStore,
    error::ServiceError,
    events::{MatchEvent, Side, canonical_log},
    services::fixture_service::load_fixture,
    state::SharedState,
};

/// Report of `side`, recomputed from the canonical log on every call.
pub async fn report(
    state: &SharedState,
    fixture_id: Uuid,
    side: Side,
) -> Result<MatchReport, ServiceError> {
    let fixture = load_fixture(state, fixture_id).await?;
    let store = state.require_store().await?;

    let log = canonical_events(&*store, fixture_id).await?;
    let mut squads = Vec::with_capacity(2);
    for squad_side in [Side::Home, Side::Away] {
        if let Some(squad) = store.find_squad(fixture_id, squad_side).await? {
            squads.push(squad);
        }
    }
    let directory = PlayerDirectory::from_squads(&squads);

    Ok(build_report(
        fixture_id,
        side,
        fixture.duration_seconds(),
        &log,
        &directory,
    ))
}

/// Compare `side` of the fixture against every other team performance in
/// its `(competition, season)` bucket.
///
/// Both sides of each other fixture with a non-empty log contribute one
/// sample to the mean.
pub async fn benchmarks(
    state: &SharedState,
    fixture_id: Uuid,
    side: Side,
) -> Result<BenchmarkComparison, ServiceError> {
    let fixture = load_fixture(state, fixture_id).await?;
    let store = state.require_store().await?;

    let own_log = canonical_events(&*store, fixture_id).await?;
    let tally = side_tally(&own_log, side);

    let bucket = store
        .list_fixtures_in_bucket(fixture.competition.clone(), fixture.season.clone())
        .await?;
    let mut samples = Vec::new();
    for other in bucket.iter().filter(|other| other.id != fixture_id) {
        let log = canonical_events(&*store, other.id).await?;
        if log.is_empty() {
            continue;
        }
        for sample_side in [Side::Home, Side::Away] {
            samples.push(StatLine::from(&side_tally(&log, sample_side)));
        }
    }
    debug!(fixture_id = %fixture_id, bucket = bucket.len(), samples = samples.len(), "benchmark samples collected");

    Ok(compare(
        BenchmarkSubject {
            fixture_id,
            side,
            competition: fixture.competition,
            season: fixture.season,
        },
        &tally,
        &samples,
        &state.config().benchmarks,
    ))
}

async fn canonical_events(
    store: &dyn FixtureStore,
    fixture_id: Uuid,
) -> Result<Vec<MatchEvent>, ServiceError> {
    let events = store.list_events(fixture_id).await?;
    Ok(canonical_log(events.into_iter().map(|entity| entity.event)))
}

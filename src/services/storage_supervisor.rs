use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{fixture_store::FixtureStore, storage::StorageError},
    state::SharedState,
};

/// Backoff and polling periods of the supervisor.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorTiming {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub health_poll_interval: Duration,
    pub max_reconnect_attempts: u32,
}

impl Default for SupervisorTiming {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
            health_poll_interval: Duration::from_secs(5),
            max_reconnect_attempts: 3,
        }
    }
}

/// Connect to the storage backend, then keep polling its health. The shared
/// state stays degraded while no healthy store is installed.
pub async fn run<F, Fut>(state: SharedState, connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn FixtureStore>, StorageError>> + Send,
{
    run_with_timing(state, connect, SupervisorTiming::default()).await
}

pub async fn run_with_timing<F, Fut>(state: SharedState, mut connect: F, timing: SupervisorTiming)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn FixtureStore>, StorageError>> + Send,
{
    let mut delay = timing.initial_delay;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = timing.initial_delay;

                supervise(&state, store.as_ref(), &timing).await;

                state.clear_store().await;
                sleep(delay).await;
                delay = (delay * 2).min(timing.max_delay);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(timing.max_delay);
            }
        }
    }
}

/// Poll `store` until it fails and cannot be reconnected in place.
async fn supervise(state: &SharedState, store: &dyn FixtureStore, timing: &SupervisorTiming) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded().await {
                info!("storage healthy again; leaving degraded mode");
                state.update_degraded(false).await;
            }
            sleep(timing.health_poll_interval).await;
            continue;
        }

        let mut reconnect_delay = timing.initial_delay;
        let mut reconnected = false;
        for attempt in 0..timing.max_reconnect_attempts {
            match store.try_reconnect().await {
                Ok(()) => {
                    info!(attempt, "storage reconnection succeeded after health check failure");
                    reconnected = true;
                    break;
                }
                Err(reconnect_err) => {
                    if attempt == 0 {
                        warn!(
                            attempt, error = %reconnect_err,
                            "storage reconnect first attempt failed; entering degraded mode"
                        );
                        state.update_degraded(true).await;
                    } else {
                        warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                    }
                    sleep(reconnect_delay).await;
                    reconnect_delay = (reconnect_delay * 2).min(timing.max_delay);
                }
            }
        }

        if !reconnected {
            warn!("exhausted storage reconnect attempts; dropping the connection");
            return;
        }
        state.update_degraded(false).await;
        sleep(timing.health_poll_interval).await;
    }
}

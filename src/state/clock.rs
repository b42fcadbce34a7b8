//! Scoped once-per-second match clock.

use std::{future::Future, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::debug;

/// Default tick period of the match clock.
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Owns the background ticker of a running match.
///
/// At most one ticker is alive per driver. Stopping the driver, starting it
/// again or dropping it cancels the previous task so no tick fires after the
/// owner is gone.
#[derive(Debug, Default)]
pub struct ClockDriver {
    handle: Option<JoinHandle<()>>,
}

impl ClockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking every `period`, replacing any running ticker.
    ///
    /// The first tick fires one full period after the call.
    pub fn start<F, Fut>(&mut self, period: Duration, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                on_tick().await;
            }
        }));
    }

    /// Cancel the running ticker, if any.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("match clock stopped");
        }
    }

    /// Whether a ticker is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

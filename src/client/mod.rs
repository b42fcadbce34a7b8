//! Capture-side core: durable offline queue, sync engine and the per-fixture
//! tracking session.

pub mod error;
#[cfg(feature = "http-sync")]
pub mod http;
pub mod lifecycle;
pub mod queue;
pub mod sync;
pub mod tracker;

use std::{path::PathBuf, sync::Arc, time::Duration};

use serde::Deserialize;

pub use self::error::{ClientError, ClientResult};
#[cfg(feature = "http-sync")]
pub use self::http::HttpEventSink;
pub use self::lifecycle::{MatchStateSink, StatePush};
pub use self::queue::OfflineQueue;
pub use self::sync::{EventSink, SyncEngine, SyncStatus, SyncSummary, spawn_connectivity_watcher};
pub use self::tracker::{EventDraft, MatchTracker};

/// Settings of a capture client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncClientConfig {
    /// Root URL of the match tracker API.
    pub base_url: String,
    /// Directory holding one queue file per fixture.
    pub queue_dir: PathBuf,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for SyncClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            queue_dir: PathBuf::from("match-queue"),
            request_timeout: Duration::from_secs(10),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Open the queue at `config.queue_dir` and wire it to the HTTP sink for
/// both events and match-state pushes.
#[cfg(feature = "http-sync")]
pub async fn connect(config: &SyncClientConfig) -> ClientResult<Arc<SyncEngine>> {
    let queue = Arc::new(OfflineQueue::open(&config.queue_dir).await?);
    let sink = Arc::new(HttpEventSink::new(config)?);
    Ok(Arc::new(
        SyncEngine::new(queue, sink.clone()).with_state_sink(sink),
    ))
}

//! Drains the offline queue into the server event log.

use std::{
    collections::{BTreeSet, HashSet, VecDeque},
    sync::Arc,
    time::Duration,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use rand::Rng;
use tokio::{
    sync::{Mutex, OwnedMutexGuard, watch},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    error::{ClientError, ClientResult},
    lifecycle::{MatchStateSink, StatePush},
    queue::OfflineQueue,
};
use crate::events::{BatchIngestRequest, BatchIngestResult, ClientId};

const RETRY_INITIAL_DELAY: Duration = Duration::from_millis(500);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);
const RETRY_MAX_ATTEMPTS: u32 = 6;

/// Destination of queued batches.
///
/// The production sink posts over HTTP; tests plug in an in-memory one.
pub trait EventSink: Send + Sync {
    fn submit(
        &self,
        batch: BatchIngestRequest,
    ) -> BoxFuture<'static, ClientResult<BatchIngestResult>>;
}

/// Last observed outcome of the sync engine, published on a watch channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing {
        fixture_id: Uuid,
        pending: usize,
    },
    Synced {
        fixture_id: Uuid,
        result: BatchIngestResult,
    },
    /// The server could not be reached; events stay queued.
    Offline {
        fixture_id: Uuid,
    },
    /// The server refused the batch; events stay queued.
    Failed {
        fixture_id: Uuid,
        message: String,
    },
}

/// Per-fixture outcomes of one [`SyncEngine::sync_all`] pass.
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub outcomes: Vec<(Uuid, ClientResult<BatchIngestResult>)>,
}

impl SyncSummary {
    /// Counts summed over the fixtures that synced.
    pub fn total(&self) -> BatchIngestResult {
        let mut total = BatchIngestResult::default();
        for result in self.outcomes.iter().filter_map(|(_, outcome)| outcome.as_ref().ok()) {
            total.synced += result.synced;
            total.duplicates += result.duplicates;
            total.failed += result.failed;
            total.acknowledged.extend(result.acknowledged.iter().cloned());
        }
        total
    }

    /// Fixtures the server refused, with the reason.
    pub fn rejected(&self) -> impl Iterator<Item = (Uuid, &ClientError)> {
        self.outcomes
            .iter()
            .filter_map(|(fixture_id, outcome)| outcome.as_ref().err().map(|err| (*fixture_id, err)))
    }
}

/// Reconciles the [`OfflineQueue`] with the server through an [`EventSink`].
///
/// With a [`MatchStateSink`] attached, lifecycle and clock pushes of a
/// fixture are kept in order and flushed ahead of its events.
pub struct SyncEngine {
    queue: Arc<OfflineQueue>,
    sink: Arc<dyn EventSink>,
    state_sink: Option<Arc<dyn MatchStateSink>>,
    pending_pushes: DashMap<Uuid, VecDeque<StatePush>>,
    in_flight: DashMap<Uuid, Arc<Mutex<()>>>,
    status: watch::Sender<SyncStatus>,
}

impl SyncEngine {
    pub fn new(queue: Arc<OfflineQueue>, sink: Arc<dyn EventSink>) -> Self {
        let (status, _rx) = watch::channel(SyncStatus::Idle);
        Self {
            queue,
            sink,
            state_sink: None,
            pending_pushes: DashMap::new(),
            in_flight: DashMap::new(),
            status,
        }
    }

    pub fn with_state_sink(mut self, state_sink: Arc<dyn MatchStateSink>) -> Self {
        self.state_sink = Some(state_sink);
        self
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    /// Subscribe to status updates.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Queue a match-state push for the next sync of `fixture_id`.
    ///
    /// A clock-only push replaces a trailing clock-only push that is not
    /// the one currently being sent. Ignored without a state sink.
    pub fn queue_state_push(&self, fixture_id: Uuid, push: StatePush) {
        if self.state_sink.is_none() {
            return;
        }
        let mut pending = self.pending_pushes.entry(fixture_id).or_default();
        if push.is_clock_only() && pending.len() > 1 {
            if let Some(last) = pending.back_mut().filter(|last| last.is_clock_only()) {
                *last = push;
                return;
            }
        }
        pending.push_back(push);
    }

    /// Number of match-state pushes waiting for `fixture_id`.
    pub fn pending_state_pushes(&self, fixture_id: Uuid) -> usize {
        self.pending_pushes
            .get(&fixture_id)
            .map_or(0, |pending| pending.len())
    }

    /// Starting lineup sizes held by the server, `None` without a state sink.
    pub async fn starter_counts(&self, fixture_id: Uuid) -> ClientResult<Option<(usize, usize)>> {
        match &self.state_sink {
            Some(sink) => sink.starter_counts(fixture_id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Flush pending match-state pushes, then send every pending event of
    /// `fixture_id` as one batch.
    ///
    /// Only acknowledged events leave the queue, so events captured while
    /// the batch is in flight are sent by the next call. Concurrent calls
    /// for the same fixture run one after the other; a call that finds the
    /// queue empty returns zero counts without contacting the event sink.
    pub async fn sync(&self, fixture_id: Uuid) -> ClientResult<BatchIngestResult> {
        if fixture_id.is_nil() {
            return Err(ClientError::MissingFixtureId);
        }
        let _guard = self.exclusive(fixture_id).await;

        if let Err(err) = self.flush_state_pushes(fixture_id).await {
            self.publish_failure(fixture_id, &err);
            return Err(err);
        }

        let events = self.queue.pending(fixture_id).await?;
        if events.is_empty() {
            return Ok(BatchIngestResult::default());
        }
        let pending = events.len();
        self.status
            .send_replace(SyncStatus::Syncing { fixture_id, pending });

        let batch = BatchIngestRequest::new(fixture_id, events);
        match self.sink.submit(batch).await {
            Ok(result) => {
                let acknowledged: HashSet<ClientId> =
                    result.acknowledged.iter().cloned().collect();
                let removed = self.queue.remove(fixture_id, &acknowledged).await?;
                debug!(
                    fixture_id = %fixture_id,
                    pending,
                    synced = result.synced,
                    duplicates = result.duplicates,
                    failed = result.failed,
                    removed,
                    "batch synced"
                );
                self.status.send_replace(SyncStatus::Synced {
                    fixture_id,
                    result: result.clone(),
                });
                Ok(result)
            }
            Err(err) => {
                warn!(fixture_id = %fixture_id, pending, error = %err, "batch sync failed; events kept in queue");
                self.publish_failure(fixture_id, &err);
                Err(err)
            }
        }
    }

    /// Send queued match-state pushes in order.
    ///
    /// Stops at the first retryable failure, keeping that push and the ones
    /// after it. A push the server refuses is dropped.
    async fn flush_state_pushes(&self, fixture_id: Uuid) -> ClientResult<()> {
        let Some(sink) = &self.state_sink else {
            return Ok(());
        };
        loop {
            let next = self
                .pending_pushes
                .get(&fixture_id)
                .and_then(|pending| pending.front().copied());
            let Some(push) = next else {
                break;
            };
            match sink.push_state(fixture_id, push).await {
                Ok(()) => {
                    debug!(fixture_id = %fixture_id, status = ?push.status, clock = push.match_clock, "match state pushed");
                }
                Err(err) if err.is_retryable() => {
                    warn!(fixture_id = %fixture_id, status = ?push.status, error = %err, "match state push failed; kept for retry");
                    return Err(err);
                }
                Err(err) => {
                    warn!(fixture_id = %fixture_id, status = ?push.status, error = %err, "match state push rejected; dropped");
                }
            }
            if let Some(mut pending) = self.pending_pushes.get_mut(&fixture_id) {
                pending.pop_front();
            }
        }
        self.pending_pushes
            .remove_if(&fixture_id, |_, pending| pending.is_empty());
        Ok(())
    }

    fn publish_failure(&self, fixture_id: Uuid, err: &ClientError) {
        let status = if err.is_retryable() {
            SyncStatus::Offline { fixture_id }
        } else {
            SyncStatus::Failed {
                fixture_id,
                message: err.to_string(),
            }
        };
        self.status.send_replace(status);
    }

    /// Hold off syncing `fixture_id` until the guard is dropped.
    ///
    /// Used to edit the queue without racing an in-flight batch.
    pub async fn exclusive(&self, fixture_id: Uuid) -> OwnedMutexGuard<()> {
        let gate = self
            .in_flight
            .entry(fixture_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        gate.lock_owned().await
    }

    /// Sync every fixture with pending events or match-state pushes.
    ///
    /// A fixture the server refuses does not hold back the others; its
    /// error is recorded in the summary. The pass stops early only on a
    /// retryable failure, since the next fixture would hit it too.
    pub async fn sync_all(&self) -> ClientResult<SyncSummary> {
        let mut fixtures: BTreeSet<Uuid> = self
            .queue
            .fixtures_with_pending()
            .await?
            .into_iter()
            .collect();
        fixtures.extend(self.pending_pushes.iter().map(|entry| *entry.key()));

        let mut summary = SyncSummary::default();
        for fixture_id in fixtures {
            match self.sync(fixture_id).await {
                Err(err) if err.is_retryable() => return Err(err),
                outcome => summary.outcomes.push((fixture_id, outcome)),
            }
        }
        Ok(summary)
    }

    /// Retry [`Self::sync_all`] with jittered exponential backoff until it
    /// completes a pass or `online` drops back to false.
    async fn drain_with_retry(&self, online: &watch::Receiver<bool>) {
        let mut delay = RETRY_INITIAL_DELAY;
        for attempt in 0..RETRY_MAX_ATTEMPTS {
            if !*online.borrow() {
                debug!(attempt, "connectivity lost; postponing sync");
                return;
            }
            match self.sync_all().await {
                Ok(summary) => {
                    let total = summary.total();
                    if total.accepted() > 0 || total.failed > 0 {
                        info!(
                            synced = total.synced,
                            duplicates = total.duplicates,
                            failed = total.failed,
                            "offline queue drained after reconnect"
                        );
                    }
                    for (fixture_id, err) in summary.rejected() {
                        warn!(fixture_id = %fixture_id, error = %err, "fixture refused by server; events stay queued");
                    }
                    return;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "sync after reconnect failed; retrying");
                    sleep(with_jitter(delay)).await;
                    delay = (delay * 2).min(RETRY_MAX_DELAY);
                }
            }
        }
        warn!("exhausted sync attempts after reconnect; events stay queued");
    }
}

fn with_jitter(delay: Duration) -> Duration {
    let spread = (delay.as_millis() / 4) as u64;
    delay + Duration::from_millis(rand::rng().random_range(0..=spread))
}

/// Re-trigger sync whenever `online` flips from false to true.
///
/// A pending queue is also drained once at spawn when already online. The
/// task ends when the sender side of `online` is dropped.
pub fn spawn_connectivity_watcher(
    engine: Arc<SyncEngine>,
    mut online: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut was_online = *online.borrow_and_update();
        if was_online {
            engine.drain_with_retry(&online).await;
        }
        while online.changed().await.is_ok() {
            let now_online = *online.borrow_and_update();
            if now_online && !was_online {
                info!("connectivity restored; syncing offline queue");
                engine.drain_with_retry(&online).await;
            }
            was_online = now_online;
        }
        debug!("connectivity watcher stopped");
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{
        Mutex as StdMutex,
        atomic::{AtomicBool, AtomicU32, Ordering},
    };

    use super::*;
    use crate::{
        events::{EventKind, Half, MatchEvent, ScoringType, Side},
        state::state_machine::MatchStatus,
    };

    /// In-memory stand-in for the server's idempotent ingest and match-state routes.
    #[derive(Default)]
    pub(crate) struct LoopbackSink {
        pub(crate) offline: AtomicBool,
        pub(crate) calls: AtomicU32,
        pub(crate) stored: StdMutex<Vec<MatchEvent>>,
        /// Client ids the sink pretends not to have received.
        pub(crate) drop_ids: StdMutex<HashSet<ClientId>>,
        /// Fixtures answered with 404.
        pub(crate) unknown_fixtures: StdMutex<HashSet<Uuid>>,
        /// Event appended to the queue while the batch is in flight.
        pub(crate) during_flight: StdMutex<Option<(Arc<OfflineQueue>, MatchEvent)>>,
        /// Time each batch round trip takes.
        pub(crate) latency: StdMutex<Option<Duration>>,
        pub(crate) pushes: StdMutex<Vec<(Uuid, StatePush)>>,
        pub(crate) starters: StdMutex<(usize, usize)>,
    }

    impl LoopbackSink {
        fn refusal(&self, fixture_id: Uuid) -> Option<ClientError> {
            if self.offline.load(Ordering::SeqCst) {
                return Some(ClientError::Transport("connection refused".into()));
            }
            if self.unknown_fixtures.lock().unwrap().contains(&fixture_id) {
                return Some(ClientError::Rejected {
                    status: 404,
                    message: format!("fixture `{fixture_id}` not found"),
                });
            }
            None
        }

        /// Lifecycle statuses received for `fixture_id`, clock-only pushes left out.
        pub(crate) fn pushed_statuses(
            &self,
            fixture_id: Uuid,
        ) -> Vec<MatchStatus> {
            self.pushes
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, _)| *id == fixture_id)
                .filter_map(|(_, push)| push.status)
                .collect()
        }
    }

    impl EventSink for LoopbackSink {
        fn submit(
            &self,
            batch: BatchIngestRequest,
        ) -> BoxFuture<'static, ClientResult<BatchIngestResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.refusal(batch.fixture_id) {
                return Box::pin(async move { Err(err) });
            }

            let mut result = BatchIngestResult::default();
            {
                let drop_ids = self.drop_ids.lock().unwrap();
                let mut stored = self.stored.lock().unwrap();
                for row in batch.events {
                    let Ok(event) = row.into_event() else {
                        result.failed += 1;
                        continue;
                    };
                    if drop_ids.contains(&event.client_id) {
                        continue;
                    }
                    if stored.iter().any(|e| e.client_id == event.client_id) {
                        result.duplicates += 1;
                    } else {
                        result.synced += 1;
                        stored.push(event.clone());
                    }
                    result.acknowledged.push(event.client_id);
                }
            }
            let during_flight = self.during_flight.lock().unwrap().take();
            let latency = *self.latency.lock().unwrap();
            Box::pin(async move {
                if let Some(latency) = latency {
                    sleep(latency).await;
                }
                if let Some((queue, event)) = during_flight {
                    queue.append(&event).await?;
                }
                Ok(result)
            })
        }
    }

    impl MatchStateSink for LoopbackSink {
        fn push_state(
            &self,
            fixture_id: Uuid,
            push: StatePush,
        ) -> BoxFuture<'static, ClientResult<()>> {
            let outcome = match self.refusal(fixture_id) {
                Some(err) => Err(err),
                None => {
                    self.pushes.lock().unwrap().push((fixture_id, push));
                    Ok(())
                }
            };
            Box::pin(async move { outcome })
        }

        fn starter_counts(
            &self,
            fixture_id: Uuid,
        ) -> BoxFuture<'static, ClientResult<(usize, usize)>> {
            let outcome = match self.refusal(fixture_id) {
                Some(err) => Err(err),
                None => Ok(*self.starters.lock().unwrap()),
            };
            Box::pin(async move { outcome })
        }
    }

    pub(crate) fn point(fixture_id: Uuid, client_id: &str) -> MatchEvent {
        let mut event = MatchEvent::new(
            fixture_id,
            Side::Home,
            Half::H1,
            60,
            EventKind::Scoring(ScoringType::Point),
        );
        event.client_id = client_id.into();
        event
    }

    async fn engine() -> (tempfile::TempDir, Arc<OfflineQueue>, Arc<LoopbackSink>, Arc<SyncEngine>) {
        let dir = tempfile::tempdir().unwrap();
        let queue = Arc::new(OfflineQueue::open(dir.path()).await.unwrap());
        let sink = Arc::new(LoopbackSink::default());
        let engine = Arc::new(
            SyncEngine::new(queue.clone(), sink.clone()).with_state_sink(sink.clone()),
        );
        (dir, queue, sink, engine)
    }

    #[tokio::test]
    async fn empty_queue_is_a_no_op() {
        let (_dir, _queue, sink, engine) = engine().await;
        let result = engine.sync(Uuid::new_v4()).await.unwrap();
        assert_eq!(result, BatchIngestResult::default());
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn nil_fixture_is_rejected_without_network() {
        let (_dir, _queue, sink, engine) = engine().await;
        assert!(matches!(
            engine.sync(Uuid::nil()).await,
            Err(ClientError::MissingFixtureId)
        ));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_sync_clears_queue() {
        let (_dir, queue, sink, engine) = engine().await;
        let fixture = Uuid::new_v4();
        queue.append(&point(fixture, "a")).await.unwrap();
        queue.append(&point(fixture, "b")).await.unwrap();

        let result = engine.sync(fixture).await.unwrap();
        assert_eq!((result.synced, result.duplicates, result.failed), (2, 0, 0));
        assert_eq!(queue.len(fixture).await.unwrap(), 0);
        assert!(matches!(
            *engine.status().borrow(),
            SyncStatus::Synced { .. }
        ));

        let again = engine.sync(fixture).await.unwrap();
        assert_eq!(again, BatchIngestResult::default());
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
        assert_eq!(sink.stored.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn transport_failure_keeps_queue() {
        let (_dir, queue, sink, engine) = engine().await;
        let fixture = Uuid::new_v4();
        queue.append(&point(fixture, "a")).await.unwrap();
        sink.offline.store(true, Ordering::SeqCst);

        let err = engine.sync(fixture).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(queue.len(fixture).await.unwrap(), 1);
        assert_eq!(
            *engine.status().borrow(),
            SyncStatus::Offline { fixture_id: fixture }
        );

        sink.offline.store(false, Ordering::SeqCst);
        let result = engine.sync(fixture).await.unwrap();
        assert_eq!(result.synced, 1);
        assert_eq!(queue.len(fixture).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unacknowledged_events_stay_queued() {
        let (_dir, queue, sink, engine) = engine().await;
        let fixture = Uuid::new_v4();
        queue.append(&point(fixture, "a")).await.unwrap();
        queue.append(&point(fixture, "b")).await.unwrap();
        sink.drop_ids.lock().unwrap().insert("b".into());

        engine.sync(fixture).await.unwrap();
        let left: Vec<_> = queue
            .pending(fixture)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.client_id)
            .collect();
        assert_eq!(left, vec!["b"]);
    }

    #[tokio::test]
    async fn event_captured_during_round_trip_survives() {
        let (_dir, queue, sink, engine) = engine().await;
        let fixture = Uuid::new_v4();
        queue.append(&point(fixture, "a")).await.unwrap();
        *sink.during_flight.lock().unwrap() = Some((queue.clone(), point(fixture, "late")));

        engine.sync(fixture).await.unwrap();
        let left: Vec<_> = queue
            .pending(fixture)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.client_id)
            .collect();
        assert_eq!(left, vec!["late"]);
    }

    #[tokio::test]
    async fn concurrent_syncs_send_each_event_once() {
        let (_dir, queue, sink, engine) = engine().await;
        let fixture = Uuid::new_v4();
        for id in ["a", "b", "c"] {
            queue.append(&point(fixture, id)).await.unwrap();
        }

        let (first, second) = tokio::join!(engine.sync(fixture), engine.sync(fixture));
        let first = first.unwrap();
        let second = second.unwrap();
        assert_eq!(first.synced + second.synced, 3);
        assert_eq!(first.duplicates + second.duplicates, 0);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconnect_drains_every_fixture() {
        let (_dir, queue, sink, engine) = engine().await;
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        queue.append(&point(first, "a")).await.unwrap();
        queue.append(&point(second, "b")).await.unwrap();

        let (online_tx, online_rx) = watch::channel(false);
        let watcher = spawn_connectivity_watcher(engine.clone(), online_rx);
        online_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while !queue.fixtures_with_pending().await.unwrap().is_empty() {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("queue drained after reconnect");

        assert_eq!(sink.stored.lock().unwrap().len(), 2);
        drop(online_tx);
        watcher.await.unwrap();
    }

    #[tokio::test]
    async fn refused_fixture_does_not_hold_back_others() {
        let (_dir, queue, sink, engine) = engine().await;
        let deleted = Uuid::from_u128(1);
        let healthy = Uuid::from_u128(2);
        queue.append(&point(deleted, "a")).await.unwrap();
        queue.append(&point(healthy, "b")).await.unwrap();
        queue.append(&point(healthy, "c")).await.unwrap();
        sink.unknown_fixtures.lock().unwrap().insert(deleted);

        let summary = engine.sync_all().await.unwrap();
        assert_eq!(summary.total().synced, 2);
        let rejected: Vec<_> = summary.rejected().map(|(id, _)| id).collect();
        assert_eq!(rejected, vec![deleted]);

        assert_eq!(queue.len(healthy).await.unwrap(), 0);
        assert_eq!(queue.len(deleted).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unreachable_server_aborts_the_pass() {
        let (_dir, queue, sink, engine) = engine().await;
        queue.append(&point(Uuid::from_u128(1), "a")).await.unwrap();
        queue.append(&point(Uuid::from_u128(2), "b")).await.unwrap();
        sink.offline.store(true, Ordering::SeqCst);

        assert!(engine.sync_all().await.unwrap_err().is_retryable());
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconnect_drains_past_refused_fixture() {
        let (_dir, queue, sink, engine) = engine().await;
        let deleted = Uuid::from_u128(1);
        let healthy = Uuid::from_u128(2);
        queue.append(&point(deleted, "a")).await.unwrap();
        queue.append(&point(healthy, "b")).await.unwrap();
        sink.unknown_fixtures.lock().unwrap().insert(deleted);

        let (online_tx, online_rx) = watch::channel(false);
        let watcher = spawn_connectivity_watcher(engine.clone(), online_rx);
        online_tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while queue.len(healthy).await.unwrap() > 0 {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("healthy fixture drained after reconnect");

        assert_eq!(queue.len(deleted).await.unwrap(), 1);
        drop(online_tx);
        watcher.await.unwrap();
    }

    #[tokio::test]
    async fn state_pushes_wait_for_connectivity_and_keep_order() {
        let (_dir, _queue, sink, engine) = engine().await;
        let fixture = Uuid::new_v4();
        sink.offline.store(true, Ordering::SeqCst);
        engine.queue_state_push(fixture, StatePush::lifecycle(MatchStatus::InProgress, 0, Half::H1));
        engine.queue_state_push(fixture, StatePush::clock(30, Half::H1));
        engine.queue_state_push(fixture, StatePush::lifecycle(MatchStatus::Paused, 40, Half::H1));
        engine.queue_state_push(fixture, StatePush::clock(40, Half::H1));
        engine.queue_state_push(fixture, StatePush::clock(41, Half::H1));

        assert!(engine.sync(fixture).await.unwrap_err().is_retryable());
        assert_eq!(engine.pending_state_pushes(fixture), 4);

        sink.offline.store(false, Ordering::SeqCst);
        let summary = engine.sync_all().await.unwrap();
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(engine.pending_state_pushes(fixture), 0);
        assert_eq!(
            sink.pushed_statuses(fixture),
            vec![MatchStatus::InProgress, MatchStatus::Paused]
        );
        let last = sink.pushes.lock().unwrap().last().map(|(_, push)| *push);
        assert_eq!(last, Some(StatePush::clock(41, Half::H1)));
    }
}

//! Capture session for one fixture.
//!
//! The tracker owns the local [`MatchState`] projection, the list of events
//! captured in this session and the match clock. Every event is written to
//! the offline queue before it touches the projection, and a sync is
//! attempted right away when the device is online.

use std::{sync::Arc, time::{Duration, SystemTime}};

use tokio::sync::{Mutex, watch};
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    error::{ClientError, ClientResult},
    lifecycle::StatePush,
    sync::SyncEngine,
};
use crate::{
    events::{ClientId, EventKind, EventOutcome, MatchEvent, Side},
    state::{
        clock::{CLOCK_TICK, ClockDriver},
        match_state::{MatchState, MatchStateError},
        state_machine::{MatchStateMachine, MatchStatus, MatchTransition, start_preconditions},
    },
};

/// User input describing an event to capture. Clock and half are stamped by
/// the tracker.
#[derive(Debug, Clone)]
pub struct EventDraft {
    side: Side,
    kind: EventKind,
    player_id: Option<String>,
    outcome: Option<EventOutcome>,
    zone: Option<String>,
    notes: Option<String>,
}

impl EventDraft {
    pub fn new(side: Side, kind: EventKind) -> Self {
        Self {
            side,
            kind,
            player_id: None,
            outcome: None,
            zone: None,
            notes: None,
        }
    }

    pub fn player(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    pub fn outcome(mut self, outcome: EventOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Single capture session of a fixture.
pub struct MatchTracker {
    fixture_id: Uuid,
    machine: MatchStateMachine,
    state: Arc<Mutex<MatchState>>,
    captured: Vec<MatchEvent>,
    engine: Arc<SyncEngine>,
    online: watch::Receiver<bool>,
    clock: ClockDriver,
    tick_period: Duration,
    /// Starting lineup sizes `(home, away)` last known to this device.
    lineups: Option<(usize, usize)>,
}

impl MatchTracker {
    /// Open a session on `fixture_id`, rejecting the nil identifier.
    pub fn new(
        fixture_id: Uuid,
        engine: Arc<SyncEngine>,
        online: watch::Receiver<bool>,
    ) -> ClientResult<Self> {
        if fixture_id.is_nil() {
            return Err(ClientError::MissingFixtureId);
        }
        Ok(Self {
            fixture_id,
            machine: MatchStateMachine::new(),
            state: Arc::new(Mutex::new(MatchState::new(fixture_id))),
            captured: Vec::new(),
            engine,
            online,
            clock: ClockDriver::new(),
            tick_period: CLOCK_TICK,
            lineups: None,
        })
    }

    /// Override the clock tick period.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn fixture_id(&self) -> Uuid {
        self.fixture_id
    }

    pub fn status(&self) -> MatchStatus {
        self.machine.status()
    }

    /// Copy of the local projection.
    pub async fn snapshot(&self) -> MatchState {
        self.state.lock().await.clone()
    }

    /// Events captured in this session, oldest first, undone ones excluded.
    pub fn events(&self) -> &[MatchEvent] {
        &self.captured
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Record the starting lineup sizes entered on this device.
    ///
    /// Used to gate [`Self::start`] when the server cannot be asked.
    pub fn set_lineup_sizes(&mut self, home_starters: usize, away_starters: usize) {
        self.lineups = Some((home_starters, away_starters));
    }

    /// Record an event at the current clock.
    ///
    /// The event is durable once this returns `Ok`, whether or not the
    /// follow-up sync reached the server.
    pub async fn capture(&mut self, draft: EventDraft) -> ClientResult<MatchEvent> {
        if draft.kind.is_correction() {
            return Err(ClientError::InvalidEvent(
                "corrections are recorded through undo".into(),
            ));
        }

        let mut event = {
            let state = self.state.lock().await;
            if state.status.is_terminal() {
                return Err(MatchStateError::Completed.into());
            }
            MatchEvent::new(
                self.fixture_id,
                draft.side,
                state.half,
                state.match_clock,
                draft.kind,
            )
        };
        event.player_id = draft.player_id;
        event.outcome = draft.outcome;
        event.zone = draft.zone;
        event.notes = draft.notes;

        self.engine.queue().append(&event).await?;
        self.state.lock().await.apply_event(&event)?;

        debug!(fixture_id = %self.fixture_id, client_id = %event.client_id, kind = %event.kind.label(), "event captured");
        self.captured.push(event.clone());
        self.push_clock().await;
        self.sync_if_online().await;
        Ok(event)
    }

    /// Undo the most recently captured event.
    ///
    /// A still-queued event is simply dropped from the queue; one the server
    /// may already hold is compensated by a queued `Corrections/Undo` event.
    /// Returns the undone event, or `None` when nothing was captured.
    ///
    /// Waiting for an in-flight batch does not hold the projection lock, so
    /// the clock keeps ticking meanwhile.
    pub async fn undo_last(&mut self) -> ClientResult<Option<MatchEvent>> {
        let Some(target) = self.captured.last().cloned() else {
            return Ok(None);
        };

        let hold = self.engine.exclusive(self.fixture_id).await;
        let stamp = {
            let state = self.state.lock().await;
            if state.status.is_terminal() {
                return Err(MatchStateError::Completed.into());
            }
            state.match_clock
        };

        let queue = self.engine.queue();
        let tombstoned = if queue.remove_one(self.fixture_id, &target.client_id).await? {
            false
        } else {
            queue.append(&MatchEvent::undo_of(&target, stamp)).await?;
            true
        };
        drop(hold);

        self.state.lock().await.revert_event(&target)?;
        self.captured.pop();
        info!(fixture_id = %self.fixture_id, client_id = %target.client_id, tombstoned, "event undone");
        if tombstoned {
            self.push_clock().await;
            self.sync_if_online().await;
        }
        Ok(Some(target))
    }

    /// Start the match once both sides have a starting lineup.
    ///
    /// Online, the lineups stored by the server decide and refresh the local
    /// sizes. Offline or when the server cannot be reached, the sizes last
    /// known to this device are used.
    pub async fn start(&mut self) -> ClientResult<()> {
        if *self.online.borrow() {
            match self.engine.starter_counts(self.fixture_id).await {
                Ok(Some(counts)) => self.lineups = Some(counts),
                Ok(None) => {}
                Err(err) if err.is_retryable() => {
                    debug!(fixture_id = %self.fixture_id, error = %err, "server lineups unavailable; using local sizes");
                }
                Err(err) => return Err(err),
            }
        }
        let (home, away) = self.lineups.unwrap_or_default();
        start_preconditions(home, away)?;
        self.transition(MatchTransition::Start).await
    }

    pub async fn pause(&mut self) -> ClientResult<()> {
        self.transition(MatchTransition::Pause).await
    }

    pub async fn resume(&mut self) -> ClientResult<()> {
        self.transition(MatchTransition::Resume).await
    }

    /// Final whistle: stops the clock and flushes the queue when online.
    pub async fn complete(&mut self) -> ClientResult<()> {
        self.transition(MatchTransition::Complete).await
    }

    /// Apply `transition` locally, then push the new status with the clock.
    async fn transition(&mut self, transition: MatchTransition) -> ClientResult<()> {
        let next = self.machine.transition(transition)?;
        let (match_clock, half) = {
            let mut state = self.state.lock().await;
            state.enter(next, SystemTime::now());
            (state.match_clock, state.half)
        };

        if next == MatchStatus::InProgress {
            let state = self.state.clone();
            self.clock.start(self.tick_period, move || {
                let state = state.clone();
                async move { state.lock().await.tick() }
            });
        } else {
            self.clock.stop();
        }
        info!(fixture_id = %self.fixture_id, transition = ?transition, status = ?next, "local match transition");

        self.engine
            .queue_state_push(self.fixture_id, StatePush::lifecycle(next, match_clock, half));
        self.sync_if_online().await;
        Ok(())
    }

    /// Queue the current clock for the server while the match is live.
    async fn push_clock(&self) {
        let state = self.state.lock().await;
        if matches!(state.status, MatchStatus::InProgress | MatchStatus::Paused) {
            self.engine
                .queue_state_push(self.fixture_id, StatePush::clock(state.match_clock, state.half));
        }
    }

    /// Best-effort sync; failures are reported by the engine and the events
    /// and pushes stay queued for the connectivity watcher.
    async fn sync_if_online(&mut self) {
        if !*self.online.borrow() {
            return;
        }
        if let Ok(result) = self.engine.sync(self.fixture_id).await {
            self.mark_synced(&result.acknowledged);
        }
    }

    fn mark_synced(&mut self, acknowledged: &[ClientId]) {
        for event in &mut self.captured {
            if acknowledged.contains(&event.client_id) {
                event.synced = true;
            }
        }
    }
}

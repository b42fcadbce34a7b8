//! Authoritative per-fixture match state: running score, clock and status.

use std::time::SystemTime;

use thiserror::Error;
use uuid::Uuid;

use crate::events::{Half, MatchEvent, ScoreComponent, Side};

use super::state_machine::MatchStatus;

/// Rejected mutation of a [`MatchState`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchStateError {
    /// The match is completed; its score and clock are final.
    #[error("match is completed")]
    Completed,
    /// The clock may only move forward within a half.
    #[error("match clock cannot move backwards ({current}s -> {requested}s)")]
    ClockRegression {
        /// Clock value before the request.
        current: u32,
        /// Rejected clock value.
        requested: u32,
    },
}

/// Snapshot of one fixture's match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    pub fixture_id: Uuid,
    pub status: MatchStatus,
    pub home_goals: u32,
    pub home_points: u32,
    pub away_goals: u32,
    pub away_points: u32,
    /// Elapsed seconds since throw-in, frozen unless `IN_PROGRESS`.
    pub match_clock: u32,
    pub half: Half,
    pub started_at: Option<SystemTime>,
    pub completed_at: Option<SystemTime>,
    /// Bumped on every persisted mutation; used for optimistic concurrency.
    pub version: u64,
}

impl MatchState {
    /// Fresh state of a fixture that has not started.
    pub fn new(fixture_id: Uuid) -> Self {
        Self {
            fixture_id,
            status: MatchStatus::NotStarted,
            home_goals: 0,
            home_points: 0,
            away_goals: 0,
            away_points: 0,
            match_clock: 0,
            half: Half::H1,
            started_at: None,
            completed_at: None,
            version: 0,
        }
    }

    /// Total in points for `side`: a goal is worth three.
    pub fn total(&self, side: Side) -> u32 {
        let (goals, points) = self.score(side);
        goals * 3 + points
    }

    /// `(goals, points)` of `side`.
    pub fn score(&self, side: Side) -> (u32, u32) {
        match side {
            Side::Home => (self.home_goals, self.home_points),
            Side::Away => (self.away_goals, self.away_points),
        }
    }

    /// Apply the running-score effect of a live event.
    pub fn apply_event(&mut self, event: &MatchEvent) -> Result<(), MatchStateError> {
        if self.status.is_terminal() {
            return Err(MatchStateError::Completed);
        }
        if let Some((side, component)) = event.score_effect() {
            *self.counter(side, component) += 1;
        }
        Ok(())
    }

    /// Reverse the running-score effect of an undone event, saturating at zero.
    pub fn revert_event(&mut self, event: &MatchEvent) -> Result<(), MatchStateError> {
        if self.status.is_terminal() {
            return Err(MatchStateError::Completed);
        }
        if let Some((side, component)) = event.score_effect() {
            let counter = self.counter(side, component);
            *counter = counter.saturating_sub(1);
        }
        Ok(())
    }

    /// Advance the clock by one second while the match is running.
    pub fn tick(&mut self) {
        if self.status == MatchStatus::InProgress {
            self.match_clock = self.match_clock.saturating_add(1);
        }
    }

    /// Overwrite the clock, refusing to move it backwards within a half.
    ///
    /// Switching to the second half resets the baseline, so any value is
    /// accepted when `half` differs from the current one.
    pub fn set_clock(&mut self, seconds: u32, half: Half) -> Result<(), MatchStateError> {
        if self.status.is_terminal() {
            return Err(MatchStateError::Completed);
        }
        if half == self.half && seconds < self.match_clock {
            return Err(MatchStateError::ClockRegression {
                current: self.match_clock,
                requested: seconds,
            });
        }
        self.match_clock = seconds;
        self.half = half;
        Ok(())
    }

    /// Recompute the running score from a canonical event log.
    ///
    /// This is a projection and also runs for completed matches so late
    /// events synced after the final whistle are reflected.
    pub fn rescore_from<'a>(&mut self, log: impl IntoIterator<Item = &'a MatchEvent>) {
        self.home_goals = 0;
        self.home_points = 0;
        self.away_goals = 0;
        self.away_points = 0;
        for event in log {
            if let Some((side, component)) = event.score_effect() {
                *self.counter(side, component) += 1;
            }
        }
    }

    /// Record the timestamps implied by entering `status`.
    pub fn enter(&mut self, status: MatchStatus, at: SystemTime) {
        match status {
            MatchStatus::InProgress if self.started_at.is_none() => self.started_at = Some(at),
            MatchStatus::Completed => self.completed_at = Some(at),
            _ => {}
        }
        self.status = status;
    }

    fn counter(&mut self, side: Side, component: ScoreComponent) -> &mut u32 {
        match (side, component) {
            (Side::Home, ScoreComponent::Goal) => &mut self.home_goals,
            (Side::Home, ScoreComponent::Point) => &mut self.home_points,
            (Side::Away, ScoreComponent::Goal) => &mut self.away_goals,
            (Side::Away, ScoreComponent::Point) => &mut self.away_points,
        }
    }
}

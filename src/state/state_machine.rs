use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a fixture's match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    /// Lineups are being prepared; the clock is frozen at zero.
    #[default]
    NotStarted,
    /// The clock is running and events are being captured.
    InProgress,
    /// The clock is frozen; events may still be captured.
    Paused,
    /// Terminal status; score and clock are final.
    Completed,
}

impl MatchStatus {
    /// Whether the match can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Completed)
    }
}

/// Transitions that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchTransition {
    /// Throw-in: start the clock.
    Start,
    /// Freeze the clock.
    Pause,
    /// Restart the clock after a pause.
    Resume,
    /// Final whistle.
    Complete,
}

impl MatchTransition {
    /// Transition that moves `from` to `to`, if a single one does.
    pub fn between(from: MatchStatus, to: MatchStatus) -> Option<Self> {
        match (from, to) {
            (MatchStatus::NotStarted, MatchStatus::InProgress) => Some(MatchTransition::Start),
            (MatchStatus::InProgress, MatchStatus::Paused) => Some(MatchTransition::Pause),
            (MatchStatus::Paused, MatchStatus::InProgress) => Some(MatchTransition::Resume),
            (MatchStatus::InProgress | MatchStatus::Paused, MatchStatus::Completed) => {
                Some(MatchTransition::Complete)
            }
            _ => None,
        }
    }
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {transition:?} cannot be applied while {from:?}")]
pub struct InvalidTransition {
    /// The status the machine was in when the transition was requested.
    pub from: MatchStatus,
    /// The rejected transition.
    pub transition: MatchTransition,
}

/// Gating precondition of a transition was not met.
///
/// Carries one human-readable entry per unmet condition so the capture UI
/// can render an actionable checklist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("preconditions not met: {}", checklist.join("; "))]
pub struct PreconditionFailed {
    /// Unmet conditions.
    pub checklist: Vec<String>,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current status.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Status changed since the plan was created.
    StatusMismatch {
        /// Status when plan was created.
        expected: MatchStatus,
        /// Current status.
        actual: MatchStatus,
    },
    /// Version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: u64,
        /// Current version.
        actual: u64,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Status the machine is currently in.
    pub from: MatchStatus,
    /// Status the machine will move to.
    pub to: MatchStatus,
    /// Transition that produced this plan.
    pub transition: MatchTransition,
    /// Version number after applying this transition.
    pub version_next: u64,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current status.
    pub status: MatchStatus,
    /// Version number (increments on each applied transition).
    pub version: u64,
    /// Pending target status, if a transition is planned but not yet applied.
    pub pending: Option<MatchStatus>,
}

/// Lifecycle state machine of one fixture's match.
///
/// `NOT_STARTED → IN_PROGRESS ⇄ PAUSED → COMPLETED`, with `COMPLETED`
/// reachable from both running statuses and terminal.
#[derive(Debug, Clone, Default)]
pub struct MatchStateMachine {
    status: MatchStatus,
    version: u64,
    pending: Option<Plan>,
}

impl MatchStateMachine {
    /// Create a new state machine for a match that has not started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a machine from a persisted status and version.
    pub fn restore(status: MatchStatus, version: u64) -> Self {
        Self {
            status,
            version,
            pending: None,
        }
    }

    /// Inspect the current status.
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Current version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Plan a transition by validating it against the current status.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, transition: MatchTransition) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(transition)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.status,
            to: next,
            transition,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, returning the new status.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<MatchStatus, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.status != plan.from {
            return Err(ApplyError::StatusMismatch {
                expected: plan.from,
                actual: self.status,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.status = plan.to;
        self.version = plan.version_next;

        Ok(self.status)
    }

    /// Abort a planned transition without applying it.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Plan and immediately apply a transition with no side-effect work.
    pub fn transition(&mut self, transition: MatchTransition) -> Result<MatchStatus, PlanError> {
        let plan = self.plan(transition)?;
        self.pending = None;
        self.status = plan.to;
        self.version = plan.version_next;
        Ok(self.status)
    }

    fn compute_transition(
        &self,
        transition: MatchTransition,
    ) -> Result<MatchStatus, InvalidTransition> {
        let next = match (self.status, transition) {
            (MatchStatus::NotStarted, MatchTransition::Start) => MatchStatus::InProgress,
            (MatchStatus::InProgress, MatchTransition::Pause) => MatchStatus::Paused,
            (MatchStatus::Paused, MatchTransition::Resume) => MatchStatus::InProgress,
            (MatchStatus::InProgress | MatchStatus::Paused, MatchTransition::Complete) => {
                MatchStatus::Completed
            }
            (from, transition) => return Err(InvalidTransition { from, transition }),
        };

        Ok(next)
    }
}

/// Check the gating precondition of [`MatchTransition::Start`]: both sides
/// must have a non-empty starting lineup.
pub fn start_preconditions(
    home_starters: usize,
    away_starters: usize,
) -> Result<(), PreconditionFailed> {
    let mut checklist = Vec::new();
    if home_starters == 0 {
        checklist.push("HOME starting lineup is empty".to_owned());
    }
    if away_starters == 0 {
        checklist.push("AWAY starting lineup is empty".to_owned());
    }

    if checklist.is_empty() {
        Ok(())
    } else {
        Err(PreconditionFailed { checklist })
    }
}

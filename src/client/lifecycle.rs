//! Match-state side of the capture client: lifecycle and clock pushes, and
//! the server's view of the lineups.

use futures::future::BoxFuture;
use serde::Serialize;
use uuid::Uuid;

use super::error::ClientResult;
use crate::{events::Half, state::state_machine::MatchStatus};

/// Destination of match-state updates.
///
/// Pushes are replayed in capture order; the server treats a push whose
/// status it already holds as a clock update, so replaying one whose
/// response was lost is harmless.
pub trait MatchStateSink: Send + Sync {
    fn push_state(&self, fixture_id: Uuid, push: StatePush) -> BoxFuture<'static, ClientResult<()>>;

    /// Starting lineup sizes `(home, away)` as stored by the server.
    fn starter_counts(&self, fixture_id: Uuid) -> BoxFuture<'static, ClientResult<(usize, usize)>>;
}

/// One match-state update, shaped as the body of `PUT /fixtures/{id}/match-state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePush {
    /// Lifecycle status entered, absent for a clock-only update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MatchStatus>,
    pub match_clock: u32,
    pub half: Half,
}

impl StatePush {
    pub fn lifecycle(status: MatchStatus, match_clock: u32, half: Half) -> Self {
        Self {
            status: Some(status),
            match_clock,
            half,
        }
    }

    pub fn clock(match_clock: u32, half: Half) -> Self {
        Self {
            status: None,
            match_clock,
            half,
        }
    }

    pub fn is_clock_only(&self) -> bool {
        self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn push_matches_update_body() {
        let started = StatePush::lifecycle(MatchStatus::InProgress, 0, Half::H1);
        assert_eq!(
            serde_json::to_value(started).unwrap(),
            json!({"status": "IN_PROGRESS", "matchClock": 0, "half": "H1"})
        );
        assert_eq!(
            serde_json::to_value(StatePush::clock(754, Half::H2)).unwrap(),
            json!({"matchClock": 754, "half": "H2"})
        );
    }
}

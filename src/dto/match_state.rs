use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    events::{Half, Side},
    state::{match_state::MatchState, state_machine::MatchStatus},
};

use super::format_system_time;

/// Match state as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchStateView {
    pub fixture_id: Uuid,
    pub status: MatchStatus,
    pub home_goals: u32,
    pub home_points: u32,
    pub away_goals: u32,
    pub away_points: u32,
    /// `homeGoals * 3 + homePoints`.
    pub home_total: u32,
    pub away_total: u32,
    pub match_clock: u32,
    pub half: Half,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Concurrency token accepted as `expectedVersion` on update.
    pub version: u64,
}

impl From<MatchState> for MatchStateView {
    fn from(state: MatchState) -> Self {
        Self {
            fixture_id: state.fixture_id,
            status: state.status,
            home_goals: state.home_goals,
            home_points: state.home_points,
            away_goals: state.away_goals,
            away_points: state.away_points,
            home_total: state.total(Side::Home),
            away_total: state.total(Side::Away),
            match_clock: state.match_clock,
            half: state.half,
            started_at: state.started_at.map(format_system_time),
            completed_at: state.completed_at.map(format_system_time),
            version: state.version,
        }
    }
}

/// Partial update of a match state.
///
/// Score fields are derived from the event log and cannot be written; a
/// `status` change runs the matching transition with its preconditions.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchStateRequest {
    #[serde(default)]
    pub match_clock: Option<u32>,
    #[serde(default)]
    pub half: Option<Half>,
    #[serde(default)]
    pub status: Option<MatchStatus>,
    /// Reject the update with 409 unless the stored version matches.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl UpdateMatchStateRequest {
    /// Whether the request only carries a version token.
    pub fn is_empty(&self) -> bool {
        self.match_clock.is_none() && self.half.is_none() && self.status.is_none()
    }
}

/// Query of the lifecycle transition routes.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransitionQuery {
    /// Reject the transition with 409 unless the stored version matches.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

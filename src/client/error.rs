use std::path::PathBuf;

use thiserror::Error;

use crate::state::{
    PlanError,
    match_state::MatchStateError,
    state_machine::{InvalidTransition, PreconditionFailed},
};

/// Result alias for capture-client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by the capture client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The operation was invoked without a usable fixture identifier.
    #[error("missing fixture identifier")]
    MissingFixtureId,
    /// The event does not belong to the tracked fixture or is malformed.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("offline queue I/O failed at `{path}`")]
    QueueIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("offline queue file `{path}` is corrupt")]
    QueueCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The batch never reached the server.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// A gating precondition of a transition was not met.
    #[error("preconditions not met: {}", .0.join("; "))]
    Precondition(Vec<String>),
    #[error("another transition is pending")]
    TransitionPending,
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error(transparent)]
    MatchState(#[from] MatchStateError),
}

impl From<PlanError> for ClientError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::AlreadyPending => ClientError::TransitionPending,
            PlanError::InvalidTransition(invalid) => ClientError::InvalidTransition(invalid),
        }
    }
}

impl From<PreconditionFailed> for ClientError {
    fn from(err: PreconditionFailed) -> Self {
        ClientError::Precondition(err.checklist)
    }
}

impl ClientError {
    /// Whether retrying later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

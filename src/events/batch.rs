//! Wire types of the idempotent batch-ingest operation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ClientId, MatchEvent};

/// Batch of queued events submitted by a capture client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchIngestRequest {
    pub fixture_id: Uuid,
    #[schema(value_type = Vec<MatchEvent>)]
    pub events: Vec<BatchRow>,
}

impl BatchIngestRequest {
    pub fn new(fixture_id: Uuid, events: impl IntoIterator<Item = MatchEvent>) -> Self {
        Self {
            fixture_id,
            events: events.into_iter().map(BatchRow::Event).collect(),
        }
    }
}

/// One row of a batch.
///
/// A row that does not read as a [`MatchEvent`] (unknown event type, missing
/// field) is kept raw so it can be counted as failed without rejecting the
/// rows around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchRow {
    Event(MatchEvent),
    Unreadable(serde_json::Value),
}

impl BatchRow {
    /// Client id of the row, when one can be read.
    pub fn client_id(&self) -> Option<&str> {
        match self {
            BatchRow::Event(event) => Some(&event.client_id),
            BatchRow::Unreadable(raw) => raw.get("clientId").and_then(serde_json::Value::as_str),
        }
    }

    /// The event, or why the row could not be read as one.
    pub fn into_event(self) -> Result<MatchEvent, String> {
        match self {
            BatchRow::Event(event) => Ok(event),
            BatchRow::Unreadable(raw) => match serde_json::from_value::<MatchEvent>(raw) {
                Ok(event) => Ok(event),
                Err(err) => Err(err.to_string()),
            },
        }
    }
}

/// Outcome of a batch ingest.
///
/// `acknowledged` lists every client id the server now holds (newly synced
/// or already present) so the client can clear exactly those queue entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchIngestResult {
    pub synced: u32,
    pub duplicates: u32,
    pub failed: u32,
    #[serde(default)]
    pub acknowledged: Vec<ClientId>,
}

impl BatchIngestResult {
    /// Number of events the server holds after this batch.
    pub fn accepted(&self) -> u32 {
        self.synced + self.duplicates
    }
}

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{dao::models::EventPatch, events::EventOutcome};

/// In-place edit of a stored event. Only spatial and descriptive fields
/// are editable; anything else requires an undo and a new event.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EditEventRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 32))]
    pub zone: Option<String>,
    #[serde(default)]
    pub outcome: Option<EventOutcome>,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

impl From<EditEventRequest> for EventPatch {
    fn from(request: EditEventRequest) -> Self {
        Self {
            zone: request.zone,
            outcome: request.outcome,
            notes: request.notes,
        }
    }
}

/// Query of the event log route.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EventLogQuery {
    /// Return the raw log, undo corrections and voided events included.
    #[serde(default)]
    pub include_corrections: bool,
}

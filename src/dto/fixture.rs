use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::FixtureEntity;

use super::{format_system_time, validation::validate_not_blank};

/// Payload creating a fixture.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFixtureRequest {
    #[validate(custom(function = "validate_not_blank"), length(max = 100))]
    pub home_team: String,
    #[validate(custom(function = "validate_not_blank"), length(max = 100))]
    pub away_team: String,
    /// First half of the benchmark bucket.
    #[validate(custom(function = "validate_not_blank"))]
    pub competition: String,
    /// Second half of the benchmark bucket.
    #[validate(custom(function = "validate_not_blank"))]
    pub season: String,
    /// Regulation length; the configured default applies when omitted.
    #[serde(default)]
    #[validate(range(min = 1, max = 180))]
    pub duration_minutes: Option<u32>,
}

/// Fixture as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FixtureView {
    pub id: Uuid,
    pub home_team: String,
    pub away_team: String,
    pub competition: String,
    pub season: String,
    pub duration_minutes: u32,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

impl From<FixtureEntity> for FixtureView {
    fn from(fixture: FixtureEntity) -> Self {
        Self {
            id: fixture.id,
            home_team: fixture.home_team,
            away_team: fixture.away_team,
            competition: fixture.competition,
            season: fixture.season,
            duration_minutes: fixture.duration_minutes,
            created_at: format_system_time(fixture.created_at),
        }
    }
}

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{LineupSlotEntity, SquadEntity, SubEventEntity},
    events::Side,
};

use super::validation::validate_not_blank;

/// Most players allowed on the field at once.
pub const MAX_STARTERS: usize = 15;

/// One player of a lineup.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineupSlotDto {
    #[validate(custom(function = "validate_not_blank"))]
    pub player_id: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(range(min = 1, max = 99))]
    pub jersey_number: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl From<LineupSlotDto> for LineupSlotEntity {
    fn from(slot: LineupSlotDto) -> Self {
        Self {
            player_id: slot.player_id,
            name: slot.name,
            jersey_number: slot.jersey_number,
            position: slot.position,
        }
    }
}

impl From<LineupSlotEntity> for LineupSlotDto {
    fn from(slot: LineupSlotEntity) -> Self {
        Self {
            player_id: slot.player_id,
            name: slot.name,
            jersey_number: slot.jersey_number,
            position: slot.position,
        }
    }
}

/// Replace the lineup of one side.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetLineupRequest {
    pub starting: Vec<LineupSlotDto>,
    #[serde(default)]
    pub bench: Vec<LineupSlotDto>,
}

impl Validate for SetLineupRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.starting.len() > MAX_STARTERS {
            let mut err = ValidationError::new("starting_length");
            err.message = Some(
                format!(
                    "at most {MAX_STARTERS} starters allowed (got {})",
                    self.starting.len()
                )
                .into(),
            );
            errors.add("starting", err);
        }

        let mut seen = HashSet::new();
        for slot in self.starting.iter().chain(self.bench.iter()) {
            if let Err(slot_errors) = slot.validate() {
                errors.merge_self("slot", Err(slot_errors));
            }
            if !seen.insert(slot.player_id.as_str()) {
                let mut err = ValidationError::new("duplicate_player");
                err.message = Some(format!("player `{}` listed twice", slot.player_id).into());
                errors.add("players", err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Player change on one side.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub player_off_id: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub player_on_id: String,
    /// Match-clock seconds of the change.
    pub match_time: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubEventDto {
    pub player_off_id: String,
    pub player_on_id: String,
    pub match_time: u32,
}

impl From<SubEventEntity> for SubEventDto {
    fn from(sub: SubEventEntity) -> Self {
        Self {
            player_off_id: sub.player_off_id,
            player_on_id: sub.player_on_id,
            match_time: sub.match_time,
        }
    }
}

/// Squad of one side.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SquadView {
    pub side: Side,
    /// Players currently on the field.
    pub starting: Vec<LineupSlotDto>,
    pub bench: Vec<LineupSlotDto>,
    pub sub_events: Vec<SubEventDto>,
}

impl From<SquadEntity> for SquadView {
    fn from(squad: SquadEntity) -> Self {
        Self {
            side: squad.side,
            starting: squad.starting.into_iter().map(Into::into).collect(),
            bench: squad.bench.into_iter().map(Into::into).collect(),
            sub_events: squad.sub_events.into_iter().map(Into::into).collect(),
        }
    }
}

/// Both squads of a fixture.
#[derive(Debug, Serialize, ToSchema)]
pub struct SquadsResponse {
    pub home: SquadView,
    pub away: SquadView,
}

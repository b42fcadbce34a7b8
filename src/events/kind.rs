//! Closed catalogue of event categories and their enumerated event types.
//!
//! On the wire an event carries two fields, `eventCategory` and `eventType`.
//! Internally the pair is modelled as [`EventKind`], a tagged union whose
//! variants carry the per-category type so every consumer can match
//! exhaustively instead of comparing free-text labels.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Version of the event type catalogue below. Bump when a label is added.
pub const CATALOGUE_VERSION: u16 = 1;

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every type of this category, in catalogue order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire label of this type.
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Resolve a wire label, matching exactly.
            pub fn from_label(label: &str) -> Option<Self> {
                match label {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

labelled_enum! {
    /// Shot outcomes recorded under the `Scoring` category.
    ScoringType {
        /// Ball in the net, worth three points.
        Goal => "Goal",
        /// Ball over the bar, worth one point.
        Point => "Point",
        /// Shot that missed the target.
        Wide => "Wide",
        FreeConverted => "Free Converted",
        FreeMissed => "Free Missed",
        /// Shot that dropped short into the keeper's hands.
        Short => "Short",
        Saved => "Saved",
        FortyFiveConverted => "45 Converted",
    }
}

labelled_enum! {
    /// Restart (puckout/kickout) results recorded under the `Puckouts` category.
    RestartType {
        WonClean => "Won Clean",
        BrokenWon => "Broken Won",
        Lost => "Lost",
        BrokenLost => "Broken Lost",
    }
}

labelled_enum! {
    /// Possession changes recorded under the `Possession` category.
    PossessionType {
        TurnoverWon => "Turnover Won",
        TurnoverLost => "Turnover Lost",
    }
}

labelled_enum! {
    /// Cards and fouls recorded under the `Discipline` category.
    DisciplineType {
        Yellow => "Yellow",
        Black => "Black",
        Red => "Red",
        FreeConceded => "Free Conceded",
    }
}

labelled_enum! {
    /// Player changes recorded under the `Substitutions` category.
    SubstitutionType {
        Substitution => "Substitution",
        BloodSub => "Blood Sub",
    }
}

labelled_enum! {
    /// Compensating entries recorded under the `Corrections` category.
    CorrectionType {
        /// Voids the event named by the correction's `voids` field.
        Undo => "Undo",
    }
}

/// Closed partition used to route accounting logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum EventCategory {
    Scoring,
    Puckouts,
    Possession,
    Discipline,
    Substitutions,
    Corrections,
}

/// Typed event payload: the category plus its enumerated event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "EventTypeTag", into = "EventTypeTag")]
pub enum EventKind {
    Scoring(ScoringType),
    Puckout(RestartType),
    Possession(PossessionType),
    Discipline(DisciplineType),
    Substitution(SubstitutionType),
    Correction(CorrectionType),
}

/// Running-score counter touched by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreComponent {
    Goal,
    Point,
}

impl EventKind {
    /// Category this kind belongs to.
    pub fn category(self) -> EventCategory {
        match self {
            EventKind::Scoring(_) => EventCategory::Scoring,
            EventKind::Puckout(_) => EventCategory::Puckouts,
            EventKind::Possession(_) => EventCategory::Possession,
            EventKind::Discipline(_) => EventCategory::Discipline,
            EventKind::Substitution(_) => EventCategory::Substitutions,
            EventKind::Correction(_) => EventCategory::Corrections,
        }
    }

    /// Wire label of the event type.
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Scoring(kind) => kind.label(),
            EventKind::Puckout(kind) => kind.label(),
            EventKind::Possession(kind) => kind.label(),
            EventKind::Discipline(kind) => kind.label(),
            EventKind::Substitution(kind) => kind.label(),
            EventKind::Correction(kind) => kind.label(),
        }
    }

    /// Resolve a `(category, label)` pair against the catalogue.
    pub fn parse(category: EventCategory, label: &str) -> Result<Self, UnknownEventType> {
        let kind = match category {
            EventCategory::Scoring => ScoringType::from_label(label).map(EventKind::Scoring),
            EventCategory::Puckouts => RestartType::from_label(label).map(EventKind::Puckout),
            EventCategory::Possession => {
                PossessionType::from_label(label).map(EventKind::Possession)
            }
            EventCategory::Discipline => {
                DisciplineType::from_label(label).map(EventKind::Discipline)
            }
            EventCategory::Substitutions => {
                SubstitutionType::from_label(label).map(EventKind::Substitution)
            }
            EventCategory::Corrections => {
                CorrectionType::from_label(label).map(EventKind::Correction)
            }
        };

        kind.ok_or_else(|| UnknownEventType {
            category,
            label: label.to_owned(),
        })
    }

    /// Running-score counter this kind increments, if any.
    ///
    /// Only goals and points move the live score; every other scoring type is
    /// kept for reporting.
    pub fn score_component(self) -> Option<ScoreComponent> {
        match self {
            EventKind::Scoring(ScoringType::Goal) => Some(ScoreComponent::Goal),
            EventKind::Scoring(ScoringType::Point) => Some(ScoreComponent::Point),
            _ => None,
        }
    }

    /// Whether this is a compensating entry rather than a match occurrence.
    pub fn is_correction(self) -> bool {
        matches!(self, EventKind::Correction(_))
    }
}

/// Error raised when a label is not part of the category's catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event type `{label}` for category {category:?}")]
pub struct UnknownEventType {
    /// Category the label was submitted under.
    pub category: EventCategory,
    /// Rejected label.
    pub label: String,
}

/// Wire representation of [`EventKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeTag {
    pub event_category: EventCategory,
    pub event_type: String,
}

impl TryFrom<EventTypeTag> for EventKind {
    type Error = UnknownEventType;

    fn try_from(tag: EventTypeTag) -> Result<Self, Self::Error> {
        EventKind::parse(tag.event_category, &tag.event_type)
    }
}

impl From<EventKind> for EventTypeTag {
    fn from(kind: EventKind) -> Self {
        Self {
            event_category: kind.category(),
            event_type: kind.label().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_resolves_back_to_its_kind() {
        for kind in ScoringType::ALL {
            assert_eq!(
                EventKind::parse(EventCategory::Scoring, kind.label()),
                Ok(EventKind::Scoring(*kind))
            );
        }
        for kind in RestartType::ALL {
            assert_eq!(
                EventKind::parse(EventCategory::Puckouts, kind.label()),
                Ok(EventKind::Puckout(*kind))
            );
        }
    }

    #[test]
    fn label_under_wrong_category_is_rejected() {
        let err = EventKind::parse(EventCategory::Possession, "Goal").unwrap_err();
        assert_eq!(err.category, EventCategory::Possession);
        assert_eq!(err.label, "Goal");
    }

    #[test]
    fn only_goals_and_points_move_the_score() {
        assert_eq!(
            EventKind::Scoring(ScoringType::Goal).score_component(),
            Some(ScoreComponent::Goal)
        );
        assert_eq!(
            EventKind::Scoring(ScoringType::Point).score_component(),
            Some(ScoreComponent::Point)
        );
        assert_eq!(EventKind::Scoring(ScoringType::Wide).score_component(), None);
        assert_eq!(
            EventKind::Scoring(ScoringType::FreeConverted).score_component(),
            None
        );
        assert_eq!(EventKind::Puckout(RestartType::WonClean).score_component(), None);
    }

    #[test]
    fn wire_tag_uses_category_and_type_fields() {
        let json = serde_json::to_value(EventKind::Possession(PossessionType::TurnoverWon)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"eventCategory": "Possession", "eventType": "Turnover Won"})
        );

        let parsed: Result<EventKind, _> = serde_json::from_value(
            serde_json::json!({"eventCategory": "Scoring", "eventType": "Own Goal"}),
        );
        assert!(parsed.is_err());
    }
}

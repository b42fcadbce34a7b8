//! Category accounting shared by team totals, quarters and benchmarks.

use serde::Serialize;
use utoipa::ToSchema;

use crate::events::{EventKind, MatchEvent, PossessionType, RestartType, ScoringType};

/// Points a goal is worth.
pub const POINTS_PER_GOAL: u32 = 3;

/// Raw counters of one bucket of events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryTally {
    pub goals: u32,
    pub points: u32,
    pub wides: u32,
    pub puckouts_won: u32,
    pub puckouts_lost: u32,
    pub turnovers_won: u32,
    pub turnovers_lost: u32,
    pub events: u32,
}

impl CategoryTally {
    /// Fold one event into the counters.
    pub fn record(&mut self, event: &MatchEvent) {
        self.events += 1;
        match event.kind {
            EventKind::Scoring(ScoringType::Goal) => self.goals += 1,
            EventKind::Scoring(ScoringType::Point) => self.points += 1,
            EventKind::Scoring(ScoringType::Wide) => self.wides += 1,
            EventKind::Scoring(
                ScoringType::FreeConverted
                | ScoringType::FreeMissed
                | ScoringType::Short
                | ScoringType::Saved
                | ScoringType::FortyFiveConverted,
            ) => {}
            EventKind::Puckout(RestartType::WonClean | RestartType::BrokenWon) => {
                self.puckouts_won += 1
            }
            EventKind::Puckout(RestartType::Lost | RestartType::BrokenLost) => {
                self.puckouts_lost += 1
            }
            EventKind::Possession(PossessionType::TurnoverWon) => self.turnovers_won += 1,
            EventKind::Possession(PossessionType::TurnoverLost) => self.turnovers_lost += 1,
            EventKind::Discipline(_) | EventKind::Substitution(_) | EventKind::Correction(_) => {}
        }
    }

    /// `goals*3 + points`.
    pub fn total_score(&self) -> u32 {
        self.goals * POINTS_PER_GOAL + self.points
    }

    /// Goals plus points.
    pub fn scores(&self) -> u32 {
        self.goals + self.points
    }

    /// Points scored over points available from every attempt, 0 without attempts.
    pub fn conversion_rate(&self) -> f64 {
        let attempts = self.goals + self.points + self.wides;
        if attempts == 0 {
            return 0.0;
        }
        f64::from(self.total_score()) / f64::from(attempts * POINTS_PER_GOAL)
    }

    /// Share of restarts won, 0 without restarts.
    pub fn puckout_win_percentage(&self) -> f64 {
        let total = self.puckouts_won + self.puckouts_lost;
        if total == 0 {
            return 0.0;
        }
        f64::from(self.puckouts_won) / f64::from(total)
    }

    pub fn turnover_differential(&self) -> i64 {
        i64::from(self.turnovers_won) - i64::from(self.turnovers_lost)
    }
}

impl std::ops::AddAssign for CategoryTally {
    fn add_assign(&mut self, rhs: Self) {
        self.goals += rhs.goals;
        self.points += rhs.points;
        self.wides += rhs.wides;
        self.puckouts_won += rhs.puckouts_won;
        self.puckouts_lost += rhs.puckouts_lost;
        self.turnovers_won += rhs.turnovers_won;
        self.turnovers_lost += rhs.turnovers_lost;
        self.events += rhs.events;
    }
}

/// Serialised view of a [`CategoryTally`] including derived ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamTotals {
    pub goals: u32,
    pub points: u32,
    pub wides: u32,
    pub total_score: u32,
    /// Fraction in `[0, 1]`.
    pub conversion_rate: f64,
    pub puckouts_won: u32,
    pub puckouts_lost: u32,
    /// Fraction in `[0, 1]`.
    pub puckout_win_percentage: f64,
    pub turnovers_won: u32,
    pub turnovers_lost: u32,
    pub turnover_differential: i64,
    pub total_events: u32,
}

impl From<&CategoryTally> for TeamTotals {
    fn from(tally: &CategoryTally) -> Self {
        Self {
            goals: tally.goals,
            points: tally.points,
            wides: tally.wides,
            total_score: tally.total_score(),
            conversion_rate: tally.conversion_rate(),
            puckouts_won: tally.puckouts_won,
            puckouts_lost: tally.puckouts_lost,
            puckout_win_percentage: tally.puckout_win_percentage(),
            turnovers_won: tally.turnovers_won,
            turnovers_lost: tally.turnovers_lost,
            turnover_differential: tally.turnover_differential(),
            total_events: tally.events,
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::events::{DisciplineType, Half, Side};

    fn tally_of(kinds: &[EventKind]) -> CategoryTally {
        let fixture_id = Uuid::new_v4();
        let mut tally = CategoryTally::default();
        for (i, kind) in kinds.iter().enumerate() {
            tally.record(&MatchEvent::new(
                fixture_id,
                Side::Home,
                Half::H1,
                i as u32,
                *kind,
            ));
        }
        tally
    }

    #[test]
    fn empty_tally_has_zero_ratios() {
        let tally = CategoryTally::default();
        assert_eq!(tally.conversion_rate(), 0.0);
        assert_eq!(tally.puckout_win_percentage(), 0.0);
        assert_eq!(tally.turnover_differential(), 0);
    }

    #[test]
    fn conversion_rate_weights_goals() {
        let tally = tally_of(&[
            EventKind::Scoring(ScoringType::Goal),
            EventKind::Scoring(ScoringType::Point),
            EventKind::Scoring(ScoringType::Wide),
        ]);
        assert_eq!(tally.total_score(), 4);
        assert!((tally.conversion_rate() - 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn conversion_rate_never_exceeds_one() {
        let tally = tally_of(&[
            EventKind::Scoring(ScoringType::Goal),
            EventKind::Scoring(ScoringType::Goal),
        ]);
        assert_eq!(tally.conversion_rate(), 1.0);
    }

    #[test]
    fn restarts_and_turnovers() {
        let tally = tally_of(&[
            EventKind::Puckout(RestartType::WonClean),
            EventKind::Puckout(RestartType::BrokenWon),
            EventKind::Puckout(RestartType::BrokenLost),
            EventKind::Possession(PossessionType::TurnoverLost),
            EventKind::Possession(PossessionType::TurnoverLost),
            EventKind::Discipline(DisciplineType::Yellow),
        ]);
        assert!((tally.puckout_win_percentage() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(tally.turnover_differential(), -2);
        assert_eq!(tally.events, 6);
    }
}

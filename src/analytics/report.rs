//! Fold of a canonical event log into a [`MatchReport`].

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::tally::{CategoryTally, TeamTotals};
use crate::{
    dao::models::SquadEntity,
    events::{
        DisciplineType, EventKind, MatchEvent, PossessionType, RestartType,
        ScoringType, Side,
    },
};

/// Number of equal segments a match is split into for breakdowns.
pub const QUARTERS: u8 = 4;

/// Display data of a squad player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub name: String,
    pub jersey_number: Option<u8>,
}

/// Player lookup used to label report rows.
#[derive(Debug, Clone, Default)]
pub struct PlayerDirectory {
    players: HashMap<String, PlayerInfo>,
}

impl PlayerDirectory {
    /// Directory of every player listed on the given squads.
    pub fn from_squads<'a>(squads: impl IntoIterator<Item = &'a SquadEntity>) -> Self {
        let players = squads
            .into_iter()
            .flat_map(SquadEntity::players)
            .map(|slot| {
                (
                    slot.player_id.clone(),
                    PlayerInfo {
                        name: slot.name.clone(),
                        jersey_number: Some(slot.jersey_number),
                    },
                )
            })
            .collect();
        Self { players }
    }

    pub fn insert(&mut self, player_id: impl Into<String>, info: PlayerInfo) {
        self.players.insert(player_id.into(), info);
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerInfo> {
        self.players.get(player_id)
    }
}

/// Per-player row of a report.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerContribution {
    pub player_id: String,
    /// Squad name, or the id when the player is not on a squad.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jersey_number: Option<u8>,
    pub contributions: u32,
    pub goals: u32,
    pub points: u32,
    pub wides: u32,
    pub puckouts_won: u32,
    pub puckouts_lost: u32,
    pub turnovers_won: u32,
    pub turnovers_lost: u32,
    pub yellow_cards: u32,
    pub black_cards: u32,
    pub red_cards: u32,
    /// `contributions / total events of the side`.
    pub efficiency: f64,
}

impl PlayerContribution {
    fn new(player_id: &str, directory: &PlayerDirectory) -> Self {
        let info = directory.get(player_id);
        Self {
            player_id: player_id.to_owned(),
            name: info
                .map(|info| info.name.clone())
                .unwrap_or_else(|| player_id.to_owned()),
            jersey_number: info.and_then(|info| info.jersey_number),
            contributions: 0,
            goals: 0,
            points: 0,
            wides: 0,
            puckouts_won: 0,
            puckouts_lost: 0,
            turnovers_won: 0,
            turnovers_lost: 0,
            yellow_cards: 0,
            black_cards: 0,
            red_cards: 0,
            efficiency: 0.0,
        }
    }

    fn record(&mut self, kind: EventKind) {
        self.contributions += 1;
        match kind {
            EventKind::Scoring(ScoringType::Goal) => self.goals += 1,
            EventKind::Scoring(ScoringType::Point) => self.points += 1,
            EventKind::Scoring(ScoringType::Wide) => self.wides += 1,
            EventKind::Scoring(_) => {}
            EventKind::Puckout(RestartType::WonClean | RestartType::BrokenWon) => {
                self.puckouts_won += 1
            }
            EventKind::Puckout(RestartType::Lost | RestartType::BrokenLost) => {
                self.puckouts_lost += 1
            }
            EventKind::Possession(PossessionType::TurnoverWon) => self.turnovers_won += 1,
            EventKind::Possession(PossessionType::TurnoverLost) => self.turnovers_lost += 1,
            EventKind::Discipline(DisciplineType::Yellow) => self.yellow_cards += 1,
            EventKind::Discipline(DisciplineType::Black) => self.black_cards += 1,
            EventKind::Discipline(DisciplineType::Red) => self.red_cards += 1,
            EventKind::Discipline(DisciplineType::FreeConceded) => {}
            EventKind::Substitution(_) | EventKind::Correction(_) => {}
        }
    }
}

/// Totals of one quarter.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuarterBreakdown {
    /// 1-based quarter index.
    pub quarter: u8,
    pub totals: TeamTotals,
}

/// Shot attempts from one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShotZone {
    pub zone: String,
    pub attempts: u32,
    /// Goals and points.
    pub successful: u32,
}

/// Restarts landing in one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestartZone {
    pub zone: String,
    pub attempts: u32,
    pub won: u32,
}

/// Derived statistics of one side of a fixture.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub fixture_id: Uuid,
    /// Side the player, quarter and heatmap sections describe.
    pub side: Side,
    pub total_events: u32,
    pub team_totals: TeamTotals,
    pub opponent_totals: TeamTotals,
    /// Ranked by contributions, ties in order of first appearance.
    pub players: Vec<PlayerContribution>,
    pub quarters: Vec<QuarterBreakdown>,
    pub shot_heatmap: Vec<ShotZone>,
    pub restart_heatmap: Vec<RestartZone>,
}

/// Quarter of an event stamped `timestamp` in a match lasting `total_seconds`.
pub fn quarter_of(timestamp: u32, total_seconds: u32) -> u8 {
    let quarter_length = f64::from(total_seconds.max(1)) / f64::from(QUARTERS);
    let index = (f64::from(timestamp) / quarter_length).floor() as u64 + 1;
    index.clamp(1, u64::from(QUARTERS)) as u8
}

/// Team tally of `side` over a canonical log.
pub fn side_tally<'a>(events: impl IntoIterator<Item = &'a MatchEvent>, side: Side) -> CategoryTally {
    let mut tally = CategoryTally::default();
    for event in events.into_iter().filter(|event| event.side == side) {
        tally.record(event);
    }
    tally
}

/// Build the report of `side` from a canonical event log.
///
/// The log is re-sorted by timestamp, so arrival order never matters.
pub fn build_report(
    fixture_id: Uuid,
    side: Side,
    total_match_seconds: u32,
    events: &[MatchEvent],
    directory: &PlayerDirectory,
) -> MatchReport {
    let mut ordered: Vec<&MatchEvent> = events.iter().collect();
    ordered.sort_by_key(|event| event.timestamp);

    let mut team = CategoryTally::default();
    let mut opponent = CategoryTally::default();
    let mut quarters = [CategoryTally::default(); QUARTERS as usize];
    let mut players: IndexMap<&str, PlayerContribution> = IndexMap::new();
    let mut shots: BTreeMap<&str, ShotZone> = BTreeMap::new();
    let mut restarts: BTreeMap<&str, RestartZone> = BTreeMap::new();

    for event in ordered {
        if event.side != side {
            opponent.record(event);
            continue;
        }

        team.record(event);
        let quarter = quarter_of(event.timestamp, total_match_seconds);
        quarters[usize::from(quarter - 1)].record(event);

        if let Some(player_id) = event.player_id.as_deref() {
            players
                .entry(player_id)
                .or_insert_with(|| PlayerContribution::new(player_id, directory))
                .record(event.kind);
        }

        let Some(zone) = event.zone.as_deref() else {
            continue;
        };
        match event.kind {
            EventKind::Scoring(kind) => {
                let cell = shots.entry(zone).or_insert_with(|| ShotZone {
                    zone: zone.to_owned(),
                    attempts: 0,
                    successful: 0,
                });
                cell.attempts += 1;
                if matches!(kind, ScoringType::Goal | ScoringType::Point) {
                    cell.successful += 1;
                }
            }
            EventKind::Puckout(kind) => {
                let cell = restarts.entry(zone).or_insert_with(|| RestartZone {
                    zone: zone.to_owned(),
                    attempts: 0,
                    won: 0,
                });
                cell.attempts += 1;
                if matches!(kind, RestartType::WonClean | RestartType::BrokenWon) {
                    cell.won += 1;
                }
            }
            _ => {}
        }
    }

    let total_events = team.events;
    let mut players: Vec<PlayerContribution> = players
        .into_values()
        .map(|mut row| {
            if total_events > 0 {
                row.efficiency = f64::from(row.contributions) / f64::from(total_events);
            }
            row
        })
        .collect();
    // Stable: ties keep first-appearance order.
    players.sort_by(|a, b| b.contributions.cmp(&a.contributions));

    MatchReport {
        fixture_id,
        side,
        total_events,
        team_totals: TeamTotals::from(&team),
        opponent_totals: TeamTotals::from(&opponent),
        players,
        quarters: quarters
            .iter()
            .zip(1..=QUARTERS)
            .map(|(tally, quarter)| QuarterBreakdown {
                quarter,
                totals: TeamTotals::from(tally),
            })
            .collect(),
        shot_heatmap: shots.into_values().collect(),
        restart_heatmap: restarts.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Half;

    const SEVENTY_MINUTES: u32 = 70 * 60;

    fn event(side: Side, timestamp: u32, kind: EventKind) -> MatchEvent {
        MatchEvent::new(Uuid::nil(), side, Half::H1, timestamp, kind)
    }

    #[test]
    fn empty_log_yields_zero_report() {
        let report = build_report(
            Uuid::nil(),
            Side::Home,
            SEVENTY_MINUTES,
            &[],
            &PlayerDirectory::default(),
        );
        assert_eq!(report.total_events, 0);
        assert_eq!(report.team_totals.total_score, 0);
        assert_eq!(report.team_totals.conversion_rate, 0.0);
        assert!(report.players.is_empty());
        assert_eq!(report.quarters.len(), 4);
    }

    #[test]
    fn goal_point_wide_scenario() {
        let events = vec![
            event(Side::Home, 100, EventKind::Scoring(ScoringType::Goal)).with_player("p1"),
            event(Side::Home, 200, EventKind::Scoring(ScoringType::Point)).with_player("p2"),
            event(Side::Home, 300, EventKind::Scoring(ScoringType::Wide)),
        ];
        let report = build_report(
            Uuid::nil(),
            Side::Home,
            SEVENTY_MINUTES,
            &events,
            &PlayerDirectory::default(),
        );

        let totals = report.team_totals;
        assert_eq!((totals.goals, totals.points, totals.wides), (1, 1, 1));
        assert_eq!(totals.total_score, 4);
        assert!((totals.conversion_rate - 4.0 / 9.0).abs() < 1e-12);

        let q1 = &report.quarters[0].totals;
        assert_eq!((q1.goals, q1.points, q1.wides), (1, 1, 1));
        assert!(report.quarters[1..].iter().all(|q| q.totals.total_events == 0));
    }

    #[test]
    fn quarter_index_is_clamped() {
        assert_eq!(quarter_of(0, SEVENTY_MINUTES), 1);
        assert_eq!(quarter_of(1049, SEVENTY_MINUTES), 1);
        assert_eq!(quarter_of(1050, SEVENTY_MINUTES), 2);
        assert_eq!(quarter_of(4199, SEVENTY_MINUTES), 4);
        assert_eq!(quarter_of(9000, SEVENTY_MINUTES), 4);
        assert_eq!(quarter_of(10, 0), 4);
    }

    #[test]
    fn quarter_tallies_sum_to_team_totals() {
        let kinds = [
            EventKind::Scoring(ScoringType::Point),
            EventKind::Scoring(ScoringType::Wide),
            EventKind::Puckout(RestartType::WonClean),
            EventKind::Possession(PossessionType::TurnoverLost),
        ];
        let events: Vec<MatchEvent> = (0..40)
            .map(|i| event(Side::Home, i * 137, kinds[i as usize % kinds.len()]))
            .collect();
        let report = build_report(
            Uuid::nil(),
            Side::Home,
            SEVENTY_MINUTES,
            &events,
            &PlayerDirectory::default(),
        );

        let sum = |f: fn(&TeamTotals) -> u32| -> u32 {
            report.quarters.iter().map(|q| f(&q.totals)).sum()
        };
        assert_eq!(sum(|t| t.points), report.team_totals.points);
        assert_eq!(sum(|t| t.wides), report.team_totals.wides);
        assert_eq!(sum(|t| t.puckouts_won), report.team_totals.puckouts_won);
        assert_eq!(sum(|t| t.turnovers_lost), report.team_totals.turnovers_lost);
        assert_eq!(sum(|t| t.total_events), report.total_events);
    }

    #[test]
    fn players_ranked_by_contributions_with_stable_ties() {
        let mut directory = PlayerDirectory::default();
        directory.insert(
            "p2",
            PlayerInfo {
                name: "Second".into(),
                jersey_number: Some(2),
            },
        );
        let events = vec![
            event(Side::Home, 10, EventKind::Scoring(ScoringType::Point)).with_player("p1"),
            event(Side::Home, 20, EventKind::Scoring(ScoringType::Point)).with_player("p2"),
            event(Side::Home, 30, EventKind::Discipline(DisciplineType::Yellow))
                .with_player("p3"),
            event(Side::Home, 40, EventKind::Scoring(ScoringType::Goal)).with_player("p3"),
            event(Side::Away, 50, EventKind::Scoring(ScoringType::Goal)).with_player("x9"),
        ];
        let report = build_report(Uuid::nil(), Side::Home, SEVENTY_MINUTES, &events, &directory);

        let order: Vec<&str> = report.players.iter().map(|p| p.player_id.as_str()).collect();
        assert_eq!(order, vec!["p3", "p1", "p2"]);
        assert_eq!(report.players[0].yellow_cards, 1);
        assert_eq!(report.players[0].efficiency, 0.5);
        assert_eq!(report.players[1].name, "p1");
        assert_eq!(report.players[2].name, "Second");
        assert_eq!(report.opponent_totals.goals, 1);
    }

    #[test]
    fn arrival_order_does_not_change_the_report() {
        let events = vec![
            event(Side::Home, 3000, EventKind::Scoring(ScoringType::Goal)).with_player("late"),
            event(Side::Home, 10, EventKind::Scoring(ScoringType::Goal)).with_player("early"),
        ];
        let mut reversed = events.clone();
        reversed.reverse();

        let a = build_report(Uuid::nil(), Side::Home, SEVENTY_MINUTES, &events, &PlayerDirectory::default());
        let b = build_report(Uuid::nil(), Side::Home, SEVENTY_MINUTES, &reversed, &PlayerDirectory::default());
        assert_eq!(a, b);
        assert_eq!(a.players[0].player_id, "early");
    }

    #[test]
    fn heatmaps_bucket_by_zone() {
        let events = vec![
            event(Side::Home, 1, EventKind::Scoring(ScoringType::Goal)).with_zone("D-left"),
            event(Side::Home, 2, EventKind::Scoring(ScoringType::Wide)).with_zone("D-left"),
            event(Side::Home, 3, EventKind::Scoring(ScoringType::Point)).with_zone("45-centre"),
            event(Side::Home, 4, EventKind::Puckout(RestartType::BrokenWon)).with_zone("wing"),
            event(Side::Home, 5, EventKind::Puckout(RestartType::Lost)).with_zone("wing"),
            event(Side::Home, 6, EventKind::Possession(PossessionType::TurnoverWon))
                .with_zone("wing"),
            event(Side::Home, 7, EventKind::Scoring(ScoringType::Wide)),
        ];
        let report = build_report(
            Uuid::nil(),
            Side::Home,
            SEVENTY_MINUTES,
            &events,
            &PlayerDirectory::default(),
        );

        assert_eq!(
            report.shot_heatmap,
            vec![
                ShotZone {
                    zone: "45-centre".into(),
                    attempts: 1,
                    successful: 1
                },
                ShotZone {
                    zone: "D-left".into(),
                    attempts: 2,
                    successful: 1
                },
            ]
        );
        assert_eq!(
            report.restart_heatmap,
            vec![RestartZone {
                zone: "wing".into(),
                attempts: 2,
                won: 1
            }]
        );
    }
}

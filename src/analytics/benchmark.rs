//! Comparison of one team's match against the average of its
//! `(competition, season)` bucket.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::tally::CategoryTally;
use crate::events::Side;

/// Limits beyond which a variance is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct BenchmarkThresholds {
    /// Allowed swing of the restart win rate, as a fraction.
    pub restart_swing: f64,
    /// Wides allowed above scores before flagging.
    pub wide_excess: u32,
    /// Allowed shortfall of the turnover differential below the mean.
    pub turnover_shortfall: f64,
    /// Allowed shortfall of the conversion rate below the mean, as a fraction.
    pub conversion_shortfall: f64,
}

impl Default for BenchmarkThresholds {
    fn default() -> Self {
        Self {
            restart_swing: 0.10,
            wide_excess: 2,
            turnover_shortfall: 3.0,
            conversion_shortfall: 0.10,
        }
    }
}

/// Compared statistics of one team in one match.
///
/// A rate is `None` when its denominator is empty: no shots for the
/// conversion rate, no restarts for the puckout win percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatLine {
    pub total_score: f64,
    pub scores: f64,
    pub wides: f64,
    pub conversion_rate: Option<f64>,
    pub puckout_win_percentage: Option<f64>,
    pub turnover_differential: f64,
}

impl From<&CategoryTally> for StatLine {
    fn from(tally: &CategoryTally) -> Self {
        let attempts = tally.scores() + tally.wides;
        let restarts = tally.puckouts_won + tally.puckouts_lost;
        Self {
            total_score: f64::from(tally.total_score()),
            scores: f64::from(tally.scores()),
            wides: f64::from(tally.wides),
            conversion_rate: (attempts > 0).then(|| tally.conversion_rate()),
            puckout_win_percentage: (restarts > 0).then(|| tally.puckout_win_percentage()),
            turnover_differential: tally.turnover_differential() as f64,
        }
    }
}

impl StatLine {
    /// Field-wise mean, `None` for an empty sample.
    ///
    /// Rates are averaged over the lines that carry one; a rate no line
    /// carries stays `None`.
    pub fn mean(lines: &[StatLine]) -> Option<StatLine> {
        if lines.is_empty() {
            return None;
        }
        let n = lines.len() as f64;
        let average = |field: fn(&StatLine) -> f64| lines.iter().map(field).sum::<f64>() / n;
        Some(StatLine {
            total_score: average(|line| line.total_score),
            scores: average(|line| line.scores),
            wides: average(|line| line.wides),
            conversion_rate: rate_mean(lines.iter().map(|line| line.conversion_rate)),
            puckout_win_percentage: rate_mean(lines.iter().map(|line| line.puckout_win_percentage)),
            turnover_differential: average(|line| line.turnover_differential),
        })
    }

    /// Signed `self - baseline`, field by field. A rate difference is
    /// `None` unless both sides carry the rate.
    pub fn minus(&self, baseline: &StatLine) -> StatLine {
        StatLine {
            total_score: self.total_score - baseline.total_score,
            scores: self.scores - baseline.scores,
            wides: self.wides - baseline.wides,
            conversion_rate: rate_diff(self.conversion_rate, baseline.conversion_rate),
            puckout_win_percentage: rate_diff(
                self.puckout_win_percentage,
                baseline.puckout_win_percentage,
            ),
            turnover_differential: self.turnover_differential - baseline.turnover_differential,
        }
    }
}

fn rate_mean(rates: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = rates
        .flatten()
        .fold((0.0, 0u32), |(sum, count), rate| (sum + rate, count + 1));
    (count > 0).then(|| sum / f64::from(count))
}

fn rate_diff(value: Option<f64>, baseline: Option<f64>) -> Option<f64> {
    Some(value? - baseline?)
}

/// Threshold breach raised by the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(tag = "flag", rename_all = "camelCase")]
pub enum BenchmarkFlag {
    /// Restart win rate moved beyond the allowed swing, in either direction.
    RestartSwing { variance: f64 },
    /// Wides exceeded scores by more than the allowed excess.
    WideExcess { wides: u32, scores: u32 },
    /// Turnover differential fell below the mean by more than allowed.
    TurnoverShortfall { variance: f64 },
    /// Conversion rate fell below the mean by more than allowed.
    ConversionShortfall { variance: f64 },
}

/// Fixture-versus-bucket comparison for one side.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkComparison {
    pub fixture_id: Uuid,
    pub side: Side,
    pub competition: String,
    pub season: String,
    /// Number of team performances in the bucket mean.
    pub sample_size: u32,
    pub fixture: StatLine,
    /// Absent when no other fixture of the bucket has events.
    pub bucket_mean: Option<StatLine>,
    /// `fixture - bucketMean`, absent with the mean.
    pub variance: Option<StatLine>,
    pub flags: Vec<BenchmarkFlag>,
}

/// Identity of the compared team performance.
#[derive(Debug, Clone)]
pub struct BenchmarkSubject {
    pub fixture_id: Uuid,
    pub side: Side,
    pub competition: String,
    pub season: String,
}

/// Compare `tally` against the mean of `others`.
pub fn compare(
    subject: BenchmarkSubject,
    tally: &CategoryTally,
    others: &[StatLine],
    thresholds: &BenchmarkThresholds,
) -> BenchmarkComparison {
    let fixture = StatLine::from(tally);
    let bucket_mean = StatLine::mean(others);
    let variance = bucket_mean.as_ref().map(|mean| fixture.minus(mean));

    let mut flags = Vec::new();
    if let Some(swing) = variance.and_then(|v| v.puckout_win_percentage) {
        if swing.abs() > thresholds.restart_swing {
            flags.push(BenchmarkFlag::RestartSwing { variance: swing });
        }
    }
    if tally.wides > tally.scores() + thresholds.wide_excess {
        flags.push(BenchmarkFlag::WideExcess {
            wides: tally.wides,
            scores: tally.scores(),
        });
    }
    if let Some(variance) = &variance {
        if variance.turnover_differential < -thresholds.turnover_shortfall {
            flags.push(BenchmarkFlag::TurnoverShortfall {
                variance: variance.turnover_differential,
            });
        }
        if let Some(conversion) = variance.conversion_rate {
            if conversion < -thresholds.conversion_shortfall {
                flags.push(BenchmarkFlag::ConversionShortfall {
                    variance: conversion,
                });
            }
        }
    }

    BenchmarkComparison {
        fixture_id: subject.fixture_id,
        side: subject.side,
        competition: subject.competition,
        season: subject.season,
        sample_size: others.len() as u32,
        fixture,
        bucket_mean,
        variance,
        flags,
    }
}

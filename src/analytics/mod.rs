//! Derived statistics: pure folds over a canonical event log.

pub mod benchmark;
pub mod report;
pub mod tally;

pub use self::benchmark::{BenchmarkComparison, BenchmarkThresholds, compare};
pub use self::report::{MatchReport, PlayerDirectory, build_report};
pub use self::tally::{CategoryTally, TeamTotals};

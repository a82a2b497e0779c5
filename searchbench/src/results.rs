//! Benchmark result types: timing samples, the result grid and its rankings.
//!
//! The grid is keyed by (algorithm, text, pattern kind). Rankings are derived
//! from it once every cell has an outcome. All comparisons use `Duration`;
//! `format_duration` is for display only.
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::corpus::{PatternKind, Scenario};
use crate::errors::{SearchError, SearchResult};
use crate::search::Algorithm;

fn as_nanos<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
}

fn as_nanos_opt<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => as_nanos(d, s),
        None => s.serialize_none(),
    }
}

/// Identifies a column of the grid
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ColumnKey {
    pub text_id: String,
    pub kind: PatternKind,
}

impl ColumnKey {
    pub fn new(text_id: impl Into<String>, kind: PatternKind) -> Self {
        Self {
            text_id: text_id.into(),
            kind,
        }
    }
}

impl From<&Scenario> for ColumnKey {
    fn from(scenario: &Scenario) -> Self {
        Self::new(scenario.text_id.clone(), scenario.kind)
    }
}

/// Identifies one cell of the grid
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CellKey {
    pub algorithm: Algorithm,
    pub column: ColumnKey,
}

/// One timed invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimingSample {
    pub algorithm: Algorithm,
    pub text_id: String,
    pub kind: PatternKind,
    pub repetition: usize,
    #[serde(rename = "duration_ns", serialize_with = "as_nanos")]
    pub duration: Duration,
}

/// Aggregated measurement of a successful cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellStats {
    #[serde(rename = "duration_ns", serialize_with = "as_nanos")]
    pub duration: Duration,
    #[serde(rename = "std_dev_ns", serialize_with = "as_nanos")]
    pub std_dev: Duration,
    pub samples: usize,
    pub match_count: usize,
}

/// What happened when a cell was measured
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CellOutcome {
    Measured(CellStats),
    Failed { error: String },
}

impl CellOutcome {
    pub fn duration(&self) -> Option<Duration> {
        match self {
            CellOutcome::Measured(stats) => Some(stats.duration),
            CellOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CellOutcome::Failed { .. })
    }
}

/// Grid of cell outcomes, one row per algorithm and one column per scenario
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultGrid {
    algorithms: Vec<Algorithm>,
    columns: Vec<ColumnKey>,
    #[serde(serialize_with = "serialize_cells")]
    cells: BTreeMap<CellKey, CellOutcome>,
}

#[derive(Serialize)]
struct CellRecord<'a> {
    algorithm: Algorithm,
    text_id: &'a str,
    kind: PatternKind,
    #[serde(flatten)]
    outcome: &'a CellOutcome,
}

fn serialize_cells<S: Serializer>(
    cells: &BTreeMap<CellKey, CellOutcome>,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.collect_seq(cells.iter().map(|(key, outcome)| CellRecord {
        algorithm: key.algorithm,
        text_id: &key.column.text_id,
        kind: key.column.kind,
        outcome,
    }))
}

impl ResultGrid {
    /// Creates an empty grid with the given row and column order
    pub fn new(algorithms: Vec<Algorithm>, columns: Vec<ColumnKey>) -> Self {
        Self {
            algorithms,
            columns,
            cells: BTreeMap::new(),
        }
    }

    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    /// Records the outcome of a cell, replacing any previous one
    pub fn record(&mut self, algorithm: Algorithm, column: ColumnKey, outcome: CellOutcome) {
        self.cells.insert(CellKey { algorithm, column }, outcome);
    }

    pub fn get(&self, algorithm: Algorithm, column: &ColumnKey) -> Option<&CellOutcome> {
        self.cells.get(&CellKey {
            algorithm,
            column: column.clone(),
        })
    }

    /// Number of (algorithm, column) pairs without an outcome
    pub fn missing(&self) -> usize {
        self.algorithms
            .iter()
            .flat_map(|&a| self.columns.iter().map(move |c| (a, c)))
            .filter(|(a, c)| self.get(*a, c).is_none())
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.missing() == 0
    }

    pub fn failed_cells(&self) -> usize {
        self.cells.values().filter(|o| o.is_failed()).count()
    }

    /// Mean of an algorithm's successful cells; failed cells are left out
    pub fn overall(&self, algorithm: Algorithm) -> Option<Duration> {
        let durations: Vec<Duration> = self
            .columns
            .iter()
            .filter_map(|c| self.get(algorithm, c).and_then(CellOutcome::duration))
            .collect();
        if durations.is_empty() {
            return None;
        }
        let total: Duration = durations.iter().sum();
        Some(total / durations.len() as u32)
    }

    /// Derives per-column winners and the overall winner.
    ///
    /// Every cell must have an outcome. Ties go to the algorithm declared first.
    pub fn rank(&self) -> SearchResult<Rankings> {
        let missing = self.missing();
        if missing > 0 {
            return Err(SearchError::IncompleteGrid { missing });
        }

        let fastest_per_column = self
            .columns
            .iter()
            .map(|column| {
                let winner = self.fastest(|a| self.get(a, column).and_then(CellOutcome::duration));
                ColumnWinner {
                    column: column.clone(),
                    winner,
                }
            })
            .collect();

        let overall: Vec<OverallEntry> = self
            .ordered_algorithms()
            .into_iter()
            .map(|algorithm| OverallEntry {
                algorithm,
                mean: self.overall(algorithm),
            })
            .collect();

        let fastest_overall = self.fastest(|a| self.overall(a));

        Ok(Rankings {
            fastest_per_column,
            overall,
            fastest_overall,
        })
    }

    fn ordered_algorithms(&self) -> Vec<Algorithm> {
        let mut algorithms = self.algorithms.clone();
        algorithms.sort();
        algorithms
    }

    fn fastest(&self, duration_of: impl Fn(Algorithm) -> Option<Duration>) -> Option<Winner> {
        let mut best: Option<Winner> = None;
        for algorithm in self.ordered_algorithms() {
            if let Some(duration) = duration_of(algorithm) {
                // Strict comparison keeps the earlier algorithm on ties
                if best.as_ref().map_or(true, |b| duration < b.duration) {
                    best = Some(Winner {
                        algorithm,
                        duration,
                    });
                }
            }
        }
        best
    }
}

/// The fastest algorithm for some selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Winner {
    pub algorithm: Algorithm,
    #[serde(rename = "duration_ns", serialize_with = "as_nanos")]
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnWinner {
    pub column: ColumnKey,
    /// `None` when every algorithm failed on this column
    pub winner: Option<Winner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallEntry {
    pub algorithm: Algorithm,
    #[serde(rename = "mean_ns", serialize_with = "as_nanos_opt")]
    pub mean: Option<Duration>,
}

/// Rankings derived from a complete grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rankings {
    pub fastest_per_column: Vec<ColumnWinner>,
    pub overall: Vec<OverallEntry>,
    pub fastest_overall: Option<Winner>,
}

impl Rankings {
    pub fn winner_for(&self, column: &ColumnKey) -> Option<Winner> {
        self.fastest_per_column
            .iter()
            .find(|c| &c.column == column)
            .and_then(|c| c.winner)
    }

    /// The algorithm that won every column of `kind`, if a single one did
    pub fn consistent_winner(&self, kind: PatternKind) -> Option<Algorithm> {
        let mut winners = self
            .fastest_per_column
            .iter()
            .filter(|c| c.column.kind == kind)
            .map(|c| c.winner.map(|w| w.algorithm));
        let first = winners.next()??;
        winners
            .all(|w| w == Some(first))
            .then_some(first)
    }
}

/// Formats a duration in the most legible unit with four decimals
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 1e-6 {
        format!("{:.4} ns", secs * 1e9)
    } else if secs < 1e-3 {
        format!("{:.4} µs", secs * 1e6)
    } else if secs < 1.0 {
        format!("{:.4} ms", secs * 1e3)
    } else {
        format!("{:.4} s", secs)
    }
}

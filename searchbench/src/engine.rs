use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{BenchConfig, PreprocessingPolicy, Statistic};
use crate::corpus::{PatternKind, Scenario, Text, TextSource};
use crate::errors::{SearchError, SearchResult};
use crate::harness::{measure, BenchContext};
use crate::metrics::RunStats;
use crate::results::{CellOutcome, ColumnKey, Rankings, ResultGrid};
use crate::search::{search_with_params, Algorithm, MatchResult, RollingHashParams};

fn as_nanos<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
}

/// Settings a report was produced with
#[derive(Debug, Clone, Serialize)]
pub struct ReportSettings {
    pub warmup_iterations: usize,
    pub repetitions: usize,
    pub statistic: Statistic,
    pub preprocessing: PreprocessingPolicy,
    pub rolling_hash: RollingHashParams,
    pub time_budget: String,
    pub verify_equivalence: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextSummary {
    pub name: String,
    pub bytes: usize,
    /// Why the text could not be loaded; its cells are all failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Structured result of a benchmark run, ready for a renderer
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub settings: ReportSettings,
    pub texts: Vec<TextSummary>,
    pub scenarios: Vec<Scenario>,
    pub grid: ResultGrid,
    pub rankings: Rankings,
    pub stats: RunStats,
    #[serde(rename = "elapsed_ns", serialize_with = "as_nanos")]
    pub elapsed: Duration,
}

impl BenchmarkReport {
    pub fn scenario(&self, column: &ColumnKey) -> Option<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.text_id == column.text_id && s.kind == column.kind)
    }
}

/// Runs every configured algorithm against every scenario
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    config: BenchConfig,
    show_progress: bool,
}

impl BenchmarkRunner {
    pub fn new(config: BenchConfig) -> Self {
        Self {
            config,
            show_progress: false,
        }
    }

    /// Draws a progress bar on stderr while cells are measured
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn run(&self, corpus: &dyn TextSource) -> SearchResult<BenchmarkReport> {
        let config = &self.config;
        config.validate()?;
        let run_started = Instant::now();
        info!(
            "Starting benchmark: {} text(s), algorithms {:?}, {} repetition(s)",
            config.texts.len(),
            config.algorithms,
            config.repetitions
        );

        let scenarios: Vec<Scenario> = config.texts.iter().flat_map(Scenario::from_spec).collect();
        let columns: Vec<ColumnKey> = scenarios.iter().map(ColumnKey::from).collect();
        let mut grid = ResultGrid::new(config.algorithms.clone(), columns);

        let ctx = BenchContext::from_config(config)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.verify_threads.get())
            .build()
            .map_err(|e| SearchError::config_error(format!("verification pool: {}", e)))?;

        let progress = self.progress_bar((scenarios.len() * config.algorithms.len()) as u64);
        let mut texts = Vec::with_capacity(config.texts.len());

        for spec in &config.texts {
            let text = match corpus.load(&spec.name) {
                Ok(text) => {
                    texts.push(TextSummary {
                        name: spec.name.clone(),
                        bytes: text.len(),
                        error: None,
                    });
                    text
                }
                Err(e) => {
                    warn!("Failing all cells of {}: {}", spec.name, e);
                    for scenario in Scenario::from_spec(spec) {
                        self.fail_column(&mut grid, &ctx, &progress, &scenario, &e);
                    }
                    texts.push(TextSummary {
                        name: spec.name.clone(),
                        bytes: 0,
                        error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            for scenario in Scenario::from_spec(spec) {
                let column = ColumnKey::from(&scenario);
                let pattern = scenario.pattern.as_bytes();

                if let Err(e) = ctx.check_budget() {
                    self.fail_column(&mut grid, &ctx, &progress, &scenario, &e);
                    continue;
                }

                if config.verify_equivalence {
                    ctx.metrics().record_verification();
                    let verdict = pool.install(|| {
                        verify_equivalence(
                            &config.algorithms,
                            &text,
                            &scenario,
                            config.rolling_hash,
                        )
                    });
                    if let Err(e) = verdict {
                        warn!("Skipping scenario: {}", e);
                        self.fail_column(&mut grid, &ctx, &progress, &scenario, &e);
                        continue;
                    }
                }

                let mut observed: Option<MatchResult> = None;
                for &algorithm in &config.algorithms {
                    progress.set_message(format!("{} {} {}", algorithm, text.id(), scenario.kind));
                    let outcome = match measure(&ctx, algorithm, &text, scenario.kind, pattern) {
                        Ok(measurement) => {
                            if observed.is_none() {
                                observed = Some(measurement.matches.clone());
                            }
                            CellOutcome::Measured(measurement.to_cell_stats())
                        }
                        Err(e) => {
                            let e = e.in_scenario(algorithm, text.id(), &scenario.pattern);
                            warn!("{}", e);
                            CellOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                    };
                    ctx.metrics().record_cell(outcome.is_failed());
                    grid.record(algorithm, column.clone(), outcome);
                    progress.inc(1);
                }

                if let Some(matches) = observed {
                    check_label(&scenario, &matches);
                }
            }
        }
        progress.finish_and_clear();

        let rankings = grid.rank()?;
        ctx.metrics().log_stats();

        if let Some(winner) = rankings.fastest_overall {
            info!(
                "Benchmark complete in {:?}. Overall fastest: {} ({})",
                run_started.elapsed(),
                winner.algorithm,
                crate::results::format_duration(winner.duration)
            );
        } else {
            warn!("Benchmark complete but no cell was measured successfully");
        }

        Ok(BenchmarkReport {
            settings: ReportSettings {
                warmup_iterations: config.warmup_iterations,
                repetitions: config.repetitions.get(),
                statistic: config.statistic,
                preprocessing: config.preprocessing,
                rolling_hash: config.rolling_hash,
                time_budget: config.time_budget.clone(),
                verify_equivalence: config.verify_equivalence,
            },
            texts,
            scenarios,
            grid,
            rankings,
            stats: ctx.metrics().get_stats(),
            elapsed: run_started.elapsed(),
        })
    }

    /// Records every algorithm's cell in `scenario`'s column as failed with `error`
    fn fail_column(
        &self,
        grid: &mut ResultGrid,
        ctx: &BenchContext,
        progress: &ProgressBar,
        scenario: &Scenario,
        error: &SearchError,
    ) {
        let column = ColumnKey::from(scenario);
        for &algorithm in &self.config.algorithms {
            grid.record(
                algorithm,
                column.clone(),
                CellOutcome::Failed {
                    error: error.scenario_message(algorithm, &scenario.text_id, &scenario.pattern),
                },
            );
            ctx.metrics().record_cell(true);
            progress.inc(1);
        }
    }

    fn progress_bar(&self, cells: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(cells);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} cells {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        progress
    }
}

/// Runs the benchmark described by `config` against `corpus`
pub fn run_benchmark(config: &BenchConfig, corpus: &dyn TextSource) -> SearchResult<BenchmarkReport> {
    BenchmarkRunner::new(config.clone()).run(corpus)
}

/// Checks, untimed and in parallel, that all algorithms report the same offsets.
///
/// Algorithms that fail outright are ignored here; the timed pass records
/// their error against the cell.
pub fn verify_equivalence(
    algorithms: &[Algorithm],
    text: &Text,
    scenario: &Scenario,
    params: RollingHashParams,
) -> SearchResult<()> {
    let results: Vec<(Algorithm, MatchResult)> = algorithms
        .par_iter()
        .filter_map(|&algorithm| {
            search_with_params(algorithm, text.as_bytes(), scenario.pattern.as_bytes(), params)
                .ok()
                .map(|found| (algorithm, found))
        })
        .collect();

    if let Some((reference_algorithm, reference)) = results.first() {
        for (algorithm, found) in &results[1..] {
            if found != reference {
                debug!(
                    "{} found {} match(es), {} found {}",
                    reference_algorithm,
                    reference.len(),
                    algorithm,
                    found.len()
                );
                return Err(SearchError::ResultMismatch {
                    text_id: scenario.text_id.clone(),
                    pattern: scenario.pattern.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_label(scenario: &Scenario, matches: &MatchResult) {
    match (scenario.kind, matches.is_empty()) {
        (PatternKind::Present, true) => warn!(
            "Pattern {:?} is labelled present but does not occur in {}",
            scenario.pattern, scenario.text_id
        ),
        (PatternKind::Absent, false) => warn!(
            "Pattern {:?} is labelled absent but occurs {} time(s) in {}",
            scenario.pattern,
            matches.len(),
            scenario.text_id
        ),
        _ => debug!(
            "Pattern {:?} in {}: {} match(es)",
            scenario.pattern,
            scenario.text_id,
            matches.len()
        ),
    }
}

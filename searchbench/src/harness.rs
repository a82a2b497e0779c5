//! Timing harness.
//!
//! `measure` runs one algorithm against one (text, pattern) pair: a fixed number
//! of untimed warm-up calls, then `repetitions` timed calls, reduced to a single
//! duration by the configured statistic. Only the search call sits inside the
//! timed region; whether table construction is part of that call is decided
//! once per run by the `PreprocessingPolicy`.
//!
//! Run-wide state (settings, counters, the wall-clock budget) lives in a
//! `BenchContext` that callers pass explicitly.
use std::hint::black_box;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::config::{BenchConfig, PreprocessingPolicy, Statistic};
use crate::corpus::{PatternKind, Text};
use crate::errors::{SearchError, SearchResult};
use crate::metrics::RunMetrics;
use crate::results::{CellStats, TimingSample};
use crate::search::{Algorithm, MatchResult, PatternMatcher, RollingHashParams};

// Samples are clamped to the clock's smallest step so a duration is never zero.
const MIN_SAMPLE: Duration = Duration::from_nanos(1);

/// Harness settings shared by every cell of a run
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessSettings {
    pub warmup_iterations: usize,
    pub repetitions: NonZeroUsize,
    pub statistic: Statistic,
    pub trim_fraction: f64,
    pub preprocessing: PreprocessingPolicy,
    pub rolling_hash: RollingHashParams,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self::from_config(&BenchConfig::default())
    }
}

impl HarnessSettings {
    pub fn from_config(config: &BenchConfig) -> Self {
        Self {
            warmup_iterations: config.warmup_iterations,
            repetitions: config.repetitions,
            statistic: config.statistic,
            trim_fraction: config.trim_fraction,
            preprocessing: config.preprocessing,
            rolling_hash: config.rolling_hash,
        }
    }
}

/// Explicit context for one benchmark run
#[derive(Debug, Clone)]
pub struct BenchContext {
    settings: HarnessSettings,
    metrics: RunMetrics,
    started: Instant,
    budget: Duration,
}

impl BenchContext {
    /// Starts the run clock now
    pub fn new(settings: HarnessSettings, budget: Duration) -> Self {
        Self {
            settings,
            metrics: RunMetrics::new(),
            started: Instant::now(),
            budget,
        }
    }

    pub fn from_config(config: &BenchConfig) -> SearchResult<Self> {
        Ok(Self::new(
            HarnessSettings::from_config(config),
            config.time_budget()?,
        ))
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Fails with `MeasurementTimeout` once the run budget is spent
    pub fn check_budget(&self) -> SearchResult<()> {
        let elapsed = self.elapsed();
        if elapsed >= self.budget {
            return Err(SearchError::MeasurementTimeout {
                elapsed,
                budget: self.budget,
            });
        }
        Ok(())
    }
}

/// Result of measuring one cell
#[derive(Debug, Clone)]
pub struct Measurement {
    pub algorithm: Algorithm,
    pub text_id: String,
    pub kind: PatternKind,
    /// Matches of the first timed call
    pub matches: MatchResult,
    pub samples: Vec<TimingSample>,
    /// Samples reduced by the configured statistic
    pub summary: Duration,
    pub std_dev: Duration,
}

impl Measurement {
    pub fn durations(&self) -> Vec<Duration> {
        self.samples.iter().map(|s| s.duration).collect()
    }

    pub fn to_cell_stats(&self) -> CellStats {
        CellStats {
            duration: self.summary,
            std_dev: self.std_dev,
            samples: self.samples.len(),
            match_count: self.matches.len(),
        }
    }
}

/// Measures `algorithm` searching `pattern` in `text`.
///
/// Invalid patterns and hash parameters fail before any timing starts.
pub fn measure(
    ctx: &BenchContext,
    algorithm: Algorithm,
    text: &Text,
    kind: PatternKind,
    pattern: &[u8],
) -> SearchResult<Measurement> {
    let settings = ctx.settings();
    let haystack = text.as_bytes();
    let prepared = PatternMatcher::with_params(algorithm, pattern, settings.rolling_hash)?;

    let run_once = || -> SearchResult<MatchResult> {
        match settings.preprocessing {
            PreprocessingPolicy::Included => {
                PatternMatcher::with_params(algorithm, pattern, settings.rolling_hash)?
                    .find_matches(haystack)
            }
            PreprocessingPolicy::Excluded => prepared.find_matches(haystack),
        }
    };

    trace!(
        "Warming up {} on {} ({} calls)",
        algorithm,
        text.id(),
        settings.warmup_iterations
    );
    for _ in 0..settings.warmup_iterations {
        ctx.check_budget()?;
        black_box(run_once()?);
    }

    let repetitions = settings.repetitions.get();
    let mut samples = Vec::with_capacity(repetitions);
    let mut first: Option<MatchResult> = None;

    for repetition in 0..repetitions {
        ctx.check_budget()?;

        let start = Instant::now();
        let result = black_box(run_once());
        let duration = start.elapsed().max(MIN_SAMPLE);

        let result = result?;
        ctx.metrics().record_search(haystack.len(), result.len());
        samples.push(TimingSample {
            algorithm,
            text_id: text.id().to_string(),
            kind,
            repetition,
            duration,
        });
        if first.is_none() {
            first = Some(result);
        }
    }

    let durations: Vec<Duration> = samples.iter().map(|s| s.duration).collect();
    let summary = summarize(&durations, settings.statistic, settings.trim_fraction);
    let std_dev = std_dev(&durations);

    debug!(
        "{} on {} ({}): {} over {} samples",
        algorithm,
        text.id(),
        kind,
        crate::results::format_duration(summary),
        samples.len()
    );

    Ok(Measurement {
        algorithm,
        text_id: text.id().to_string(),
        kind,
        matches: first.unwrap_or_default(),
        samples,
        summary,
        std_dev,
    })
}

fn mean(durations: &[Duration]) -> Duration {
    if durations.is_empty() {
        return Duration::ZERO;
    }
    let total: u128 = durations.iter().map(Duration::as_nanos).sum();
    nanos(total / durations.len() as u128)
}

fn nanos(n: u128) -> Duration {
    Duration::from_nanos(u64::try_from(n).unwrap_or(u64::MAX))
}

/// Reduces samples to one duration
pub fn summarize(durations: &[Duration], statistic: Statistic, trim_fraction: f64) -> Duration {
    if durations.is_empty() {
        return Duration::ZERO;
    }
    let mut sorted = durations.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();

    match statistic {
        Statistic::Mean => mean(&sorted),
        Statistic::Min => sorted[0],
        Statistic::Median => {
            if n % 2 == 1 {
                sorted[n / 2]
            } else {
                nanos((sorted[n / 2 - 1].as_nanos() + sorted[n / 2].as_nanos()) / 2)
            }
        }
        Statistic::TrimmedMean => {
            let k = (n as f64 * trim_fraction).floor() as usize;
            if 2 * k >= n {
                summarize(&sorted, Statistic::Median, 0.0)
            } else {
                mean(&sorted[k..n - k])
            }
        }
    }
}

/// Sample standard deviation; zero for fewer than two samples
pub fn std_dev(durations: &[Duration]) -> Duration {
    let n = durations.len();
    if n < 2 {
        return Duration::ZERO;
    }
    let values: Vec<f64> = durations.iter().map(|d| d.as_nanos() as f64).collect();
    let avg = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (n - 1) as f64;
    Duration::from_nanos(variance.sqrt().round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&v| Duration::from_nanos(v)).collect()
    }

    fn context(repetitions: usize) -> BenchContext {
        let settings = HarnessSettings {
            warmup_iterations: 1,
            repetitions: NonZeroUsize::new(repetitions).unwrap(),
            ..HarnessSettings::default()
        };
        BenchContext::new(settings, Duration::from_secs(60))
    }

    #[test]
    fn test_summarize() {
        let samples = ns(&[5, 1, 3, 100, 2]);
        assert_eq!(summarize(&samples, Statistic::Mean, 0.0), Duration::from_nanos(22));
        assert_eq!(summarize(&samples, Statistic::Min, 0.0), Duration::from_nanos(1));
        assert_eq!(summarize(&samples, Statistic::Median, 0.0), Duration::from_nanos(3));
        // Drops 1 and 100
        assert_eq!(
            summarize(&samples, Statistic::TrimmedMean, 0.2),
            Duration::from_nanos(3)
        );
        assert_eq!(summarize(&ns(&[4, 2]), Statistic::Median, 0.0), Duration::from_nanos(3));
        assert_eq!(summarize(&[], Statistic::Mean, 0.0), Duration::ZERO);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&ns(&[7])), Duration::ZERO);
        assert_eq!(std_dev(&ns(&[10, 10, 10])), Duration::ZERO);
        assert_eq!(std_dev(&ns(&[2, 4, 4, 4, 5, 5, 7, 9])), Duration::from_nanos(2));
    }

    #[test]
    fn test_absent_pattern_positive_duration() {
        let ctx = context(5);
        let text = Text::new("research", b"research".to_vec());
        for algorithm in Algorithm::ALL {
            let m = measure(&ctx, algorithm, &text, PatternKind::Absent, b"qwerty456notexist")
                .unwrap();
            assert!(m.matches.is_empty());
            assert_eq!(m.samples.len(), 5);
            assert!(m.summary > Duration::ZERO);
            assert!(m.samples.iter().all(|s| s.duration > Duration::ZERO));
        }
    }

    #[test]
    fn test_repetitions_do_not_change_matches() {
        let text = Text::new("fox", b"the quick brown fox jumps over the lazy dog".to_vec());
        for algorithm in Algorithm::ALL {
            let few = measure(&context(1), algorithm, &text, PatternKind::Present, b"the").unwrap();
            let many =
                measure(&context(50), algorithm, &text, PatternKind::Present, b"the").unwrap();
            assert_eq!(few.matches, many.matches);
            assert_eq!(many.matches.offsets(), &[0, 31]);
            assert_eq!(many.samples.len(), 50);
            assert!(many
                .samples
                .iter()
                .enumerate()
                .all(|(i, s)| s.repetition == i && s.text_id == "fox"));
        }
    }

    #[test]
    fn test_preprocessing_policies_agree() {
        let text = Text::new("a", b"aaaaaaaa".to_vec());
        for policy in [PreprocessingPolicy::Included, PreprocessingPolicy::Excluded] {
            let settings = HarnessSettings {
                preprocessing: policy,
                ..HarnessSettings::default()
            };
            let ctx = BenchContext::new(settings, Duration::from_secs(60));
            let m = measure(&ctx, Algorithm::BoyerMoore, &text, PatternKind::Present, b"aa")
                .unwrap();
            assert_eq!(m.matches.len(), 7);
        }
    }

    #[test]
    fn test_invalid_pattern_fails_cell() {
        let ctx = context(3);
        let text = Text::new("t", b"text".to_vec());
        let err = measure(&ctx, Algorithm::Kmp, &text, PatternKind::Present, b"").unwrap_err();
        assert!(matches!(err, SearchError::InvalidPattern(_)));
        assert_eq!(ctx.metrics().get_stats().searches_executed, 0);
    }

    #[test]
    fn test_budget_exhausted() {
        let ctx = BenchContext::new(HarnessSettings::default(), Duration::ZERO);
        let text = Text::new("t", b"text".to_vec());
        let err = measure(&ctx, Algorithm::Kmp, &text, PatternKind::Present, b"ex").unwrap_err();
        assert!(matches!(err, SearchError::MeasurementTimeout { .. }));
    }

    #[test]
    fn test_metrics_recorded() {
        let ctx = context(4);
        let text = Text::new("t", b"abcabc".to_vec());
        measure(&ctx, Algorithm::RabinKarp, &text, PatternKind::Present, b"abc").unwrap();
        let stats = ctx.metrics().get_stats();
        assert_eq!(stats.searches_executed, 4);
        assert_eq!(stats.bytes_scanned, 24);
        assert_eq!(stats.matches_found, 8);
    }
}

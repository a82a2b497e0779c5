use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{SearchError, SearchResult};
use crate::search::{Algorithm, RollingHashParams};

/// Configuration for a benchmark run.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations in order of precedence:
/// 1. Custom config file specified via `--config` flag
/// 2. Local `.searchbench.yaml` in the current directory
/// 3. Global `$CONFIG_DIR/searchbench/config.yaml` (`dirs::config_dir`, platform dependent)
///
/// # Configuration Format
///
/// ```yaml
/// # Directory the texts are loaded from
/// corpus_root: "corpus"
///
/// # One present and one absent pattern per text
/// texts:
///   - name: "article1.txt"
///     present: "algorithm"
///     absent: "xyz123notfound"
///
/// # Untimed calls before measuring, then timed calls per cell
/// warmup_iterations: 3
/// repetitions: 10
///
/// # mean | median | min | trimmed_mean
/// statistic: "mean"
///
/// # Whether table construction is part of the measured time (included | excluded)
/// preprocessing: "included"
///
/// # Wall-clock budget for the whole run
/// time_budget: "5m"
///
/// rolling_hash:
///   base: 256
///   modulus: 1000000007
///
/// log_level: "info"
/// ```
///
/// Command-line values take precedence over file values; see `merge_with_cli`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Directory that text names are resolved against
    #[serde(default = "default_corpus_root")]
    pub corpus_root: PathBuf,

    /// Texts and their present/absent patterns
    #[serde(default = "default_texts")]
    pub texts: Vec<TextSpec>,

    /// Algorithms to measure, in ranking tie-break order
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<Algorithm>,

    /// Untimed invocations before the timed ones
    #[serde(default = "default_warmup_iterations")]
    pub warmup_iterations: usize,

    /// Timed invocations per cell
    #[serde(default = "default_repetitions")]
    pub repetitions: NonZeroUsize,

    /// How samples are reduced to one duration
    #[serde(default)]
    pub statistic: Statistic,

    /// Fraction trimmed from each end for `trimmed_mean`
    #[serde(default = "default_trim_fraction")]
    pub trim_fraction: f64,

    /// Whether table construction is timed
    #[serde(default)]
    pub preprocessing: PreprocessingPolicy,

    /// Wall-clock budget for the whole run (humantime syntax, e.g. "90s", "5m")
    #[serde(default = "default_time_budget")]
    pub time_budget: String,

    /// Rabin-Karp hash parameters
    #[serde(default)]
    pub rolling_hash: RollingHashParams,

    /// Check that all algorithms agree before timing a scenario
    #[serde(default = "default_verify_equivalence")]
    pub verify_equivalence: bool,

    /// Threads used by the (untimed) equivalence check
    #[serde(default = "default_thread_count")]
    pub verify_threads: NonZeroUsize,

    /// How text files that are not valid UTF-8 are handled
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// A text to benchmark and the two patterns probed against it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpec {
    pub name: String,
    pub present: String,
    pub absent: String,
}

impl TextSpec {
    pub fn new(
        name: impl Into<String>,
        present: impl Into<String>,
        absent: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            present: present.into(),
            absent: absent.into(),
        }
    }
}

impl FromStr for TextSpec {
    type Err = SearchError;

    /// Parses `NAME:PRESENT:ABSENT`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(present), Some(absent)) if !name.is_empty() => {
                Ok(TextSpec::new(name, present, absent))
            }
            _ => Err(SearchError::config_error(format!(
                "expected NAME:PRESENT:ABSENT, got '{}'",
                s
            ))),
        }
    }
}

/// Central tendency used to summarise a cell's samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    #[default]
    Mean,
    Median,
    Min,
    TrimmedMean,
}

impl FromStr for Statistic {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "mean" => Ok(Statistic::Mean),
            "median" => Ok(Statistic::Median),
            "min" | "best" => Ok(Statistic::Min),
            "trimmed_mean" | "trimmed" => Ok(Statistic::TrimmedMean),
            other => Err(SearchError::config_error(format!(
                "unknown statistic '{}' (expected mean, median, min or trimmed_mean)",
                other
            ))),
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Statistic::Mean => "mean",
            Statistic::Median => "median",
            Statistic::Min => "min",
            Statistic::TrimmedMean => "trimmed_mean",
        };
        f.write_str(name)
    }
}

/// Whether building the per-pattern tables counts towards measured time.
///
/// One policy applies to every algorithm in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingPolicy {
    #[default]
    Included,
    Excluded,
}

impl fmt::Display for PreprocessingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessingPolicy::Included => f.write_str("included"),
            PreprocessingPolicy::Excluded => f.write_str("excluded"),
        }
    }
}

/// Handling of text bytes that are not valid UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMode {
    /// Reject the text
    FailFast,
    /// Search the raw bytes and log a warning
    #[default]
    Lossy,
}

impl FromStr for EncodingMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "failfast" | "fail_fast" => Ok(EncodingMode::FailFast),
            "lossy" => Ok(EncodingMode::Lossy),
            other => Err(SearchError::config_error(format!(
                "unknown encoding mode '{}' (expected failfast or lossy)",
                other
            ))),
        }
    }
}

fn default_corpus_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_texts() -> Vec<TextSpec> {
    vec![
        TextSpec::new("article1.txt", "algorithm", "xyz123notfound"),
        TextSpec::new("article2.txt", "research", "qwerty456notexist"),
    ]
}

fn default_algorithms() -> Vec<Algorithm> {
    Algorithm::ALL.to_vec()
}

fn default_warmup_iterations() -> usize {
    3
}

fn default_repetitions() -> NonZeroUsize {
    NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN)
}

fn default_trim_fraction() -> f64 {
    0.1
}

fn default_time_budget() -> String {
    "5m".to_string()
}

fn default_verify_equivalence() -> bool {
    true
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            corpus_root: default_corpus_root(),
            texts: default_texts(),
            algorithms: default_algorithms(),
            warmup_iterations: default_warmup_iterations(),
            repetitions: default_repetitions(),
            statistic: Statistic::default(),
            trim_fraction: default_trim_fraction(),
            preprocessing: PreprocessingPolicy::default(),
            time_budget: default_time_budget(),
            rolling_hash: RollingHashParams::default(),
            verify_equivalence: default_verify_equivalence(),
            verify_threads: default_thread_count(),
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
        }
    }
}

/// Values given on the command line. `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub corpus_root: Option<PathBuf>,
    pub texts: Vec<TextSpec>,
    pub algorithms: Vec<Algorithm>,
    pub warmup_iterations: Option<usize>,
    pub repetitions: Option<NonZeroUsize>,
    pub statistic: Option<Statistic>,
    pub preprocessing: Option<PreprocessingPolicy>,
    pub time_budget: Option<String>,
    pub verify_equivalence: Option<bool>,
    pub encoding_mode: Option<EncodingMode>,
    pub log_level: Option<String>,
}

impl BenchConfig {
    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("searchbench/config.yaml")),
            // Local config
            Some(PathBuf::from(".searchbench.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(root) = cli.corpus_root {
            self.corpus_root = root;
        }
        if !cli.texts.is_empty() {
            self.texts = cli.texts;
        }
        if !cli.algorithms.is_empty() {
            self.algorithms = cli.algorithms;
        }
        if let Some(warmup) = cli.warmup_iterations {
            self.warmup_iterations = warmup;
        }
        if let Some(repetitions) = cli.repetitions {
            self.repetitions = repetitions;
        }
        if let Some(statistic) = cli.statistic {
            self.statistic = statistic;
        }
        if let Some(policy) = cli.preprocessing {
            self.preprocessing = policy;
        }
        if let Some(budget) = cli.time_budget {
            self.time_budget = budget;
        }
        if let Some(verify) = cli.verify_equivalence {
            self.verify_equivalence = verify;
        }
        if let Some(mode) = cli.encoding_mode {
            self.encoding_mode = mode;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Parsed `time_budget`
    pub fn time_budget(&self) -> SearchResult<Duration> {
        humantime::parse_duration(&self.time_budget).map_err(|e| {
            SearchError::config_error(format!("invalid time_budget '{}': {}", self.time_budget, e))
        })
    }

    /// Checks values serde cannot
    pub fn validate(&self) -> SearchResult<()> {
        if self.texts.is_empty() {
            return Err(SearchError::config_error("no texts configured"));
        }
        for (i, spec) in self.texts.iter().enumerate() {
            if self.texts[..i].iter().any(|s| s.name == spec.name) {
                return Err(SearchError::config_error(format!(
                    "text {} listed twice",
                    spec.name
                )));
            }
        }
        if self.algorithms.is_empty() {
            return Err(SearchError::config_error("no algorithms configured"));
        }
        let mut seen = Vec::with_capacity(self.algorithms.len());
        for algorithm in &self.algorithms {
            if seen.contains(algorithm) {
                return Err(SearchError::config_error(format!(
                    "algorithm {} listed twice",
                    algorithm
                )));
            }
            seen.push(*algorithm);
        }
        if !(0.0..0.5).contains(&self.trim_fraction) {
            return Err(SearchError::config_error(format!(
                "trim_fraction must be in [0, 0.5), got {}",
                self.trim_fraction
            )));
        }
        if self.time_budget()?.is_zero() {
            return Err(SearchError::config_error("time_budget must be positive"));
        }
        Ok(())
    }
}

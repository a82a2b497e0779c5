pub mod config;
pub mod corpus;
pub mod engine;
pub mod errors;
pub mod harness;
pub mod metrics;
pub mod results;
pub mod search;

pub use config::{BenchConfig, CliOverrides, EncodingMode, PreprocessingPolicy, Statistic, TextSpec};
pub use corpus::{FileCorpus, InMemoryCorpus, PatternKind, Scenario, Text, TextSource};
pub use engine::{run_benchmark, BenchmarkReport, BenchmarkRunner};
pub use errors::{SearchError, SearchResult};
pub use harness::{measure, BenchContext, HarnessSettings, Measurement};
pub use results::{format_duration, CellOutcome, ColumnKey, Rankings, ResultGrid};
pub use search::{search, Algorithm, MatchResult, PatternMatcher};

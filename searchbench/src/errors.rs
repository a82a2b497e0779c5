//! Error types for searchbench.
//!
//! Errors fall into two groups. Algorithmic errors (`InvalidPattern`,
//! `InvalidText`, `HashCollisionOverflow`) come out of a single `search` call
//! and abort only the benchmark cell that produced them. Harness and I/O errors
//! (`MeasurementTimeout`, `FileNotFound`, `ConfigError`, ...) come from the
//! surrounding machinery.
//!
//! ```rust,ignore
//! match searchbench::search(Algorithm::Kmp, text, pattern) {
//!     Ok(result) => // Process offsets,
//!     Err(SearchError::InvalidPattern(msg)) => // Empty pattern,
//!     Err(e) => // Anything else
//! }
//! ```
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::search::Algorithm;

/// Result type for search and benchmark operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while searching or benchmarking
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid text: {0}")]
    InvalidText(String),
    #[error("Rolling hash overflow: base {base} with modulus {modulus} does not fit in 64-bit arithmetic")]
    HashCollisionOverflow { base: u64, modulus: u64 },
    #[error("Measurement timed out after {elapsed:?} (budget {budget:?})")]
    MeasurementTimeout { elapsed: Duration, budget: Duration },
    #[error("Algorithms disagree on matches for pattern {pattern:?} in {text_id}")]
    ResultMismatch { text_id: String, pattern: String },
    #[error("Result grid is incomplete: {missing} cell(s) have no outcome")]
    IncompleteGrid { missing: usize },
    #[error("{algorithm} failed on {text_id} with pattern {pattern:?}: {source}")]
    Scenario {
        algorithm: Algorithm,
        text_id: String,
        pattern: String,
        #[source]
        source: Box<SearchError>,
    },
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::str::Utf8Error,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl SearchError {
    pub fn invalid_pattern(msg: impl Into<String>) -> Self {
        Self::InvalidPattern(msg.into())
    }

    pub fn invalid_text(msg: impl Into<String>) -> Self {
        Self::InvalidText(msg.into())
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::str::Utf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    /// Wraps an error with the identity of the benchmark cell it aborted
    pub fn in_scenario(
        self,
        algorithm: Algorithm,
        text_id: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self::Scenario {
            algorithm,
            text_id: text_id.into(),
            pattern: pattern.into(),
            source: Box::new(self),
        }
    }

    /// Renders this error as it reads once wrapped by `in_scenario`, without consuming it.
    ///
    /// Used when one error fails several cells.
    pub fn scenario_message(&self, algorithm: Algorithm, text_id: &str, pattern: &str) -> String {
        format!(
            "{} failed on {} with pattern {:?}: {}",
            algorithm, text_id, pattern, self
        )
    }

    /// Returns true for errors raised by a single search call
    pub fn is_algorithmic(&self) -> bool {
        match self {
            Self::InvalidPattern(_) | Self::InvalidText(_) | Self::HashCollisionOverflow { .. } => {
                true
            }
            Self::Scenario { source, .. } => source.is_algorithmic(),
            _ => false,
        }
    }
}

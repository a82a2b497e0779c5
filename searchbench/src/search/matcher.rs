use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::boyer_moore::BoyerMoore;
use super::kmp::Kmp;
use super::preprocess::RollingHashParams;
use super::rabin_karp::RabinKarp;
use crate::errors::{SearchError, SearchResult};

/// The three interchangeable search algorithms.
///
/// Declaration order is significant: it breaks ties when ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    BoyerMoore,
    Kmp,
    RabinKarp,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::BoyerMoore, Algorithm::Kmp, Algorithm::RabinKarp];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::BoyerMoore => "boyer_moore",
            Algorithm::Kmp => "kmp",
            Algorithm::RabinKarp => "rabin_karp",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Algorithm::BoyerMoore => "Boyer-Moore",
            Algorithm::Kmp => "Knuth-Morris-Pratt",
            Algorithm::RabinKarp => "Rabin-Karp",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "boyer_moore" | "bm" => Ok(Algorithm::BoyerMoore),
            "kmp" | "knuth_morris_pratt" => Ok(Algorithm::Kmp),
            "rabin_karp" | "rk" => Ok(Algorithm::RabinKarp),
            other => Err(SearchError::config_error(format!(
                "unknown algorithm '{}' (expected boyer_moore, kmp or rabin_karp)",
                other
            ))),
        }
    }
}

/// Ordered zero-based offsets at which a pattern occurs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    offsets: Vec<usize>,
}

impl MatchResult {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn into_offsets(self) -> Vec<usize> {
        self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl From<Vec<usize>> for MatchResult {
    fn from(offsets: Vec<usize>) -> Self {
        Self { offsets }
    }
}

/// Capability shared by the three engines.
///
/// Implementors build their tables in their constructor and only provide
/// `scan`; the input checks live in `find_all`.
pub trait Searcher {
    fn algorithm(&self) -> Algorithm;

    fn pattern(&self) -> &[u8];

    /// Appends every match offset to `matches`.
    ///
    /// Callers guarantee `0 < pattern.len() <= text.len()`.
    fn scan(&self, text: &[u8], matches: &mut Vec<usize>);

    fn find_all(&self, text: &[u8]) -> SearchResult<MatchResult> {
        if text.is_empty() {
            return Err(SearchError::invalid_text("text is empty"));
        }
        let mut matches = Vec::new();
        if self.pattern().len() <= text.len() {
            self.scan(text, &mut matches);
        }
        Ok(MatchResult::from(matches))
    }
}

pub(crate) fn ensure_pattern(pattern: &[u8]) -> SearchResult<()> {
    if pattern.is_empty() {
        return Err(SearchError::invalid_pattern("pattern is empty"));
    }
    Ok(())
}

/// A pattern compiled for one algorithm
#[derive(Debug, Clone)]
pub enum MatchStrategy {
    BoyerMoore(BoyerMoore),
    Kmp(Kmp),
    RabinKarp(RabinKarp),
}

/// Handles pattern matching for a single algorithm and pattern
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    strategy: MatchStrategy,
}

impl PatternMatcher {
    /// Builds the preprocessing tables for `pattern` with default hash parameters
    pub fn new(algorithm: Algorithm, pattern: &[u8]) -> SearchResult<Self> {
        Self::with_params(algorithm, pattern, RollingHashParams::default())
    }

    pub fn with_params(
        algorithm: Algorithm,
        pattern: &[u8],
        params: RollingHashParams,
    ) -> SearchResult<Self> {
        let strategy = match algorithm {
            Algorithm::BoyerMoore => MatchStrategy::BoyerMoore(BoyerMoore::new(pattern)?),
            Algorithm::Kmp => MatchStrategy::Kmp(Kmp::new(pattern)?),
            Algorithm::RabinKarp => {
                MatchStrategy::RabinKarp(RabinKarp::with_params(pattern, params)?)
            }
        };
        Ok(Self { strategy })
    }

    fn searcher(&self) -> &dyn Searcher {
        match &self.strategy {
            MatchStrategy::BoyerMoore(s) => s,
            MatchStrategy::Kmp(s) => s,
            MatchStrategy::RabinKarp(s) => s,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.searcher().algorithm()
    }

    pub fn pattern(&self) -> &[u8] {
        self.searcher().pattern()
    }

    /// Finds all matches in the given text
    pub fn find_matches(&self, text: &[u8]) -> SearchResult<MatchResult> {
        self.searcher().find_all(text)
    }
}

/// Searches `text` for every occurrence of `pattern` using `algorithm`.
///
/// Tables are built fresh for this call and dropped with it.
pub fn search(algorithm: Algorithm, text: &[u8], pattern: &[u8]) -> SearchResult<MatchResult> {
    search_with_params(algorithm, text, pattern, RollingHashParams::default())
}

pub fn search_with_params(
    algorithm: Algorithm,
    text: &[u8],
    pattern: &[u8],
    params: RollingHashParams,
) -> SearchResult<MatchResult> {
    PatternMatcher::with_params(algorithm, pattern, params)?.find_matches(text)
}

use super::matcher::{ensure_pattern, Algorithm, Searcher};
use super::preprocess::FailureFunction;
use crate::errors::SearchResult;

/// Knuth-Morris-Pratt search.
///
/// A single left-to-right pass; on mismatch the pattern pointer falls back
/// through the failure function so no text byte is examined twice.
#[derive(Debug, Clone)]
pub struct Kmp {
    pattern: Vec<u8>,
    failure: FailureFunction,
}

impl Kmp {
    pub fn new(pattern: &[u8]) -> SearchResult<Self> {
        ensure_pattern(pattern)?;
        Ok(Self {
            pattern: pattern.to_vec(),
            failure: FailureFunction::new(pattern),
        })
    }

    pub fn failure(&self) -> &FailureFunction {
        &self.failure
    }
}

impl Searcher for Kmp {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Kmp
    }

    fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    fn scan(&self, text: &[u8], matches: &mut Vec<usize>) {
        let m = self.pattern.len();
        let mut j = 0;

        for (i, &b) in text.iter().enumerate() {
            while j > 0 && self.pattern[j] != b {
                j = self.failure.value(j - 1);
            }
            if self.pattern[j] == b {
                j += 1;
            }
            if j == m {
                matches.push(i + 1 - m);
                j = self.failure.value(m - 1);
            }
        }
    }
}

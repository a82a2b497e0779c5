use super::matcher::{ensure_pattern, Algorithm, Searcher};
use super::preprocess::{BadCharTable, GoodSuffixTable};
use crate::errors::SearchResult;

/// Boyer-Moore search with both the bad-character and the strong good-suffix rule.
///
/// The window is compared right to left. After a mismatch the larger of the two
/// rule shifts is taken; after a full match the window slides by the pattern's
/// period so overlapping occurrences are still reported.
#[derive(Debug, Clone)]
pub struct BoyerMoore {
    pattern: Vec<u8>,
    bad_char: BadCharTable,
    good_suffix: GoodSuffixTable,
}

impl BoyerMoore {
    pub fn new(pattern: &[u8]) -> SearchResult<Self> {
        ensure_pattern(pattern)?;
        Ok(Self {
            pattern: pattern.to_vec(),
            bad_char: BadCharTable::new(pattern),
            good_suffix: GoodSuffixTable::new(pattern),
        })
    }
}

impl Searcher for BoyerMoore {
    fn algorithm(&self) -> Algorithm {
        Algorithm::BoyerMoore
    }

    fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    fn scan(&self, text: &[u8], matches: &mut Vec<usize>) {
        let m = self.pattern.len();
        let n = text.len();
        let mut s = 0;

        while s <= n - m {
            let mut j = m;
            while j > 0 && self.pattern[j - 1] == text[s + j - 1] {
                j -= 1;
            }

            if j == 0 {
                matches.push(s);
                s += self.good_suffix.period();
            } else {
                let matched = m - j;
                let bad = self.bad_char.shift(text[s + j - 1], matched);
                s += bad.max(self.good_suffix.shift(j));
            }
        }
    }
}

use super::matcher::{ensure_pattern, Algorithm, Searcher};
use super::preprocess::{RollingHash, RollingHashParams};
use crate::errors::SearchResult;

/// Rabin-Karp search over a polynomial rolling hash.
///
/// Every window whose hash equals the pattern hash is verified byte by byte
/// before it is reported, so collisions never produce false matches.
#[derive(Debug, Clone)]
pub struct RabinKarp {
    pattern: Vec<u8>,
    hash: RollingHash,
}

impl RabinKarp {
    pub fn new(pattern: &[u8]) -> SearchResult<Self> {
        Self::with_params(pattern, RollingHashParams::default())
    }

    pub fn with_params(pattern: &[u8], params: RollingHashParams) -> SearchResult<Self> {
        ensure_pattern(pattern)?;
        Ok(Self {
            pattern: pattern.to_vec(),
            hash: RollingHash::new(pattern, params)?,
        })
    }

    pub fn params(&self) -> RollingHashParams {
        self.hash.params()
    }
}

impl Searcher for RabinKarp {
    fn algorithm(&self) -> Algorithm {
        Algorithm::RabinKarp
    }

    fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    fn scan(&self, text: &[u8], matches: &mut Vec<usize>) {
        let m = self.hash.window();
        let n = text.len();
        let target = self.hash.pattern_hash();
        let mut h = self.hash.hash(&text[..m]);

        for i in 0..=n - m {
            if h == target && text[i..i + m] == self.pattern[..] {
                matches.push(i);
            }
            if i + m < n {
                h = self.hash.roll(h, text[i], text[i + m]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(text: &str, pattern: &str) -> Vec<usize> {
        RabinKarp::new(pattern.as_bytes())
            .unwrap()
            .find_all(text.as_bytes())
            .unwrap()
            .into_offsets()
    }

    #[test]
    fn test_finds_all_occurrences() {
        assert_eq!(find("the quick brown fox jumps over the lazy dog", "the"), vec![0, 31]);
        assert_eq!(find("aaaaaaaa", "aa"), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_collisions_are_verified() {
        // Modulus 2 makes roughly half of all windows collide
        let params = RollingHashParams {
            base: 256,
            modulus: 2,
        };
        let rk = RabinKarp::with_params(b"ab", params).unwrap();
        let found = rk.find_all(b"abcbabdbab").unwrap().into_offsets();
        assert_eq!(found, vec![0, 4, 8]);
    }

    #[test]
    fn test_overflowing_params_rejected() {
        let params = RollingHashParams {
            base: 1 << 40,
            modulus: 1 << 40,
        };
        assert!(RabinKarp::with_params(b"abc", params).is_err());
    }

    #[test]
    fn test_absent_pattern() {
        assert!(find("research", "qwerty456notexist").is_empty());
    }
}

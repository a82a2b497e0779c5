//! Per-pattern preprocessing tables.
//!
//! Each table is built from a single pattern and owned by the searcher that
//! built it. Nothing here is cached across patterns.
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::errors::{SearchError, SearchResult};

const ALPHABET_SIZE: usize = 256;

/// Boyer-Moore bad-character table.
///
/// Maps every byte to the distance from its last occurrence in the pattern to
/// the pattern's end. Bytes that never occur map to the pattern length.
#[derive(Debug, Clone)]
pub struct BadCharTable {
    shifts: [usize; ALPHABET_SIZE],
}

impl BadCharTable {
    pub fn new(pattern: &[u8]) -> Self {
        let m = pattern.len();
        let mut shifts = [m; ALPHABET_SIZE];
        for (i, &b) in pattern.iter().enumerate() {
            shifts[b as usize] = m - 1 - i;
        }
        trace!("Built bad-character table for {} byte pattern", m);
        Self { shifts }
    }

    #[inline]
    pub fn distance(&self, byte: u8) -> usize {
        self.shifts[byte as usize]
    }

    /// Shift after a mismatch on `byte` once `matched` suffix bytes agreed.
    #[inline]
    pub fn shift(&self, byte: u8, matched: usize) -> usize {
        self.distance(byte).saturating_sub(matched).max(1)
    }
}

/// Boyer-Moore strong good-suffix table.
///
/// `shift(j)` is the safe slide when `pattern[j..]` matched and
/// `pattern[j - 1]` did not. `shift(0)` is the period used after a full match.
#[derive(Debug, Clone)]
pub struct GoodSuffixTable {
    shifts: Vec<usize>,
}

impl GoodSuffixTable {
    pub fn new(pattern: &[u8]) -> Self {
        let m = pattern.len();
        let mut shifts = vec![0usize; m + 1];
        // border[i] is the start of the widest border of pattern[i..]
        let mut border = vec![0usize; m + 1];

        let mut i = m;
        let mut j = m + 1;
        border[i] = j;
        while i > 0 {
            while j <= m && pattern[i - 1] != pattern[j - 1] {
                if shifts[j] == 0 {
                    shifts[j] = j - i;
                }
                j = border[j];
            }
            i -= 1;
            j -= 1;
            border[i] = j;
        }

        j = border[0];
        for (i, shift) in shifts.iter_mut().enumerate() {
            if *shift == 0 {
                *shift = j;
            }
            if i == j {
                j = border[j];
            }
        }

        trace!("Built good-suffix table for {} byte pattern", m);
        Self { shifts }
    }

    #[inline]
    pub fn shift(&self, j: usize) -> usize {
        self.shifts[j]
    }

    /// Smallest period of the pattern
    #[inline]
    pub fn period(&self) -> usize {
        self.shifts[0]
    }
}

/// KMP failure function.
///
/// `value(i)` is the length of the longest proper prefix of `pattern[..=i]`
/// that is also its suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureFunction {
    table: Vec<usize>,
}

impl FailureFunction {
    pub fn new(pattern: &[u8]) -> Self {
        let mut table = vec![0usize; pattern.len()];
        let mut len = 0;
        let mut i = 1;
        while i < pattern.len() {
            if pattern[i] == pattern[len] {
                len += 1;
                table[i] = len;
                i += 1;
            } else if len != 0 {
                len = table[len - 1];
            } else {
                table[i] = 0;
                i += 1;
            }
        }
        trace!("Built failure function for {} byte pattern", pattern.len());
        Self { table }
    }

    #[inline]
    pub fn value(&self, i: usize) -> usize {
        self.table[i]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.table
    }
}

/// Base and modulus of the Rabin-Karp polynomial hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingHashParams {
    #[serde(default = "default_base")]
    pub base: u64,
    #[serde(default = "default_modulus")]
    pub modulus: u64,
}

fn default_base() -> u64 {
    256
}

// Prime; keeps every intermediate product well inside u64.
fn default_modulus() -> u64 {
    1_000_000_007
}

impl Default for RollingHashParams {
    fn default() -> Self {
        Self {
            base: default_base(),
            modulus: default_modulus(),
        }
    }
}

impl RollingHashParams {
    /// Checks that the rolling update can be computed without `u64` overflow
    pub fn validate(&self) -> SearchResult<()> {
        if self.base < 2 {
            return Err(SearchError::config_error(format!(
                "rolling hash base must be at least 2, got {}",
                self.base
            )));
        }
        if self.modulus < 2 {
            return Err(SearchError::config_error(format!(
                "rolling hash modulus must be at least 2, got {}",
                self.modulus
            )));
        }
        // Largest intermediate products: (modulus - 1) * base + 255 when
        // appending and (modulus - 1) * 255 when dropping the leading byte
        (self.modulus - 1)
            .checked_mul(self.base.max(u8::MAX as u64))
            .and_then(|v| v.checked_add(u8::MAX as u64))
            .and_then(|v| v.checked_add(self.modulus))
            .map(|_| ())
            .ok_or(SearchError::HashCollisionOverflow {
                base: self.base,
                modulus: self.modulus,
            })
    }
}

/// Rabin-Karp pattern hash plus the coefficient for dropping a window's
/// leading byte (`base^(m-1) mod modulus`).
#[derive(Debug, Clone)]
pub struct RollingHash {
    params: RollingHashParams,
    pattern_hash: u64,
    high_order: u64,
    window: usize,
}

impl RollingHash {
    pub fn new(pattern: &[u8], params: RollingHashParams) -> SearchResult<Self> {
        params.validate()?;
        let mut high_order = 1u64;
        for _ in 1..pattern.len() {
            high_order = (high_order * params.base) % params.modulus;
        }
        let mut hash = Self {
            params,
            pattern_hash: 0,
            high_order,
            window: pattern.len(),
        };
        hash.pattern_hash = hash.hash(pattern);
        trace!(
            "Built rolling hash for {} byte pattern (base {}, modulus {})",
            pattern.len(),
            params.base,
            params.modulus
        );
        Ok(hash)
    }

    /// Hash of an arbitrary byte slice under the same parameters
    pub fn hash(&self, bytes: &[u8]) -> u64 {
        bytes.iter().fold(0u64, |acc, &b| {
            (acc * self.params.base + b as u64) % self.params.modulus
        })
    }

    /// Slides the window one byte: removes `outgoing`, appends `incoming`
    #[inline]
    pub fn roll(&self, hash: u64, outgoing: u8, incoming: u8) -> u64 {
        let q = self.params.modulus;
        let drop = (outgoing as u64 * self.high_order) % q;
        let without = (hash + q - drop) % q;
        (without * self.params.base + incoming as u64) % q
    }

    pub fn pattern_hash(&self) -> u64 {
        self.pattern_hash
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn params(&self) -> RollingHashParams {
        self.params
    }
}

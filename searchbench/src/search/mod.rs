//! Exact string-matching engines.
//!
//! Three algorithms implement the same contract: given a text and a non-empty
//! pattern, return every (possibly overlapping) starting offset of the pattern.
//!
//! | Algorithm   | Preprocessing                     | Worst case | Typical      |
//! |-------------|-----------------------------------|------------|--------------|
//! | Boyer-Moore | bad-character + good-suffix table | O(n * m)   | O(n / m)     |
//! | KMP         | failure function                  | O(n + m)   | O(n + m)     |
//! | Rabin-Karp  | pattern hash + rolling coefficient| O(n * m)   | O(n + m)     |
//!
//! Engines work on bytes. All tables are built per pattern and owned by the
//! engine instance that built them:
//! ```rust,ignore
//! let found = search(Algorithm::Kmp, b"aaaaaaaa", b"aa")?;
//! assert_eq!(found.offsets(), &[0, 1, 2, 3, 4, 5, 6]);
//! ```
pub mod boyer_moore;
pub mod kmp;
pub mod matcher;
pub mod preprocess;
pub mod rabin_karp;

pub use boyer_moore::BoyerMoore;
pub use kmp::Kmp;
pub use matcher::{
    search, search_with_params, Algorithm, MatchResult, MatchStrategy, PatternMatcher, Searcher,
};
pub use preprocess::RollingHashParams;
pub use rabin_karp::RabinKarp;

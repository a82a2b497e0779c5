use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Counters for a benchmark run
#[derive(Debug, Clone)]
pub struct RunMetrics {
    searches_executed: Arc<AtomicU64>,
    bytes_scanned: Arc<AtomicU64>,
    matches_found: Arc<AtomicU64>,
    cells_measured: Arc<AtomicU64>,
    cells_failed: Arc<AtomicU64>,
    verifications_run: Arc<AtomicU64>,
}

impl RunMetrics {
    /// Creates a new RunMetrics instance
    pub fn new() -> Self {
        Self {
            searches_executed: Arc::new(AtomicU64::new(0)),
            bytes_scanned: Arc::new(AtomicU64::new(0)),
            matches_found: Arc::new(AtomicU64::new(0)),
            cells_measured: Arc::new(AtomicU64::new(0)),
            cells_failed: Arc::new(AtomicU64::new(0)),
            verifications_run: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records one completed search call
    pub fn record_search(&self, text_len: usize, matches: usize) {
        self.searches_executed.fetch_add(1, Ordering::Relaxed);
        self.bytes_scanned
            .fetch_add(text_len as u64, Ordering::Relaxed);
        self.matches_found
            .fetch_add(matches as u64, Ordering::Relaxed);
    }

    /// Records the outcome of a benchmark cell
    pub fn record_cell(&self, failed: bool) {
        if failed {
            let failed = self.cells_failed.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("Cell failed, {} failure(s) so far", failed);
        } else {
            self.cells_measured.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records one untimed cross-algorithm verification pass
    pub fn record_verification(&self) {
        self.verifications_run.fetch_add(1, Ordering::Relaxed);
    }

    /// Gets current statistics
    pub fn get_stats(&self) -> RunStats {
        RunStats {
            searches_executed: self.searches_executed.load(Ordering::Relaxed),
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
            cells_measured: self.cells_measured.load(Ordering::Relaxed),
            cells_failed: self.cells_failed.load(Ordering::Relaxed),
            verifications_run: self.verifications_run.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Benchmark run stats:\n\
             Searches executed: {}\n\
             Bytes scanned: {}\n\
             Matches found: {}\n\
             Cells measured/failed: {}/{}\n\
             Verification passes: {}",
            stats.searches_executed,
            stats.bytes_scanned,
            stats.matches_found,
            stats.cells_measured,
            stats.cells_failed,
            stats.verifications_run
        );
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of run counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub searches_executed: u64,
    pub bytes_scanned: u64,
    pub matches_found: u64,
    pub cells_measured: u64,
    pub cells_failed: u64,
    pub verifications_run: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_tracking() {
        let metrics = RunMetrics::new();

        metrics.record_search(1000, 2);
        metrics.record_search(500, 0);
        let stats = metrics.get_stats();
        assert_eq!(stats.searches_executed, 2);
        assert_eq!(stats.bytes_scanned, 1500);
        assert_eq!(stats.matches_found, 2);
    }

    #[test]
    fn test_cell_tracking() {
        let metrics = RunMetrics::new();

        metrics.record_cell(false);
        metrics.record_cell(false);
        metrics.record_cell(true);
        let stats = metrics.get_stats();
        assert_eq!(stats.cells_measured, 2);
        assert_eq!(stats.cells_failed, 1);
    }

    #[test]
    fn test_verification_tracking() {
        let metrics = RunMetrics::new();
        assert_eq!(metrics.get_stats().verifications_run, 0);
        metrics.record_verification();
        assert_eq!(metrics.get_stats().verifications_run, 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = RunMetrics::new();
        let clone = metrics.clone();
        clone.record_search(10, 1);
        assert_eq!(metrics.get_stats().searches_executed, 1);
    }
}

//! Sliding Window Module
//!
//! Time-ordered request timestamps for one (subject, operation) pair.

use std::collections::VecDeque;

// == Sliding Window ==
/// Request timestamps in insertion order, oldest at the front.
#[derive(Debug, Clone, Default)]
pub struct SlidingWindow {
    stamps: VecDeque<u64>,
}

impl SlidingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    // == Prune ==
    /// Drops timestamps older than `cutoff`. Returns how many were dropped.
    pub fn prune(&mut self, cutoff: u64) -> usize {
        let mut dropped = 0;
        while self.stamps.front().is_some_and(|&t| t < cutoff) {
            self.stamps.pop_front();
            dropped += 1;
        }
        dropped
    }

    // == Record ==
    /// Appends a request at `now`.
    ///
    /// Clamped to the newest timestamp so the sequence stays non-decreasing.
    pub fn record(&mut self, now: u64) {
        let at = self.stamps.back().map_or(now, |&last| last.max(now));
        self.stamps.push_back(at);
    }

    /// Number of timestamps at or after `cutoff`, without pruning.
    pub fn count_since(&self, cutoff: u64) -> usize {
        self.stamps.len() - self.stamps.partition_point(|&t| t < cutoff)
    }

    pub fn oldest(&self) -> Option<u64> {
        self.stamps.front().copied()
    }

    // == Retry After ==
    /// Seconds until the oldest timestamp leaves a window of `window_ms`.
    ///
    /// Clamped to zero; an empty window yields zero.
    pub fn retry_after_secs(&self, now: u64, window_ms: u64) -> f64 {
        match self.oldest() {
            Some(oldest) => {
                let elapsed = now.saturating_sub(oldest);
                window_ms.saturating_sub(elapsed) as f64 / 1000.0
            }
            None => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn clear(&mut self) {
        self.stamps.clear();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_drops_only_older_than_cutoff() {
        let mut window = SlidingWindow::new();
        for t in [100, 200, 300, 400] {
            window.record(t);
        }

        assert_eq!(window.prune(300), 2);
        assert_eq!(window.len(), 2);
        assert_eq!(window.oldest(), Some(300));
    }

    #[test]
    fn test_record_keeps_order() {
        let mut window = SlidingWindow::new();
        window.record(500);
        window.record(400);

        assert_eq!(window.len(), 2);
        assert_eq!(window.count_since(500), 2);
    }

    #[test]
    fn test_count_since() {
        let mut window = SlidingWindow::new();
        for t in [10, 20, 30] {
            window.record(t);
        }

        assert_eq!(window.count_since(0), 3);
        assert_eq!(window.count_since(20), 2);
        assert_eq!(window.count_since(31), 0);
        assert_eq!(window.len(), 3, "Counting does not prune");
    }

    #[test]
    fn test_retry_after() {
        let mut window = SlidingWindow::new();
        assert_eq!(window.retry_after_secs(1_000, 60_000), 0.0);

        window.record(10_000);
        assert_eq!(window.retry_after_secs(10_000, 60_000), 60.0);
        assert_eq!(window.retry_after_secs(25_500, 60_000), 44.5);
        assert_eq!(window.retry_after_secs(100_000, 60_000), 0.0);
    }

    #[test]
    fn test_clear() {
        let mut window = SlidingWindow::new();
        window.record(1);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.oldest(), None);
    }
}

//! Dispatch metrics and observability module.
//!
//! Counts translation attempts and their outcomes. A dispatcher owns one
//! `DispatchMetrics` (shared through `Arc`) and the HTTP layer exposes its report.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for dispatch activity.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Number of jobs dispatched (including resumed ones)
    jobs: AtomicUsize,

    /// Number of calls made to the translation provider
    attempts: AtomicUsize,

    /// Number of attempts that ended in success
    successes: AtomicUsize,

    /// Number of attempts that ended in failure
    failures: AtomicUsize,

    /// Number of retries scheduled after a failed attempt
    retries: AtomicUsize,

    /// Number of targets skipped because the ledger already holds a success
    duplicates_skipped: AtomicUsize,

    /// Number of targets ended by cancellation
    cancellations: AtomicUsize,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_job(&self) {
        self.jobs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate_skipped(&self) {
        self.duplicates_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn retries(&self) -> usize {
        self.retries.load(Ordering::Relaxed)
    }

    pub fn duplicates_skipped(&self) -> usize {
        self.duplicates_skipped.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let attempts = self.attempts();
        let successes = self.successes.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let success_rate = if attempts > 0 {
            (successes as f64 / attempts as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            jobs: self.jobs.load(Ordering::Relaxed),
            attempts,
            successes,
            failures,
            retries: self.retries(),
            duplicates_skipped: self.duplicates_skipped(),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            success_rate,
        }
    }
}

/// Snapshot of the dispatch counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub jobs: usize,
    pub attempts: usize,
    pub successes: usize,
    pub failures: usize,
    pub retries: usize,
    pub duplicates_skipped: usize,
    pub cancellations: usize,

    /// Attempt success rate as a percentage (0-100)
    pub success_rate: f64,
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

use crate::workflow::AuditAction;

/// Transition counters for the review engine
#[derive(Debug, Default)]
pub struct ReviewMetrics {
    pub completions: AtomicU64,
    pub rejections: AtomicU64,
    pub reopens: AtomicU64,
    pub administrative_edits: AtomicU64,
    pub stale_writes: AtomicU64,
    pub retries: AtomicU64,
}

impl ReviewMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an applied transition by its audit action
    pub fn record_action(&self, action: &AuditAction) {
        let counter = match action {
            AuditAction::Created => return,
            AuditAction::Completed => &self.completions,
            AuditAction::Rejected { .. } => &self.rejections,
            AuditAction::Reopened { .. } => &self.reopens,
            AuditAction::AdministrativeEdit { .. } => &self.administrative_edits,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_write(&self) {
        self.stale_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> ReviewStats {
        ReviewStats {
            completions: self.completions.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            reopens: self.reopens.load(Ordering::Relaxed),
            administrative_edits: self.administrative_edits.load(Ordering::Relaxed),
            stale_writes: self.stale_writes.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Review metrics: completions={}, rejections={}, reopens={}, admin_edits={}, stale_writes={}, retries={}",
            stats.completions,
            stats.rejections,
            stats.reopens,
            stats.administrative_edits,
            stats.stale_writes,
            stats.retries
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewStats {
    pub completions: u64,
    pub rejections: u64,
    pub reopens: u64,
    pub administrative_edits: u64,
    pub stale_writes: u64,
    pub retries: u64,
}

/// Global metrics instance
static REVIEW_METRICS: std::sync::LazyLock<ReviewMetrics> =
    std::sync::LazyLock::new(ReviewMetrics::new);

pub fn review_metrics() -> &'static ReviewMetrics {
    &REVIEW_METRICS
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}

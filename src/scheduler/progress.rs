//! Progress and statistics derived from the item collection.

use serde::{Deserialize, Serialize};

use crate::domain::{BatchItem, BatchStatus, ItemStatus};

/// Live counts, recomputed after every item-status change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub status: BatchStatus,
    pub total: usize,
    pub pending: usize,
    pub generating: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Share of items that reached a terminal state, in `[0, 100]`.
    pub percentage: f64,
}

impl Progress {
    pub fn from_items<I, R>(items: &[BatchItem<I, R>], status: BatchStatus) -> Self {
        let mut progress = Progress {
            status,
            total: items.len(),
            ..Default::default()
        };

        for item in items {
            match item.status {
                ItemStatus::Pending => progress.pending += 1,
                ItemStatus::Generating => progress.generating += 1,
                ItemStatus::Completed => progress.completed += 1,
                ItemStatus::Failed => progress.failed += 1,
                ItemStatus::Cancelled => progress.cancelled += 1,
            }
        }

        progress.percentage = if progress.total == 0 {
            0.0
        } else {
            let done = (progress.completed + progress.failed + progress.cancelled) as f64;
            (done / progress.total as f64 * 100.0).clamp(0.0, 100.0)
        };

        progress
    }

    pub fn is_finished(&self) -> bool {
        self.pending + self.generating == 0
    }
}

/// Counts handed to `on_batch_complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub success_count: usize,
    pub failure_count: usize,
}

/// Post-hoc success metrics. Queryable at any time, meaningful once terminal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub success_count: usize,
    pub failure_count: usize,
    /// `success / (success + failure)`, 0.0 when nothing has finished either way
    pub success_rate: f64,
    /// Mean generation time of completed items in milliseconds
    pub average_time_ms: Option<f64>,
}

impl Statistics {
    pub fn from_items<I, R>(items: &[BatchItem<I, R>]) -> Self {
        let success_count = items.iter().filter(|i| i.status == ItemStatus::Completed).count();
        let failure_count = items.iter().filter(|i| i.status == ItemStatus::Failed).count();

        let attempted = success_count + failure_count;
        let success_rate = if attempted == 0 {
            0.0
        } else {
            success_count as f64 / attempted as f64
        };

        let samples: Vec<i64> = items.iter().filter_map(|i| i.elapsed_ms()).collect();
        let average_time_ms = if samples.is_empty() {
            None
        } else {
            Some(samples.iter().sum::<i64>() as f64 / samples.len() as f64)
        };

        Self {
            success_count,
            failure_count,
            success_rate,
            average_time_ms,
        }
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            success_count: self.success_count,
            failure_count: self.failure_count,
        }
    }
}

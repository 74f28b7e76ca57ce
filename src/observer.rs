//! Batch observers
//!
//! Optional hooks fired by the controller after state has been committed. Each hook
//! runs outside the controller's state lock, so an observer may call back into the
//! controller (e.g. read `progress()`).

use std::fmt::Debug;

use crate::domain::BatchItem;
use crate::scheduler::BatchSummary;

pub trait BatchObserver<I, R>: Send + Sync {
    /// Fires once per item reaching `Completed`
    fn on_item_complete(&self, _item: &BatchItem<I, R>) {}

    /// Fires once per item reaching `Failed`
    fn on_item_error(&self, _item: &BatchItem<I, R>, _error: &str) {}

    /// Fires once each time the batch settles in `Completed` or `Cancelled`
    fn on_batch_complete(&self, _items: &[BatchItem<I, R>], _summary: BatchSummary) {}
}

/// Observer that writes lifecycle events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl<I, R> BatchObserver<I, R> for LoggingObserver
where
    R: Debug,
{
    fn on_item_complete(&self, item: &BatchItem<I, R>) {
        tracing::info!(
            item_id = %item.id,
            item_type = %item.item_type,
            elapsed_ms = ?item.elapsed_ms(),
            "Item generated"
        );
    }

    fn on_item_error(&self, item: &BatchItem<I, R>, error: &str) {
        tracing::warn!(
            item_id = %item.id,
            item_type = %item.item_type,
            retry_count = item.retry_count,
            error = %error,
            "Item generation failed"
        );
    }

    fn on_batch_complete(&self, items: &[BatchItem<I, R>], summary: BatchSummary) {
        tracing::info!(
            total = items.len(),
            success_count = summary.success_count,
            failure_count = summary.failure_count,
            "Batch finished"
        );
    }
}

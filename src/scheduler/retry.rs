//! Manual retry policy.
//!
//! Retries happen only on request (`retry_item` / `retry_failed`); a failed call is
//! never re-queued automatically. `max_retries` caps how often one item can be
//! re-admitted so a systematically failing input cannot loop forever.

use crate::domain::BatchItem;

/// Outcome of asking whether an item may be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Failed or cancelled with budget left
    Readmit,
    /// Retryable state, but `retry_count` already hit the ceiling
    Exhausted,
    /// Not in a retryable state
    NotApplicable,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryCoordinator {
    max_retries: u32,
}

impl RetryCoordinator {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn decide<I, R>(&self, item: &BatchItem<I, R>) -> RetryDecision {
        if !item.status.is_retryable() {
            RetryDecision::NotApplicable
        } else if item.retry_count >= self.max_retries {
            RetryDecision::Exhausted
        } else {
            RetryDecision::Readmit
        }
    }

    /// Re-admit the item if the policy allows it. Returns whether it moved to `Pending`.
    pub fn readmit<I, R>(&self, item: &mut BatchItem<I, R>) -> bool {
        match self.decide(item) {
            RetryDecision::Readmit => item.readmit(),
            RetryDecision::Exhausted => {
                tracing::debug!(
                    item_id = %item.id,
                    retry_count = item.retry_count,
                    max_retries = self.max_retries,
                    "Retry budget exhausted"
                );
                false
            }
            RetryDecision::NotApplicable => false,
        }
    }
}

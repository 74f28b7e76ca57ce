//! Cancellation bookkeeping
//!
//! Cancellation is cooperative. A pending item is cancelled on the spot; a generating
//! item is flagged, and when its call resolves the outcome is discarded and the item
//! is forced to `Cancelled`. The call itself is never aborted.

use std::collections::HashSet;

use crate::domain::ItemStatus;

/// What a cancel request means for an item in a given state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelAction {
    /// Pending: mark `Cancelled` now
    CancelNow,
    /// Generating: discard whatever the in-flight call returns
    DiscardOnResolution,
    /// Already terminal (or already flagged): nothing to do
    NotApplicable,
}

/// Tracks the whole-batch cancel flag and per-item discard flags
#[derive(Debug, Default)]
pub struct CancellationManager {
    batch_cancelled: bool,
    discard: HashSet<String>,
}

impl CancellationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide how to cancel one item and record a discard flag when needed
    pub fn request(&mut self, id: &str, status: ItemStatus) -> CancelAction {
        match status {
            ItemStatus::Pending => CancelAction::CancelNow,
            ItemStatus::Generating => {
                if self.discard.insert(id.to_string()) {
                    CancelAction::DiscardOnResolution
                } else {
                    CancelAction::NotApplicable
                }
            }
            ItemStatus::Completed | ItemStatus::Failed | ItemStatus::Cancelled => CancelAction::NotApplicable,
        }
    }

    /// Consume the discard flag for an item whose call just resolved
    pub fn take_discard(&mut self, id: &str) -> bool {
        self.discard.remove(id)
    }

    pub fn is_flagged(&self, id: &str) -> bool {
        self.discard.contains(id)
    }

    /// Drop any flag for an item that left the batch
    pub fn forget(&mut self, id: &str) {
        self.discard.remove(id);
    }

    pub fn cancel_batch(&mut self) {
        self.batch_cancelled = true;
    }

    /// Lift the whole-batch flag (a retry or new items re-open the batch)
    pub fn clear_batch(&mut self) {
        self.batch_cancelled = false;
    }

    pub fn is_batch_cancelled(&self) -> bool {
        self.batch_cancelled
    }

    pub fn reset(&mut self) {
        self.batch_cancelled = false;
        self.discard.clear();
    }
}

//! Item and batch status types

use serde::{Deserialize, Serialize};

/// Lifecycle state of a single batch item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Queued, waiting for a free slot
    Pending,
    /// Generation call in flight
    Generating,
    /// Generation succeeded, `result` is set
    Completed,
    /// Generation failed, `error` is set
    Failed,
    /// Cancelled before or during generation
    Cancelled,
}

impl ItemStatus {
    /// Returns true if no further automatic transition happens from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Failed | ItemStatus::Cancelled)
    }

    /// Returns true if a retry may re-admit an item in this state
    pub fn is_retryable(&self) -> bool {
        matches!(self, ItemStatus::Failed | ItemStatus::Cancelled)
    }

    /// The full transition table. Anything not listed here is illegal.
    pub fn can_transition_to(&self, to: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!(
            (self, to),
            (Pending, Generating)
                | (Generating, Completed)
                | (Generating, Failed)
                | (Pending, Cancelled)
                | (Generating, Cancelled)
                | (Failed, Pending)
                | (Cancelled, Pending)
        )
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Generating => "generating",
            ItemStatus::Completed => "completed",
            ItemStatus::Failed => "failed",
            ItemStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Overall status of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Cancelled)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BatchStatus::Idle => "idle",
            BatchStatus::Running => "running",
            BatchStatus::Paused => "paused",
            BatchStatus::Completed => "completed",
            BatchStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// The explicit signals the batch status is derived from, besides item statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchFlags {
    /// `start` has been called since construction or the last reset
    pub started: bool,
    /// `pause` is in effect
    pub paused: bool,
    /// Whole-batch `cancel` is in effect
    pub cancelled: bool,
}

impl BatchStatus {
    /// Derive the batch status from the flags and the current item statuses.
    ///
    /// Never stored, so it cannot drift from the items it summarizes.
    pub fn derive(flags: BatchFlags, statuses: impl IntoIterator<Item = ItemStatus>) -> Self {
        if flags.cancelled {
            return BatchStatus::Cancelled;
        }
        if !flags.started {
            return BatchStatus::Idle;
        }
        let mut all_terminal = true;
        for status in statuses {
            if !status.is_terminal() {
                all_terminal = false;
                break;
            }
        }
        if all_terminal {
            BatchStatus::Completed
        } else if flags.paused {
            BatchStatus::Paused
        } else {
            BatchStatus::Running
        }
    }
}

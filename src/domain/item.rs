//! Batch item record and its state machine
//!
//! A BatchItem carries caller input through generation. Every status change goes
//! through [`BatchItem::transition`], which refuses anything outside the table in
//! [`ItemStatus::can_transition_to`].

use serde::{Deserialize, Serialize};

use crate::domain::status::ItemStatus;
use crate::id::generate_item_id;

/// An item as submitted by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItem<I> {
    /// Optional caller-supplied id; blank means "generate one"
    #[serde(default)]
    pub id: Option<String>,
    /// Caller-defined category tag (epic, feature, story, task, ...)
    #[serde(rename = "type")]
    pub item_type: String,
    /// Payload handed to the generator
    pub input: I,
}

impl<I> NewItem<I> {
    pub fn new(item_type: impl Into<String>, input: I) -> Self {
        Self {
            id: None,
            item_type: item_type.into(),
            input,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The unit of scheduled work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem<I, R> {
    /// Unique within the batch
    pub id: String,

    /// Opaque category tag
    #[serde(rename = "type")]
    pub item_type: String,

    pub input: I,

    pub status: ItemStatus,

    /// Set only while `Completed`
    pub result: Option<R>,

    /// Set only while `Failed`
    pub error: Option<String>,

    /// Number of times this item has been re-admitted by a retry
    pub retry_count: u32,

    /// When the current generation attempt began (Unix ms)
    pub started_at: Option<i64>,
    /// When the current generation attempt ended (Unix ms)
    pub completed_at: Option<i64>,
}

impl<I, R> BatchItem<I, R> {
    /// Create a pending item, generating an id when the caller left it blank
    pub fn from_new(new: NewItem<I>) -> Self {
        let id = match new.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => generate_item_id(),
        };

        Self {
            id,
            item_type: new.item_type,
            input: new.input,
            status: ItemStatus::Pending,
            result: None,
            error: None,
            retry_count: 0,
            started_at: None,
            completed_at: None,
        }
    }

    /// Move to `to` if the state machine allows it. Returns whether it moved.
    pub(crate) fn transition(&mut self, to: ItemStatus) -> bool {
        if !self.status.can_transition_to(to) {
            tracing::debug!(item_id = %self.id, from = %self.status, to = %to, "Rejected item transition");
            return false;
        }
        self.status = to;
        true
    }

    pub(crate) fn begin(&mut self, now: i64) -> bool {
        if !self.transition(ItemStatus::Generating) {
            return false;
        }
        self.started_at = Some(now);
        self.completed_at = None;
        true
    }

    pub(crate) fn complete(&mut self, result: R, now: i64) -> bool {
        if !self.transition(ItemStatus::Completed) {
            return false;
        }
        self.result = Some(result);
        self.error = None;
        self.completed_at = Some(now);
        true
    }

    pub(crate) fn fail(&mut self, error: impl Into<String>, now: i64) -> bool {
        if !self.transition(ItemStatus::Failed) {
            return false;
        }
        self.result = None;
        self.error = Some(error.into());
        self.completed_at = Some(now);
        true
    }

    pub(crate) fn cancel(&mut self, now: i64) -> bool {
        let was_generating = self.status == ItemStatus::Generating;
        if !self.transition(ItemStatus::Cancelled) {
            return false;
        }
        self.result = None;
        self.error = None;
        if was_generating {
            self.completed_at = Some(now);
        }
        true
    }

    /// Back to `Pending` for another attempt, bumping `retry_count`
    pub(crate) fn readmit(&mut self) -> bool {
        if !self.transition(ItemStatus::Pending) {
            return false;
        }
        self.retry_count += 1;
        self.result = None;
        self.error = None;
        self.started_at = None;
        self.completed_at = None;
        true
    }

    /// Wall-clock duration of a successful generation, in milliseconds
    pub fn elapsed_ms(&self) -> Option<i64> {
        if self.status != ItemStatus::Completed {
            return None;
        }
        match (self.started_at, self.completed_at) {
            // Wall-clock stamps; a clock step backwards must not yield a negative sample
            (Some(start), Some(end)) => Some((end - start).max(0)),
            _ => None,
        }
    }
}

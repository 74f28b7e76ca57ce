//! Domain types for batchgen
//!
//! - BatchItem: one unit of generation work plus its lifecycle state
//! - NewItem: what callers hand to `add_items`/`start`
//! - ItemStatus / BatchStatus: the item state machine and the derived batch status

pub mod item;
pub mod status;

pub use item::{BatchItem, NewItem};
pub use status::{BatchFlags, BatchStatus, ItemStatus};

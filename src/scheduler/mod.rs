//! Scheduling building blocks for a generation batch.
//!
//! This module provides:
//! - **ConcurrencyScheduler**: FIFO pending queue, concurrency ceiling, inter-launch pacing.
//! - **CancellationManager**: whole-batch and per-item cancellation flags (discard-on-resolution).
//! - **RetryCoordinator**: re-admission of failed/cancelled items against `max_retries`.
//! - **Progress / Statistics**: live counts and post-hoc success metrics.
//!
//! None of these types await or lock. The controller owns one of each and drives
//! them from its single scheduling loop.

mod cancel;
mod config;
mod progress;
mod queue;
mod retry;

pub use cancel::{CancelAction, CancellationManager};
pub use config::{BatchConfig, DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES};
pub use progress::{BatchSummary, Progress, Statistics};
pub use queue::ConcurrencyScheduler;
pub use retry::{RetryCoordinator, RetryDecision};

//! batchgen - bounded-concurrency batch generation
//!
//! Drives many slow, fallible generation calls (one per work item: epics, features,
//! stories, tasks) under a concurrency ceiling and launch pacing, with partial-failure
//! tolerance, manual retry, cancellation, pause/resume and live progress.

pub mod controller;
pub mod domain;
pub mod error;
pub mod generator;
pub mod id;
pub mod observer;
pub mod scheduler;

pub use controller::BatchController;
pub use domain::{BatchItem, BatchStatus, ItemStatus, NewItem};
pub use error::{BatchError, GenerateError, Result};
pub use generator::{CommandGenerator, GenerateResult, Generator, generator_fn};
pub use observer::{BatchObserver, LoggingObserver};
pub use scheduler::{BatchConfig, BatchSummary, Progress, Statistics};

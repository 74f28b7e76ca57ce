//! Batch controller: the public facade over a generation batch.
//!
//! The controller owns the item collection behind a single lock. Every operation
//! takes the lock, mutates, and releases it before anything awaits, so operations
//! never interleave mid-mutation. Generation calls run as spawned tasks and report
//! back over a channel to one driver loop (see `driver.rs`), which is the only place
//! outcomes are committed.
//!
//! # Example
//!
//! ```ignore
//! use batchgen::controller::BatchController;
//! use batchgen::domain::NewItem;
//! use batchgen::generator::generator_fn;
//! use batchgen::scheduler::BatchConfig;
//!
//! let generator = generator_fn(|item| async move { Ok(format!("story for {}", item.input)) });
//! let controller = BatchController::new(BatchConfig::default().with_concurrency(2), generator)?;
//!
//! let stats = controller
//!     .start(vec![NewItem::new("story", "checkout".to_string())])
//!     .await?;
//! assert_eq!(stats.success_count, 1);
//! ```

mod driver;
mod state;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Notify, watch};

use crate::domain::{BatchItem, BatchStatus, NewItem};
use crate::error::{BatchError, Result};
use crate::generator::Generator;
use crate::observer::BatchObserver;
use crate::scheduler::{BatchConfig, Progress, Statistics};

use state::{BatchState, Notice};

struct Shared<I, R> {
    state: Mutex<BatchState<I, R>>,
    generator: Arc<dyn Generator<I, R>>,
    observers: Vec<Arc<dyn BatchObserver<I, R>>>,
    /// Wakes the driver loop after an external mutation
    wake: Notify,
}

/// Cheap-to-clone handle to one batch.
pub struct BatchController<I, R> {
    shared: Arc<Shared<I, R>>,
}

impl<I, R> Clone for BatchController<I, R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<I, R> BatchController<I, R>
where
    I: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Create a controller. Fails if the configuration is invalid.
    pub fn new(config: BatchConfig, generator: impl Generator<I, R> + 'static) -> Result<Self> {
        Self::with_observers(config, Arc::new(generator), Vec::new())
    }

    /// Create a controller with a shared generator and a set of observers.
    pub fn with_observers(
        config: BatchConfig,
        generator: Arc<dyn Generator<I, R>>,
        observers: Vec<Arc<dyn BatchObserver<I, R>>>,
    ) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            concurrency = config.concurrency,
            item_delay_ms = config.item_delay.as_millis() as u64,
            max_retries = config.max_retries,
            "Creating batch controller"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BatchState::new(config)),
                generator,
                observers,
                wake: Notify::new(),
            }),
        })
    }

    //=== Queries ===

    pub fn config(&self) -> BatchConfig {
        self.shared.state.lock().config().clone()
    }

    pub fn status(&self) -> BatchStatus {
        self.shared.state.lock().status()
    }

    pub fn progress(&self) -> Progress {
        self.shared.state.lock().progress()
    }

    pub fn statistics(&self) -> Statistics {
        self.shared.state.lock().statistics()
    }

    /// Snapshot of every item in batch order
    pub fn items(&self) -> Vec<BatchItem<I, R>> {
        self.shared.state.lock().items().to_vec()
    }

    pub fn get_item(&self, id: &str) -> Option<BatchItem<I, R>> {
        self.shared.state.lock().get(id).cloned()
    }

    /// Receive a fresh `Progress` after every item-status change
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.shared.state.lock().subscribe_progress()
    }

    //=== Operations ===

    /// Append items as `Pending`. Blank ids are replaced with generated ones.
    ///
    /// Returns the ids in submission order. A blank type or a duplicate id rejects
    /// the whole call.
    pub fn add_items(&self, items: Vec<NewItem<I>>) -> Result<Vec<String>> {
        let ids = self.mutate(|state| state.add_items(items))?;
        self.wake();
        Ok(ids)
    }

    /// Remove an item whatever its status. Unknown ids are a no-op.
    pub fn remove_item(&self, id: &str) -> Option<BatchItem<I, R>> {
        let removed = self.mutate(|state| state.remove_item(id));
        self.wake();
        removed
    }

    /// Append `items` (may be empty) and drive the batch until it settles.
    ///
    /// Resolves with the final statistics once the batch is `Completed` or
    /// `Cancelled`. Generation failures never surface here; they land on the item.
    /// Dropping the returned future stops the waiting, not the batch.
    pub async fn start(&self, items: Vec<NewItem<I>>) -> Result<Statistics> {
        self.mutate(|state| {
            state.add_items(items)?;
            state.mark_started();
            Ok::<_, BatchError>(())
        })?;
        tracing::info!(total = self.progress().total, "Starting batch");
        Ok(self.drive().await)
    }

    /// Stop launching new items. In-flight calls finish normally.
    pub fn pause(&self) -> bool {
        let paused = self.mutate(|state| state.pause());
        if paused {
            tracing::info!("Batch paused");
        }
        paused
    }

    pub fn resume(&self) -> bool {
        let resumed = self.mutate(|state| state.resume());
        if resumed {
            tracing::info!("Batch resumed");
            self.wake();
        }
        resumed
    }

    /// Cancel the whole batch: pending items now, in-flight ones when they resolve.
    pub fn cancel(&self) -> bool {
        let cancelled = self.mutate(|state| state.cancel_all());
        if cancelled {
            tracing::info!("Batch cancelled");
            self.wake();
        }
        cancelled
    }

    /// Cancel one item. Returns false if it had already finished.
    pub fn cancel_item(&self, id: &str) -> Result<bool> {
        let cancelled = self.mutate(|state| state.cancel_item(id))?;
        if cancelled {
            tracing::debug!(item_id = %id, "Item cancelled");
            self.wake();
        }
        Ok(cancelled)
    }

    /// Re-admit one failed or cancelled item and drive the batch until it settles.
    ///
    /// Returns false (and changes nothing) when the item is not retryable or its
    /// retry budget is spent.
    pub async fn retry_item(&self, id: &str) -> Result<bool> {
        let readmitted = self.mutate(|state| state.retry_item(id))?;
        if readmitted {
            self.drive().await;
        }
        Ok(readmitted)
    }

    /// Re-admit every failed item with budget left and drive the batch until it settles.
    ///
    /// Returns the ids that were re-admitted.
    pub async fn retry_failed(&self) -> Vec<String> {
        let readmitted = self.mutate(|state| state.retry_failed());
        if !readmitted.is_empty() {
            tracing::info!(count = readmitted.len(), "Retrying failed items");
            self.drive().await;
        }
        readmitted
    }

    /// Drop every item and return to `Idle`. Calls still in flight are ignored when they resolve.
    pub fn reset(&self) {
        self.mutate(|state| state.reset());
        self.wake();
    }

    //=== Internals ===

    /// Run `f` under the lock, then fire whatever observer notices it produced.
    fn mutate<T>(&self, f: impl FnOnce(&mut BatchState<I, R>) -> T) -> T {
        let (out, notices) = {
            let mut state = self.shared.state.lock();
            let out = f(&mut state);
            (out, state.take_notices())
        };
        self.dispatch(notices);
        out
    }

    fn wake(&self) {
        self.shared.wake.notify_one();
    }

    fn dispatch(&self, notices: Vec<Notice<I, R>>) {
        for notice in notices {
            for observer in &self.shared.observers {
                match &notice {
                    Notice::ItemComplete(item) => observer.on_item_complete(item),
                    Notice::ItemError(item, error) => observer.on_item_error(item, error),
                    Notice::BatchComplete(items, summary) => observer.on_batch_complete(items, *summary),
                }
            }
        }
    }
}

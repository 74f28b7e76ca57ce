//! The scheduling loop.
//!
//! At most one driver runs per batch, on its own task. It launches items as the
//! ceiling and pacing allow, waits for outcomes, and commits them. External operations
//! poke it through `Shared::wake`. Callers of `drive` only wait for the driver to settle
//! the batch, so dropping one of them never stops the batch.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::controller::BatchController;
use crate::controller::state::{DriverClaim, Launch, Outcome};
use crate::error::GenerateError;
use crate::scheduler::Statistics;

/// Capacity of the outcome channel. Senders only wait if the driver falls behind.
const OUTCOME_BUFFER: usize = 100;

impl<I, R> BatchController<I, R>
where
    I: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Make sure the batch is being driven, and wait until it settles.
    pub(super) async fn drive(&self) -> Statistics {
        loop {
            let (claim, mut driver_rx) = {
                let mut state = self.shared.state.lock();
                (state.claim_driver(), state.subscribe_driver())
            };

            match claim {
                DriverClaim::Claimed => {
                    let driver = self.clone();
                    tokio::spawn(async move { driver.run_driver().await });
                }
                DriverClaim::Busy => self.wake(),
                DriverClaim::NothingToDo => return self.statistics(),
            }

            // The sender lives in the state we hold, so this only ends when released
            let _ = driver_rx.wait_for(|active| !*active).await;
        }
    }

    async fn run_driver(&self) {
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<Outcome<R>>(OUTCOME_BUFFER);
        tracing::debug!("Driver started");

        loop {
            let now = Instant::now();
            let (launches, deadline, released) = self.mutate(|state| {
                let launches = state.launch_ready(now);
                let deadline = state.pacing_deadline(now);
                let released = launches.is_empty() && state.release_driver_if_idle();
                (launches, deadline, released)
            });

            for launch in launches {
                self.spawn_generation(launch, outcome_tx.clone());
            }

            if released {
                break;
            }

            tokio::select! {
                Some(outcome) = outcome_rx.recv() => {
                    self.mutate(|state| state.apply_outcome(outcome));
                }
                _ = self.shared.wake.notified() => {}
                _ = tokio::time::sleep_until(deadline.unwrap_or(now)), if deadline.is_some() => {
                    tracing::debug!("Pacing delay elapsed");
                }
            }
        }

        tracing::debug!("Driver stopped");
    }

    /// Run one generation call on its own task and send the outcome back.
    fn spawn_generation(&self, launch: Launch<I, R>, outcome_tx: mpsc::Sender<Outcome<R>>) {
        let generator = Arc::clone(&self.shared.generator);
        let Launch { epoch, token, item } = launch;
        let id = item.id.clone();

        tokio::spawn(async move {
            let result = AssertUnwindSafe(generator.generate(item))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    tracing::error!(item_id = %id, "Generation task panicked");
                    Err(GenerateError::new("generation task panicked"))
                });

            if outcome_tx.send(Outcome { epoch, token, id, result }).await.is_err() {
                tracing::debug!("Driver gone before outcome arrived");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BatchItem, ItemStatus, NewItem};
    use crate::generator::generator_fn;
    use crate::scheduler::BatchConfig;
    use std::time::Duration;

    #[tokio::test]
    async fn test_panicking_generator_fails_item() {
        let generator = generator_fn(|item: BatchItem<u32, u32>| async move {
            if item.input == 0 {
                panic!("bad input");
            }
            Ok(item.input * 2)
        });
        let controller = BatchController::new(BatchConfig::default(), generator).unwrap();

        let stats = controller
            .start(vec![NewItem::new("task", 0).with_id("zero"), NewItem::new("task", 4).with_id("four")])
            .await
            .unwrap();

        assert_eq!(stats.success_count, 1);
        assert_eq!(stats.failure_count, 1);
        let zero = controller.get_item("zero").unwrap();
        assert_eq!(zero.status, ItemStatus::Failed);
        assert_eq!(zero.error.as_deref(), Some("generation task panicked"));
        assert_eq!(controller.get_item("four").unwrap().result, Some(8));
    }

    #[tokio::test]
    async fn test_pacing_spaces_out_launches() {
        let generator = generator_fn(|_item: BatchItem<(), ()>| async move { Ok(()) });
        let config = BatchConfig::default()
            .with_concurrency(3)
            .with_item_delay(Duration::from_millis(40));
        let controller = BatchController::new(config, generator).unwrap();

        controller
            .start((0..3).map(|i| NewItem::new("task", ()).with_id(format!("t{}", i))).collect())
            .await
            .unwrap();

        let items = controller.items();
        let starts: Vec<i64> = items.iter().map(|i| i.started_at.unwrap()).collect();
        assert!(starts[1] - starts[0] >= 35, "starts: {:?}", starts);
        assert!(starts[2] - starts[1] >= 35, "starts: {:?}", starts);
    }

    #[tokio::test]
    async fn test_second_driver_waits_for_first() {
        let generator = generator_fn(|_item: BatchItem<(), ()>| async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(())
        });
        let controller = BatchController::new(BatchConfig::default().with_concurrency(1), generator).unwrap();
        controller
            .add_items((0..3).map(|_| NewItem::new("task", ())).collect())
            .unwrap();

        let first = {
            let c = controller.clone();
            tokio::spawn(async move { c.start(vec![]).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = controller.start(vec![]).await.unwrap();

        assert_eq!(second.success_count, 3);
        assert_eq!(first.await.unwrap().unwrap().success_count, 3);
    }

    #[tokio::test]
    async fn test_dropped_start_does_not_strand_batch() {
        let generator = generator_fn(|item: BatchItem<(), String>| async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(item.id)
        });
        let controller = BatchController::new(BatchConfig::default().with_concurrency(1), generator).unwrap();

        let items = vec![NewItem::new("task", ()).with_id("a"), NewItem::new("task", ()).with_id("b")];
        let first = tokio::time::timeout(Duration::from_millis(5), controller.start(items)).await;
        assert!(first.is_err(), "first start should have timed out");

        // Nobody is awaiting the batch now, yet it keeps going
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(controller.get_item("a").unwrap().status, ItemStatus::Completed);
        assert_eq!(controller.get_item("b").unwrap().status, ItemStatus::Completed);

        let stats = tokio::time::timeout(Duration::from_millis(500), controller.start(vec![]))
            .await
            .expect("second start should not hang")
            .unwrap();
        assert_eq!(stats.success_count, 2);
        assert_eq!(controller.status(), crate::domain::BatchStatus::Completed);
    }

    #[tokio::test]
    async fn test_dropped_start_then_restart_mid_run() {
        let generator = generator_fn(|item: BatchItem<(), String>| async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(item.id)
        });
        let controller = BatchController::new(BatchConfig::default().with_concurrency(1), generator).unwrap();

        let items = (0..3).map(|i| NewItem::new("task", ()).with_id(format!("t{}", i))).collect();
        assert!(tokio::time::timeout(Duration::from_millis(5), controller.start(items)).await.is_err());

        let stats = tokio::time::timeout(Duration::from_millis(500), controller.start(vec![]))
            .await
            .expect("second start should not hang")
            .unwrap();
        assert_eq!(stats.success_count, 3);
    }

    #[tokio::test]
    async fn test_start_on_empty_batch_completes_immediately() {
        let generator = generator_fn(|_item: BatchItem<(), ()>| async move { Ok(()) });
        let controller = BatchController::new(BatchConfig::default(), generator).unwrap();

        let stats = controller.start(vec![]).await.unwrap();
        assert_eq!(stats.success_count, 0);
        assert_eq!(controller.status(), crate::domain::BatchStatus::Completed);
    }
}

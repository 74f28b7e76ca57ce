//! The batch's owned state and every mutation applied to it.
//!
//! All methods here are synchronous and run under the controller's lock, so each
//! operation completes without interleaving with another. Observer notifications are
//! queued as [`Notice`]s and handed back to the controller to fire after unlocking.

use std::collections::{HashMap, HashSet};

use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::{BatchFlags, BatchItem, BatchStatus, ItemStatus, NewItem};
use crate::error::{BatchError, Result};
use crate::generator::GenerateResult;
use crate::id::{generate_item_id, now_ms};
use crate::scheduler::{
    BatchConfig, BatchSummary, CancelAction, CancellationManager, ConcurrencyScheduler, Progress, RetryCoordinator,
    Statistics,
};

/// Observer notification waiting to be fired
pub(crate) enum Notice<I, R> {
    ItemComplete(BatchItem<I, R>),
    ItemError(BatchItem<I, R>, String),
    BatchComplete(Vec<BatchItem<I, R>>, BatchSummary),
}

/// A launch decided under the lock, to be spawned after it is released
pub(crate) struct Launch<I, R> {
    pub epoch: u64,
    pub token: u64,
    pub item: BatchItem<I, R>,
}

/// A resolved generation call on its way back to the driver
pub(crate) struct Outcome<R> {
    pub epoch: u64,
    /// Identifies the launch, so a removed and re-added id cannot take an older call's result
    pub token: u64,
    pub id: String,
    pub result: GenerateResult<R>,
}

/// Whether the caller of `drive` should run the scheduling loop itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DriverClaim {
    Claimed,
    Busy,
    NothingToDo,
}

pub(crate) struct BatchState<I, R> {
    config: BatchConfig,
    items: Vec<BatchItem<I, R>>,
    scheduler: ConcurrencyScheduler,
    cancellation: CancellationManager,
    retry: RetryCoordinator,
    started: bool,
    paused: bool,
    /// The current terminal state has already been reported to observers
    reported: bool,
    driver_active: bool,
    /// Bumped by `reset`, so outcomes of calls launched before it are ignored
    epoch: u64,
    /// Token of the live launch per generating item
    launched: HashMap<String, u64>,
    launch_seq: u64,
    notices: Vec<Notice<I, R>>,
    progress_tx: watch::Sender<Progress>,
    driver_tx: watch::Sender<bool>,
}

impl<I: Clone, R: Clone> BatchState<I, R> {
    pub fn new(config: BatchConfig) -> Self {
        let (progress_tx, _) = watch::channel(Progress::default());
        let (driver_tx, _) = watch::channel(false);

        Self {
            scheduler: ConcurrencyScheduler::new(config.concurrency, config.item_delay),
            cancellation: CancellationManager::new(),
            retry: RetryCoordinator::new(config.max_retries),
            config,
            items: Vec::new(),
            started: false,
            paused: false,
            reported: false,
            driver_active: false,
            epoch: 0,
            launched: HashMap::new(),
            launch_seq: 0,
            notices: Vec::new(),
            progress_tx,
            driver_tx,
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    fn flags(&self) -> BatchFlags {
        BatchFlags {
            started: self.started,
            paused: self.paused,
            cancelled: self.cancellation.is_batch_cancelled(),
        }
    }

    pub fn status(&self) -> BatchStatus {
        BatchStatus::derive(self.flags(), self.items.iter().map(|i| i.status))
    }

    pub fn progress(&self) -> Progress {
        Progress::from_items(&self.items, self.status())
    }

    pub fn statistics(&self) -> Statistics {
        Statistics::from_items(&self.items)
    }

    pub fn items(&self) -> &[BatchItem<I, R>] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&BatchItem<I, R>> {
        self.items.iter().find(|i| i.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut BatchItem<I, R>> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.scheduler.in_flight()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<Progress> {
        self.progress_tx.subscribe()
    }

    pub fn subscribe_driver(&self) -> watch::Receiver<bool> {
        self.driver_tx.subscribe()
    }

    //=== Items ===

    /// Validate and append items as `Pending`. Either all are admitted or none.
    pub fn add_items(&mut self, new: Vec<NewItem<I>>) -> Result<Vec<String>> {
        if new.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<&str> = self.items.iter().map(|i| i.id.as_str()).collect();
        for item in &new {
            if item.item_type.trim().is_empty() {
                return Err(BatchError::InvalidItem("item type must not be empty".to_string()));
            }
            if let Some(id) = item.id.as_deref().filter(|id| !id.trim().is_empty())
                && !seen.insert(id)
            {
                return Err(BatchError::DuplicateItem(id.to_string()));
            }
        }

        let reserved: HashSet<String> = new
            .iter()
            .filter_map(|i| i.id.clone())
            .filter(|id| !id.trim().is_empty())
            .collect();

        let mut ids: Vec<String> = Vec::with_capacity(new.len());
        for item in new {
            let generated = item.id.as_deref().is_none_or(|id| id.trim().is_empty());
            let mut record = BatchItem::from_new(item);
            while generated
                && (self.get(&record.id).is_some() || reserved.contains(&record.id) || ids.contains(&record.id))
            {
                record.id = generate_item_id();
            }
            self.scheduler.enqueue(record.id.clone());
            ids.push(record.id.clone());
            self.items.push(record);
        }

        // New work re-opens a finished batch; without a driver it waits for `start`
        self.cancellation.clear_batch();
        if !self.driver_active {
            self.started = false;
        }

        tracing::debug!(count = ids.len(), total = self.items.len(), "Items added");
        Ok(ids)
    }

    pub fn remove_item(&mut self, id: &str) -> Option<BatchItem<I, R>> {
        let pos = self.items.iter().position(|i| i.id == id)?;
        let item = self.items.remove(pos);
        self.scheduler.remove(id);
        self.cancellation.forget(id);
        self.launched.remove(id);
        tracing::debug!(item_id = %id, status = %item.status, "Item removed");
        Some(item)
    }

    //=== Scheduling ===

    fn may_launch(&self) -> bool {
        self.started && !self.paused && !self.cancellation.is_batch_cancelled()
    }

    /// Move as many queued items to `Generating` as the ceiling and pacing allow
    pub fn launch_ready(&mut self, now: Instant) -> Vec<Launch<I, R>> {
        let mut launches = Vec::new();
        if !self.may_launch() {
            return launches;
        }

        let epoch = self.epoch;
        while let Some(id) = self.scheduler.next_launch(now) {
            let started_at = now_ms();
            let began = match self.get_mut(&id) {
                Some(item) => item.begin(started_at).then(|| item.clone()),
                None => None,
            };
            match began {
                Some(item) => {
                    self.launch_seq += 1;
                    let token = self.launch_seq;
                    self.launched.insert(id, token);
                    launches.push(Launch { epoch, token, item });
                }
                // Stale queue entry; give the slot back
                None => self.scheduler.finished(),
            }
        }
        launches
    }

    /// When pacing is the only thing holding back the next launch
    pub fn pacing_deadline(&self, now: Instant) -> Option<Instant> {
        if !self.may_launch() {
            return None;
        }
        self.scheduler.pacing_deadline(now)
    }

    /// Commit the outcome of a generation call
    pub fn apply_outcome(&mut self, outcome: Outcome<R>) {
        if outcome.epoch != self.epoch {
            tracing::debug!(item_id = %outcome.id, "Ignoring outcome from before reset");
            return;
        }
        self.scheduler.finished();

        if self.launched.get(&outcome.id) != Some(&outcome.token) {
            tracing::debug!(item_id = %outcome.id, "Ignoring outcome of a superseded launch");
            return;
        }
        self.launched.remove(&outcome.id);

        let discard = self.cancellation.take_discard(&outcome.id);
        let now = now_ms();
        let Some(item) = self.get_mut(&outcome.id) else {
            return;
        };
        if item.status != ItemStatus::Generating {
            return;
        }

        if discard {
            item.cancel(now);
            tracing::debug!(item_id = %item.id, "Discarded outcome of cancelled item");
            return;
        }

        match outcome.result {
            Ok(result) => {
                item.complete(result, now);
                let snapshot = item.clone();
                self.notices.push(Notice::ItemComplete(snapshot));
            }
            Err(err) => {
                let message = err.to_string();
                item.fail(message.clone(), now);
                let snapshot = item.clone();
                self.notices.push(Notice::ItemError(snapshot, message));
            }
        }
    }

    //=== Driver ownership ===

    fn needs_driver(&self) -> bool {
        matches!(self.status(), BatchStatus::Running | BatchStatus::Paused) || self.scheduler.in_flight() > 0
    }

    pub fn claim_driver(&mut self) -> DriverClaim {
        if self.driver_active {
            return DriverClaim::Busy;
        }
        if !self.needs_driver() {
            return DriverClaim::NothingToDo;
        }
        self.driver_active = true;
        self.driver_tx.send_replace(true);
        DriverClaim::Claimed
    }

    /// Release the driver if nothing is left for it to do. Returns whether it was released.
    pub fn release_driver_if_idle(&mut self) -> bool {
        if self.needs_driver() {
            return false;
        }
        self.driver_active = false;
        self.driver_tx.send_replace(false);
        true
    }

    /// Mark the batch as started (by `start` or a retry)
    pub fn mark_started(&mut self) {
        self.started = true;
    }

    //=== Pause / cancel / retry ===

    pub fn pause(&mut self) -> bool {
        if self.status() != BatchStatus::Running {
            return false;
        }
        self.paused = true;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.status() != BatchStatus::Paused {
            return false;
        }
        self.paused = false;
        true
    }

    pub fn cancel_all(&mut self) -> bool {
        if self.status().is_terminal() {
            return false;
        }
        self.cancellation.cancel_batch();

        let now = now_ms();
        for id in self.scheduler.drain() {
            if let Some(item) = self.get_mut(&id) {
                item.cancel(now);
            }
        }
        for item in self.items.iter_mut() {
            match self.cancellation.request(&item.id, item.status) {
                CancelAction::CancelNow => {
                    item.cancel(now);
                }
                CancelAction::DiscardOnResolution | CancelAction::NotApplicable => {}
            }
        }
        true
    }

    pub fn cancel_item(&mut self, id: &str) -> Result<bool> {
        let status = self
            .get(id)
            .map(|i| i.status)
            .ok_or_else(|| BatchError::ItemNotFound(id.to_string()))?;

        match self.cancellation.request(id, status) {
            CancelAction::CancelNow => {
                self.scheduler.remove(id);
                let now = now_ms();
                if let Some(item) = self.get_mut(id) {
                    item.cancel(now);
                }
                Ok(true)
            }
            CancelAction::DiscardOnResolution => Ok(true),
            CancelAction::NotApplicable => Ok(false),
        }
    }

    pub fn retry_item(&mut self, id: &str) -> Result<bool> {
        let retry = self.retry;
        let item = self
            .get_mut(id)
            .ok_or_else(|| BatchError::ItemNotFound(id.to_string()))?;
        if !retry.readmit(item) {
            return Ok(false);
        }
        tracing::info!(item_id = %id, retry_count = item.retry_count, "Item re-admitted");
        self.scheduler.enqueue(id);
        self.cancellation.clear_batch();
        self.started = true;
        Ok(true)
    }

    pub fn retry_failed(&mut self) -> Vec<String> {
        let failed: Vec<String> = self
            .items
            .iter()
            .filter(|i| i.status == ItemStatus::Failed)
            .map(|i| i.id.clone())
            .collect();

        failed
            .into_iter()
            .filter(|id| matches!(self.retry_item(id), Ok(true)))
            .collect()
    }

    pub fn reset(&mut self) {
        self.items.clear();
        self.scheduler.reset();
        self.cancellation.reset();
        self.launched.clear();
        self.started = false;
        self.paused = false;
        self.reported = false;
        self.epoch += 1;
        tracing::info!(epoch = self.epoch, "Batch reset");
    }

    //=== Settling ===

    /// Publish progress, detect a newly reached terminal state, and hand back the
    /// notices accumulated since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice<I, R>> {
        let status = self.status();
        if status.is_terminal() {
            self.paused = false;
            if !self.reported && self.scheduler.in_flight() == 0 {
                self.reported = true;
                let summary = self.statistics().summary();
                tracing::info!(
                    status = %status,
                    success_count = summary.success_count,
                    failure_count = summary.failure_count,
                    "Batch settled"
                );
                self.notices.push(Notice::BatchComplete(self.items.clone(), summary));
            }
        } else {
            self.reported = false;
        }

        self.progress_tx.send_replace(self.progress());
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerateError;

    type State = BatchState<String, String>;

    fn state(concurrency: usize) -> State {
        BatchState::new(BatchConfig::default().with_concurrency(concurrency).with_max_retries(2))
    }

    fn new_items(ids: &[&str]) -> Vec<NewItem<String>> {
        ids.iter()
            .map(|id| NewItem::new("task", format!("input {}", id)).with_id(*id))
            .collect()
    }

    fn token(state: &State, id: &str) -> u64 {
        state.launched.get(id).copied().unwrap_or_default()
    }

    fn ok(state: &State, id: &str) -> Outcome<String> {
        Outcome {
            epoch: state.epoch,
            token: token(state, id),
            id: id.to_string(),
            result: Ok(format!("result {}", id)),
        }
    }

    fn err(state: &State, id: &str) -> Outcome<String> {
        Outcome {
            epoch: state.epoch,
            token: token(state, id),
            id: id.to_string(),
            result: Err(GenerateError::new("Generation failed")),
        }
    }

    fn generating(state: &State) -> usize {
        state.items().iter().filter(|i| i.status == ItemStatus::Generating).count()
    }

    #[test]
    fn test_add_items_pending_and_unique() {
        let mut s = state(2);
        let ids = s
            .add_items(vec![
                NewItem::new("epic", "a".to_string()),
                NewItem::new("epic", "b".to_string()).with_id(""),
                NewItem::new("epic", "c".to_string()).with_id("c"),
            ])
            .unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(ids[2], "c");
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), 3);
        assert!(s.items().iter().all(|i| i.status == ItemStatus::Pending && i.retry_count == 0));
        assert_eq!(s.status(), BatchStatus::Idle);
    }

    #[test]
    fn test_add_items_rejects_duplicates_atomically() {
        let mut s = state(2);
        s.add_items(new_items(&["a"])).unwrap();

        let err = s.add_items(new_items(&["b", "a"])).unwrap_err();
        assert!(matches!(err, BatchError::DuplicateItem(ref id) if id == "a"));
        assert_eq!(s.items().len(), 1);

        let err = s.add_items(new_items(&["x", "x"])).unwrap_err();
        assert!(matches!(err, BatchError::DuplicateItem(_)));
        assert_eq!(s.items().len(), 1);
    }

    #[test]
    fn test_add_items_rejects_blank_type() {
        let mut s = state(1);
        let err = s.add_items(vec![NewItem::new("  ", "x".to_string())]).unwrap_err();
        assert!(matches!(err, BatchError::InvalidItem(_)));
    }

    #[test]
    fn test_launch_respects_ceiling_and_order() {
        let mut s = state(2);
        s.add_items(new_items(&["a", "b", "c"])).unwrap();
        assert!(s.launch_ready(Instant::now()).is_empty(), "not started yet");

        s.mark_started();
        let launched: Vec<String> = s.launch_ready(Instant::now()).into_iter().map(|l| l.item.id).collect();
        assert_eq!(launched, vec!["a", "b"]);
        assert_eq!(generating(&s), 2);

        s.apply_outcome(ok(&s, "b"));
        let launched: Vec<String> = s.launch_ready(Instant::now()).into_iter().map(|l| l.item.id).collect();
        assert_eq!(launched, vec!["c"]);
        assert!(generating(&s) <= 2);
    }

    #[test]
    fn test_outcomes_update_items_and_notices() {
        let mut s = state(2);
        s.add_items(new_items(&["a", "b"])).unwrap();
        s.mark_started();
        s.launch_ready(Instant::now());

        s.apply_outcome(ok(&s, "a"));
        s.apply_outcome(err(&s, "b"));

        assert_eq!(s.get("a").unwrap().result.as_deref(), Some("result a"));
        assert_eq!(s.get("b").unwrap().error.as_deref(), Some("Generation failed"));
        assert_eq!(s.status(), BatchStatus::Completed);

        let notices = s.take_notices();
        assert_eq!(notices.len(), 3);
        assert!(matches!(notices[0], Notice::ItemComplete(_)));
        assert!(matches!(notices[1], Notice::ItemError(_, ref e) if e == "Generation failed"));
        assert!(matches!(
            notices[2],
            Notice::BatchComplete(_, BatchSummary { success_count: 1, failure_count: 1 })
        ));

        // Reported once only
        assert!(s.take_notices().is_empty());
    }

    #[test]
    fn test_cancel_item_generating_discards_outcome() {
        let mut s = state(2);
        s.add_items(new_items(&["a", "b"])).unwrap();
        s.mark_started();
        s.launch_ready(Instant::now());

        assert!(s.cancel_item("a").unwrap());
        assert_eq!(s.get("a").unwrap().status, ItemStatus::Generating);

        s.apply_outcome(ok(&s, "a"));
        s.apply_outcome(ok(&s, "b"));
        assert_eq!(s.get("a").unwrap().status, ItemStatus::Cancelled);
        assert!(s.get("a").unwrap().result.is_none());
        assert_eq!(s.get("b").unwrap().status, ItemStatus::Completed);
        assert_eq!(s.status(), BatchStatus::Completed);
    }

    #[test]
    fn test_cancel_item_unknown_id_is_error() {
        let mut s = state(1);
        assert!(matches!(s.cancel_item("nope"), Err(BatchError::ItemNotFound(_))));
        assert!(matches!(s.retry_item("nope"), Err(BatchError::ItemNotFound(_))));
    }

    #[test]
    fn test_cancel_all_cancels_pending_and_flags_generating() {
        let mut s = state(1);
        s.add_items(new_items(&["a", "b", "c"])).unwrap();
        s.mark_started();
        s.launch_ready(Instant::now());

        assert!(s.cancel_all());
        assert_eq!(s.status(), BatchStatus::Cancelled);
        assert_eq!(s.get("b").unwrap().status, ItemStatus::Cancelled);
        assert_eq!(s.get("c").unwrap().status, ItemStatus::Cancelled);
        assert_eq!(s.get("a").unwrap().status, ItemStatus::Generating);

        // Not reported until the in-flight call drains
        let notices = s.take_notices();
        assert!(notices.is_empty());

        s.apply_outcome(err(&s, "a"));
        assert_eq!(s.get("a").unwrap().status, ItemStatus::Cancelled);
        let notices = s.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(matches!(notices[0], Notice::BatchComplete(..)));
        assert!(!s.cancel_all());
    }

    #[test]
    fn test_pause_blocks_launches_until_resume() {
        let mut s = state(1);
        s.add_items(new_items(&["a", "b"])).unwrap();
        assert!(!s.pause(), "cannot pause an idle batch");

        s.mark_started();
        s.launch_ready(Instant::now());
        assert!(s.pause());
        assert_eq!(s.status(), BatchStatus::Paused);

        s.apply_outcome(ok(&s, "a"));
        assert_eq!(s.get("a").unwrap().status, ItemStatus::Completed);
        assert!(s.launch_ready(Instant::now()).is_empty());

        assert!(s.resume());
        assert!(!s.resume());
        assert_eq!(s.launch_ready(Instant::now()).len(), 1);
    }

    #[test]
    fn test_retry_item_respects_max_retries() {
        let mut s = state(1);
        s.add_items(new_items(&["a"])).unwrap();
        s.mark_started();

        for round in 1..=2 {
            s.launch_ready(Instant::now());
            s.apply_outcome(err(&s, "a"));
            assert!(s.retry_item("a").unwrap());
            assert_eq!(s.get("a").unwrap().retry_count, round);
        }

        s.launch_ready(Instant::now());
        s.apply_outcome(err(&s, "a"));
        assert!(!s.retry_item("a").unwrap());
        assert_eq!(s.get("a").unwrap().status, ItemStatus::Failed);
        assert_eq!(s.get("a").unwrap().retry_count, 2);
    }

    #[test]
    fn test_retry_failed_only_touches_failed_items() {
        let mut s = state(3);
        s.add_items(new_items(&["a", "b", "c"])).unwrap();
        s.mark_started();
        s.launch_ready(Instant::now());
        s.apply_outcome(err(&s, "a"));
        s.apply_outcome(ok(&s, "b"));
        s.apply_outcome(err(&s, "c"));
        s.take_notices();

        let retried = s.retry_failed();
        assert_eq!(retried, vec!["a", "c"]);
        assert_eq!(s.get("b").unwrap().retry_count, 0);
        assert_eq!(s.status(), BatchStatus::Running);
    }

    #[test]
    fn test_retry_reopens_cancelled_batch() {
        let mut s = state(1);
        s.add_items(new_items(&["a"])).unwrap();
        s.mark_started();
        s.cancel_all();
        assert_eq!(s.status(), BatchStatus::Cancelled);

        assert!(s.retry_item("a").unwrap());
        assert_eq!(s.status(), BatchStatus::Running);
        assert_eq!(s.launch_ready(Instant::now()).len(), 1);
    }

    #[test]
    fn test_remove_item_any_status() {
        let mut s = state(1);
        s.add_items(new_items(&["a", "b"])).unwrap();
        s.mark_started();
        s.launch_ready(Instant::now());

        assert!(s.remove_item("a").is_some());
        assert!(s.remove_item("a").is_none());
        // The orphaned call still frees its slot when it resolves
        s.apply_outcome(ok(&s, "a"));
        assert_eq!(s.launch_ready(Instant::now()).len(), 1);
    }

    #[test]
    fn test_readded_item_ignores_outcome_of_removed_launch() {
        let mut s = state(2);
        s.add_items(new_items(&["a"])).unwrap();
        s.mark_started();
        s.launch_ready(Instant::now());
        let old = ok(&s, "a");

        s.remove_item("a");
        s.add_items(vec![NewItem::new("task", "new".to_string()).with_id("a")]).unwrap();
        s.mark_started();
        let launched = s.launch_ready(Instant::now());
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].item.input, "new");
        assert_ne!(launched[0].token, old.token);

        s.apply_outcome(old);
        assert_eq!(s.get("a").unwrap().status, ItemStatus::Generating);
        assert!(s.get("a").unwrap().result.is_none());
        assert_eq!(s.in_flight(), 1);

        s.apply_outcome(Outcome {
            epoch: s.epoch,
            token: launched[0].token,
            id: "a".to_string(),
            result: Ok("result of new".to_string()),
        });
        assert_eq!(s.get("a").unwrap().result.as_deref(), Some("result of new"));
        assert_eq!(s.in_flight(), 0);
    }

    #[test]
    fn test_reset_ignores_stale_outcomes() {
        let mut s = state(1);
        s.add_items(new_items(&["a"])).unwrap();
        s.mark_started();
        s.launch_ready(Instant::now());
        let stale = ok(&s, "a");

        s.reset();
        assert_eq!(s.status(), BatchStatus::Idle);
        assert!(s.items().is_empty());

        s.add_items(new_items(&["a"])).unwrap();
        s.apply_outcome(stale);
        assert_eq!(s.get("a").unwrap().status, ItemStatus::Pending);
        assert_eq!(s.in_flight(), 0);
    }

    #[test]
    fn test_driver_claim_lifecycle() {
        let mut s = state(1);
        assert_eq!(s.claim_driver(), DriverClaim::NothingToDo);

        s.add_items(new_items(&["a"])).unwrap();
        s.mark_started();
        assert_eq!(s.claim_driver(), DriverClaim::Claimed);
        assert_eq!(s.claim_driver(), DriverClaim::Busy);
        assert!(*s.subscribe_driver().borrow());

        assert!(!s.release_driver_if_idle());
        s.launch_ready(Instant::now());
        s.apply_outcome(ok(&s, "a"));
        assert!(s.release_driver_if_idle());
        assert!(!*s.subscribe_driver().borrow());
    }

    #[test]
    fn test_progress_is_published() {
        let mut s = state(1);
        let rx = s.subscribe_progress();
        s.add_items(new_items(&["a", "b"])).unwrap();
        s.take_notices();
        assert_eq!(rx.borrow().total, 2);
        assert_eq!(rx.borrow().pending, 2);
    }
}

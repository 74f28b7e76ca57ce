//! Pending queue with a concurrency ceiling and launch pacing.
//!
//! The scheduler only decides *which* id goes next and *when*. It never touches
//! item records; the controller applies the status change for every id it hands out.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// FIFO launcher gated by `concurrency` and `item_delay`.
#[derive(Debug)]
pub struct ConcurrencyScheduler {
    concurrency: usize,
    item_delay: Duration,
    /// Ids waiting for a slot, in admission order.
    queue: VecDeque<String>,
    /// Generation calls launched and not yet resolved.
    in_flight: usize,
    /// Earliest instant the next launch may happen (None = no pacing pending).
    next_launch_at: Option<Instant>,
}

impl ConcurrencyScheduler {
    pub fn new(concurrency: usize, item_delay: Duration) -> Self {
        Self {
            concurrency,
            item_delay,
            queue: VecDeque::new(),
            in_flight: 0,
            next_launch_at: None,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_queued(&self, id: &str) -> bool {
        self.queue.iter().any(|queued| queued == id)
    }

    /// Free slots under the ceiling.
    pub fn available_slots(&self) -> usize {
        self.concurrency.saturating_sub(self.in_flight)
    }

    /// Append an id to the back of the queue. Ids already queued are ignored.
    pub fn enqueue(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.is_queued(&id) {
            self.queue.push_back(id);
        }
    }

    /// Drop an id from the queue. Returns whether it was queued.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.queue.iter().position(|queued| queued == id) {
            Some(pos) => {
                self.queue.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Empty the queue, returning the ids in order.
    pub fn drain(&mut self) -> Vec<String> {
        self.queue.drain(..).collect()
    }

    /// Time left before pacing allows another launch.
    pub fn pacing_remaining(&self, now: Instant) -> Option<Duration> {
        self.next_launch_at.and_then(|at| if now < at { Some(at - now) } else { None })
    }

    /// The instant pacing releases, if a launch is being held back by it.
    pub fn pacing_deadline(&self, now: Instant) -> Option<Instant> {
        if self.queue.is_empty() || self.available_slots() == 0 {
            return None;
        }
        self.next_launch_at.filter(|at| now < *at)
    }

    /// Take the next id to launch, if the ceiling and pacing allow it.
    ///
    /// Counts the launch as in flight and arms the pacing delay.
    pub fn next_launch(&mut self, now: Instant) -> Option<String> {
        if self.available_slots() == 0 || self.pacing_remaining(now).is_some() {
            return None;
        }
        let id = self.queue.pop_front()?;
        self.in_flight += 1;
        if !self.item_delay.is_zero() {
            self.next_launch_at = Some(now + self.item_delay);
        }
        tracing::debug!(item_id = %id, in_flight = self.in_flight, "Launching item");
        Some(id)
    }

    /// Record that a launched call has resolved, freeing its slot.
    pub fn finished(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Forget everything, including in-flight accounting.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.in_flight = 0;
        self.next_launch_at = None;
    }
}

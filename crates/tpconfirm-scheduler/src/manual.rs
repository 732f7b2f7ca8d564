use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::clock::{Clock, ManualClock};
use crate::task::{ScheduledTask, Scheduler};

type QueueKey = (Instant, u64);

/// Deterministic scheduler driven by a [`ManualClock`].
///
/// Nothing runs until [`ManualScheduler::run_pending`] or
/// [`ManualScheduler::advance`] is called; tasks due at the same instant run
/// in submission order.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<ManualSchedulerInner>,
}

#[derive(Default)]
struct ManualSchedulerInner {
    clock: ManualClock,
    next_sequence: AtomicU64,
    queue: Mutex<BTreeMap<QueueKey, ScheduledTask>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(&self) -> &ManualClock {
        &self.inner.clock
    }

    pub fn pending(&self) -> usize {
        self.inner
            .queue
            .lock()
            .expect("manual scheduler queue lock poisoned")
            .len()
    }

    /// Runs every task due at the current virtual time, including tasks
    /// those tasks schedule for "now".
    pub fn run_pending(&self) -> usize {
        let now = self.inner.clock.now();
        let mut executed = 0;
        while let Some(task) = self.pop_due(now) {
            task();
            executed += 1;
        }
        executed
    }

    /// Moves virtual time forward, running each task at its due instant.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.inner.clock.now() + by;
        let mut executed = self.run_pending();
        while let Some(due) = self.next_due_at().filter(|due| *due <= target) {
            self.inner.clock.advance_to(due);
            executed += self.run_pending();
        }
        self.inner.clock.advance_to(target);
        executed + self.run_pending()
    }

    fn enqueue(&self, due: Instant, task: ScheduledTask) {
        let sequence = self.inner.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.inner
            .queue
            .lock()
            .expect("manual scheduler queue lock poisoned")
            .insert((due, sequence), task);
    }

    fn next_due_at(&self) -> Option<Instant> {
        self.inner
            .queue
            .lock()
            .expect("manual scheduler queue lock poisoned")
            .keys()
            .next()
            .map(|(due, _)| *due)
    }

    fn pop_due(&self, now: Instant) -> Option<ScheduledTask> {
        let mut queue = self
            .inner
            .queue
            .lock()
            .expect("manual scheduler queue lock poisoned");
        let key = *queue.keys().next().filter(|(due, _)| *due <= now)?;
        queue.remove(&key)
    }
}

impl Scheduler for ManualScheduler {
    fn run_now(&self, task: ScheduledTask) {
        self.enqueue(self.inner.clock.now(), task);
    }

    fn run_after(&self, delay: Duration, task: ScheduledTask) {
        self.enqueue(self.inner.clock.now() + delay, task);
    }
}

//! Cancellable deferred tasks driven by an externally supplied clock.
//!
//! Nothing here sleeps or spawns. The host calls [`TimerQueue::take_due`]
//! with the current instant (typically once per event-loop turn) and acts on
//! whatever has expired. Scheduling returns a [`TimerHandle`] that can be
//! cancelled at any time before it fires.
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Handle to a scheduled task. Handles are never reused within a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct ScheduledTask<K> {
    deadline: Instant,
    kind: K,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    next_handle: u64,
    pending: BTreeMap<TimerHandle, ScheduledTask<K>>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            next_handle: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl<K> TimerQueue<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `kind` to become due `delay` after `now`.
    pub fn schedule(&mut self, now: Instant, delay: Duration, kind: K) -> TimerHandle {
        self.schedule_at(now + delay, kind)
    }

    pub fn schedule_at(&mut self, deadline: Instant, kind: K) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.insert(handle, ScheduledTask { deadline, kind });
        handle
    }

    /// Cancels a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.pending.remove(&handle).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest deadline among pending tasks.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|task| task.deadline).min()
    }

    /// Removes and returns every task whose deadline is at or before `now`,
    /// earliest first. Tasks with equal deadlines keep scheduling order.
    pub fn take_due(&mut self, now: Instant) -> Vec<(TimerHandle, K)> {
        let mut due: Vec<(Instant, TimerHandle)> = self
            .pending
            .iter()
            .filter(|(_, task)| task.deadline <= now)
            .map(|(handle, task)| (task.deadline, *handle))
            .collect();
        due.sort();

        due.into_iter()
            .filter_map(|(_, handle)| {
                self.pending
                    .remove(&handle)
                    .map(|task| (handle, task.kind))
            })
            .collect()
    }
}

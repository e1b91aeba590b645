//! Time-based value stabilization for rapidly changing input.
//!
//! A [`DebounceStabilizer`] holds the latest raw value and a committed
//! (stabilized) value. A raw change starts a quiet-period timer of `delay`;
//! only when that timer expires without another change is the raw value
//! committed. An optional `max_wait` timer forces a commit even while input
//! keeps arriving, subject to [`MaxWaitPolicy`].
//!
//! Time is always injected so hosts drive the stabilizer from their own event
//! loop and tests stay deterministic.
use std::time::{Duration, Instant};

use derive_more::Display;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::timer::{TimerHandle, TimerQueue};

/// How the `max_wait` deadline reacts to further raw changes.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Display, Sequence, Serialize, Deserialize,
)]
pub enum MaxWaitPolicy {
    /// Every raw change restarts the `max_wait` timer. Continuous input can
    /// therefore postpone the forced commit indefinitely.
    #[default]
    #[display("Reset on change")]
    ResetOnChange,
    /// The `max_wait` timer starts with the first change of a burst and is
    /// left alone until it fires or the burst commits.
    #[display("Anchor to burst")]
    AnchorToBurst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceTimer {
    Delay,
    MaxWait,
}

#[derive(Debug, Clone)]
pub struct DebounceStabilizer<T> {
    raw: T,
    committed: T,
    delay: Duration,
    max_wait: Option<Duration>,
    policy: MaxWaitPolicy,
    equals: fn(&T, &T) -> bool,
    timers: TimerQueue<DebounceTimer>,
    delay_timer: Option<TimerHandle>,
    max_wait_timer: Option<TimerHandle>,
}

impl<T: Clone + PartialEq> DebounceStabilizer<T> {
    /// Adopts `initial` as both raw and committed value without a timer.
    #[must_use]
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            raw: initial.clone(),
            committed: initial,
            delay,
            max_wait: None,
            policy: MaxWaitPolicy::default(),
            equals: <T as PartialEq>::eq,
            timers: TimerQueue::new(),
            delay_timer: None,
            max_wait_timer: None,
        }
    }
}

impl<T: Clone> DebounceStabilizer<T> {
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration, policy: MaxWaitPolicy) -> Self {
        self.max_wait = Some(max_wait);
        self.policy = policy;
        self
    }

    /// Replaces the equality used to decide whether a raw value is a change.
    #[must_use]
    pub fn with_equality(mut self, equals: fn(&T, &T) -> bool) -> Self {
        self.equals = equals;
        self
    }

    /// The stabilized value.
    pub fn value(&self) -> &T {
        &self.committed
    }

    /// The most recently observed raw value.
    pub fn raw(&self) -> &T {
        &self.raw
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait
    }

    /// True while a commit is scheduled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.timers.is_empty()
    }

    /// When the host should next call [`Self::poll`].
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Records a raw value observed at `now`.
    ///
    /// Returns false when the value equals the previous raw value, in which
    /// case pending timers are left untouched.
    pub fn update(&mut self, value: T, now: Instant) -> bool {
        if (self.equals)(&value, &self.raw) {
            return false;
        }
        self.raw = value;

        if let Some(handle) = self.delay_timer.take() {
            self.timers.cancel(handle);
        }
        self.delay_timer = Some(self.timers.schedule(now, self.delay, DebounceTimer::Delay));

        if let Some(max_wait) = self.max_wait {
            let restart = match self.policy {
                MaxWaitPolicy::ResetOnChange => true,
                MaxWaitPolicy::AnchorToBurst => self.max_wait_timer.is_none(),
            };
            if restart {
                if let Some(handle) = self.max_wait_timer.take() {
                    self.timers.cancel(handle);
                }
                self.max_wait_timer =
                    Some(self.timers.schedule(now, max_wait, DebounceTimer::MaxWait));
            }
        }
        true
    }

    /// Fires whichever timer is due at `now`.
    ///
    /// On a commit the raw value becomes the stabilized value, the other
    /// timer is cancelled and the new stabilized value is returned.
    pub fn poll(&mut self, now: Instant) -> Option<&T> {
        let (_, fired) = self.timers.take_due(now).into_iter().next()?;
        self.timers.cancel_all();
        self.delay_timer = None;
        self.max_wait_timer = None;
        self.committed = self.raw.clone();
        trace!(
            "debounce commit after {}",
            match fired {
                DebounceTimer::Delay => "quiet period",
                DebounceTimer::MaxWait => "max wait",
            }
        );
        Some(&self.committed)
    }

    /// Cancels every pending timer. No commit happens afterwards unless a new
    /// raw value arrives.
    pub fn cancel_all(&mut self) {
        self.timers.cancel_all();
        self.delay_timer = None;
        self.max_wait_timer = None;
    }
}

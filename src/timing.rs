// Call suppressors driven by an explicit clock reading

use chrono::{DateTime, Duration, Utc};

/// Holds the latest value until `delay` passes without another call
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, DateTime<Utc>)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Replace any pending value and restart the delay
    pub fn call(&mut self, value: T, now: DateTime<Utc>) {
        self.pending = Some((value, now + self.delay));
    }

    /// Release the pending value once its deadline has been reached
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<T> {
        let due = matches!(&self.pending, Some((_, deadline)) if now >= *deadline);
        if !due {
            return None;
        }
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without releasing it
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Lets a call through, then blocks further calls for `cooldown`
#[derive(Debug)]
pub struct Throttle {
    cooldown: Duration,
    last_fired: Option<DateTime<Utc>>,
}

impl Throttle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: None,
        }
    }

    pub fn ready(&self, now: DateTime<Utc>) -> bool {
        self.last_fired.is_none_or(|at| now >= at + self.cooldown)
    }

    /// Run `f` unless inside the cooldown window
    pub fn call<R>(&mut self, now: DateTime<Utc>, f: impl FnOnce() -> R) -> Option<R> {
        if !self.ready(now) {
            return None;
        }
        self.last_fired = Some(now);
        Some(f())
    }
}

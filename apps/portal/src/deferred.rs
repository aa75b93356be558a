//! Single-slot timers.
//!
//! Each slot holds at most one spawned task. Scheduling again aborts the
//! pending task before the new one takes its place, so timers never pile up.
//! Dropping a slot aborts whatever it holds.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Default)]
struct Slot(Mutex<Option<JoinHandle<()>>>);

impl Slot {
    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Aborts the held task. Returns true when it had not finished yet.
    fn abort(&self) -> bool {
        match self.lock().take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        }
    }

    fn is_running(&self) -> bool {
        self.lock().as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if let Some(handle) = self.lock().take() {
            handle.abort();
        }
    }
}

/// Debounce: runs a future once after a delay, unless rescheduled first.
#[derive(Debug, Default)]
pub struct DeferredTask {
    slot: Slot,
}

impl DeferredTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        self.slot.replace(handle);
    }

    /// Returns true when a pending task was cancelled.
    pub fn cancel(&self) -> bool {
        self.slot.abort()
    }

    pub fn is_pending(&self) -> bool {
        self.slot.is_running()
    }
}

/// Runs a job every `period`, first after one full period.
#[derive(Debug, Default)]
pub struct PeriodicTask {
    slot: Slot,
}

impl PeriodicTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any running loop. A zero period starts nothing and returns false.
    pub fn start<F, Fut>(&self, period: Duration, mut job: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if period.is_zero() {
            self.slot.abort();
            return false;
        }
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                job().await;
            }
        });
        self.slot.replace(handle);
        true
    }

    /// Returns true when a running loop was stopped.
    pub fn stop(&self) -> bool {
        self.slot.abort()
    }
}

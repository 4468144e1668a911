//! The single one-shot alarm timer
//!
//! At most one expiry is outstanding at a time. Programming a new expiry
//! cancels the previous one, and every programming gets a fresh generation
//! so an expiry that raced with a cancel can be recognised and ignored.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::SchedulerError;

pub(crate) struct AlarmSlot {
    runtime: Handle,
    pending: Option<JoinHandle<()>>,
    deadline: Option<Instant>,
    generation: u64,
}

impl AlarmSlot {
    /// Claim the timer. Fails outside a tokio runtime.
    pub(crate) fn acquire() -> Result<Self, SchedulerError> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::TimerUnavailable)?;
        Ok(Self {
            runtime,
            pending: None,
            deadline: None,
            generation: 0,
        })
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Program an expiry `delay` from now, replacing any outstanding one.
    /// `on_expiry` receives the generation it was programmed with.
    pub(crate) fn program<F>(&mut self, delay: Duration, on_expiry: F)
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();

        let generation = self.generation;
        let deadline = Instant::now() + delay;
        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            on_expiry(generation);
        }));
        self.deadline = Some(deadline);
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        self.deadline = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Called from the expiry task. Returns false if that programming has
    /// since been cancelled or replaced.
    pub(crate) fn expired(&mut self, generation: u64) -> bool {
        if self.pending.is_none() || generation != self.generation {
            return false;
        }
        // The task is finishing on its own; no abort needed.
        self.pending = None;
        self.deadline = None;
        true
    }

    /// Time left until the outstanding expiry, if one is programmed.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

impl Drop for AlarmSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

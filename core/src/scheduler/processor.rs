//! Action processor
//!
//! Runs in a background task, receiving fire events from the handoff queue
//! and invoking the device action. The expiry path only ever enqueues with
//! `try_send`, so slow actions never hold up the alarm timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};

use acsched_types::TimerAction;

/// Capability that drives the external device.
pub trait ActionSink: Send + Sync + 'static {
    fn fire(&self, action: TimerAction);
}

impl<F> ActionSink for F
where
    F: Fn(TimerAction) + Send + Sync + 'static,
{
    fn fire(&self, action: TimerAction) {
        self(action)
    }
}

/// One queued action request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireEvent {
    pub id: u8,
    pub action: TimerAction,
    /// Requested through `force_fire` rather than by the alarm
    pub forced: bool,
}

/// Create the bounded handoff queue.
pub(crate) fn handoff_queue(capacity: usize) -> (mpsc::Sender<FireEvent>, mpsc::Receiver<FireEvent>) {
    mpsc::channel(capacity.max(1))
}

/// Enqueue without blocking. A full or closed queue drops the event.
pub(crate) fn enqueue(events: &mpsc::Sender<FireEvent>, event: FireEvent) -> bool {
    match events.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            tracing::warn!(id = event.id, action = %event.action, "Handoff queue full, dropping fire event");
            false
        }
        Err(TrySendError::Closed(event)) => {
            tracing::warn!(id = event.id, action = %event.action, "Action processor gone, dropping fire event");
            false
        }
    }
}

/// Consumer side of the handoff queue
pub struct ActionProcessor {
    events: mpsc::Receiver<FireEvent>,
    sink: Arc<dyn ActionSink>,
    /// Pause before each action so it lands clear of the minute boundary
    settle_delay: Duration,
}

impl ActionProcessor {
    pub fn new(
        events: mpsc::Receiver<FireEvent>,
        sink: Arc<dyn ActionSink>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            events,
            sink,
            settle_delay,
        }
    }

    /// Run until the queue is closed
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            if !self.settle_delay.is_zero() {
                tokio::time::sleep(self.settle_delay).await;
            }

            tracing::info!(
                id = event.id,
                action = %event.action,
                forced = event.forced,
                "Executing timer action"
            );
            self.sink.fire(event.action);
        }

        tracing::debug!("Handoff queue closed, action processor exiting");
    }
}

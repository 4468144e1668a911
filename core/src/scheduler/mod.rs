//! Scheduler lifecycle and control surface
//!
//! A [`Scheduler`] owns the timer table, the single alarm timer and the
//! action processor task. All table mutations, whether from the control
//! surface or from an alarm expiry, run under one mutex and are followed by a
//! rearm, so the programmed expiry always reflects the current table.
//!
//! ```text
//! store → table → next_alarm → alarm timer ─(expiry)→ fire_due ─┬→ store
//!                     ↑                                          └→ queue → processor → sink
//!                     └───────────────── rearm ←─────────────────┘
//! ```

mod arming;
mod error;
mod handler;
mod processor;


pub use error::SchedulerError;
pub use processor::{ActionProcessor, ActionSink, FireEvent};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use acsched_types::{SchedulerConfig, TimerAction, TimerEntry};

use crate::clock::{self, Clock, TimeZone};
use crate::store::TimerStore;
use crate::timers::{NextAlarm, TimerTable, next_alarm};
use arming::AlarmSlot;

/// State shared between the control surface and the alarm expiry task.
struct Shared {
    table: TimerTable,
    clock: Arc<dyn Clock>,
    timezone: TimeZone,
    alarm: AlarmSlot,
    /// Wall-clock instant the outstanding alarm was programmed for, if it is
    /// a fire alarm rather than a retry or midnight wake-up
    armed_for: Option<DateTime<Utc>>,
    events: mpsc::Sender<FireEvent>,
    sync_retry: Duration,
    this: Weak<Mutex<Shared>>,
}

impl Shared {
    /// Reprogram the alarm timer from the current table and clock.
    fn rearm(&mut self) {
        self.catch_up();
        self.alarm.cancel();
        self.armed_for = None;

        let now = self.clock.now();
        if !clock::is_synchronized(now) {
            if self.table.has_enabled() {
                tracing::debug!(
                    retry_secs = self.sync_retry.as_secs(),
                    "Clock not synchronized, retrying later"
                );
                self.program(self.sync_retry);
            }
            return;
        }

        match next_alarm(now, &self.timezone, self.table.entries()) {
            Some(next) => {
                tracing::debug!(at = %next.at, delay = ?next.delay, due = ?next.due, "Alarm armed");
                self.program(next.delay);
                self.armed_for = Some(next.at);
            }
            None if self.table.has_enabled() => match self.until_local_midnight(now) {
                Some(delay) => {
                    tracing::debug!(delay = ?delay, "Nothing due today, waking at local midnight");
                    self.program(delay);
                }
                None => tracing::warn!("No local midnight after now, alarm idle"),
            },
            None => tracing::debug!("No pending timers, alarm idle"),
        }
    }

    fn program(&mut self, delay: Duration) {
        let this = self.this.clone();
        self.alarm.program(delay, move |generation| {
            if let Some(shared) = this.upgrade() {
                lock(&shared).on_expiry(generation);
            }
        });
    }

    /// Alarm expiry: fire whatever is due right now, then rearm.
    fn on_expiry(&mut self, generation: u64) {
        if !self.alarm.expired(generation) {
            tracing::debug!(generation, "Ignoring stale alarm expiry");
            return;
        }

        self.armed_for = None;
        // Trust the clock, not the instant the alarm was programmed for.
        self.fire_due(self.clock.now());
        self.rearm();
    }

    /// Fire the outstanding alarm's entries if the wall clock has reached
    /// them before the timer task ran.
    fn catch_up(&mut self) {
        let Some(at) = self.armed_for else {
            return;
        };
        let now = self.clock.now();
        if now < at {
            return;
        }

        tracing::debug!(at = %at, "Alarm instant passed before expiry, firing now");
        self.armed_for = None;
        self.fire_due(now);
    }

    fn fire_due(&mut self, now: DateTime<Utc>) {
        if !clock::is_synchronized(now) {
            tracing::debug!("Clock not synchronized, skipping fire check");
            return;
        }

        let local_now = self.timezone.local(now);
        for event in handler::fire_due(&mut self.table, local_now) {
            processor::enqueue(&self.events, event);
        }
    }

    /// Delay until the start of the next local day.
    fn until_local_midnight(&self, now: DateTime<Utc>) -> Option<Duration> {
        let tomorrow = self.timezone.local(now).date().succ_opt()?;
        let midnight = self.timezone.to_utc(tomorrow.and_time(NaiveTime::MIN));
        (midnight - now).to_std().ok()
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Persistent time-of-day scheduler for on/off device actions.
pub struct Scheduler {
    shared: Arc<Mutex<Shared>>,
    processor: JoinHandle<()>,
}

impl Scheduler {
    /// Load the table from `store`, start the action processor and arm the
    /// alarm timer.
    ///
    /// Must be called from within a tokio runtime; otherwise there is no
    /// timer to drive the schedule and [`SchedulerError::TimerUnavailable`]
    /// is returned.
    pub fn start<S, A>(
        config: &SchedulerConfig,
        store: S,
        clock: Arc<dyn Clock>,
        sink: A,
    ) -> Result<Self, SchedulerError>
    where
        S: TimerStore + 'static,
        A: ActionSink,
    {
        let alarm = AlarmSlot::acquire()?;
        let timezone = timezone_from(
            config.timezone.gmt_offset_secs,
            config.timezone.daylight_offset_secs,
        )?;

        let mut table = TimerTable::new(Box::new(store));
        table.load();

        let (events, queue) = processor::handoff_queue(config.queue_capacity);
        let processor = ActionProcessor::new(
            queue,
            Arc::new(sink),
            Duration::from_millis(config.settle_delay_ms),
        );
        let processor = alarm.runtime().spawn(processor.run());

        let shared = Arc::new_cyclic(|this| {
            Mutex::new(Shared {
                table,
                clock,
                timezone,
                alarm,
                armed_for: None,
                events,
                sync_retry: Duration::from_secs(config.sync_retry_secs.max(1)),
                this: this.clone(),
            })
        });
        lock(&shared).rearm();

        tracing::info!(
            offset_secs = timezone.offset_secs(),
            queue_capacity = config.queue_capacity,
            "Scheduler started"
        );

        Ok(Self { shared, processor })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Control Surface
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a timer in the first free slot and return its id.
    pub fn add_timer(
        &self,
        hour: u8,
        minute: u8,
        action: TimerAction,
        repeat_daily: bool,
    ) -> Result<u8, SchedulerError> {
        let mut shared = lock(&self.shared);
        let id = shared.table.add(hour, minute, action, repeat_daily)?;
        shared.rearm();
        Ok(id)
    }

    pub fn remove_timer(&self, id: u8) -> Result<(), SchedulerError> {
        let mut shared = lock(&self.shared);
        shared.table.remove(id)?;
        shared.rearm();
        Ok(())
    }

    pub fn set_enabled(&self, id: u8, enabled: bool) -> Result<(), SchedulerError> {
        let mut shared = lock(&self.shared);
        shared.table.set_enabled(id, enabled)?;
        shared.rearm();
        Ok(())
    }

    /// Queue the entry's action right away, leaving its schedule untouched.
    pub fn force_fire(&self, id: u8) -> Result<(), SchedulerError> {
        let shared = lock(&self.shared);
        let entry = shared.table.enabled_slot(id)?;

        processor::enqueue(
            &shared.events,
            FireEvent {
                id,
                action: entry.action,
                forced: true,
            },
        );
        Ok(())
    }

    pub fn get_timer(&self, id: u8) -> Option<TimerEntry> {
        lock(&self.shared).table.get(id)
    }

    /// Enabled timers in id order
    pub fn list_timers(&self) -> Vec<TimerEntry> {
        lock(&self.shared).table.list_enabled()
    }

    pub fn has_active_timers(&self) -> bool {
        lock(&self.shared).table.has_enabled()
    }

    /// Change the local offset used for hour, minute and date, and rearm.
    pub fn set_timezone(
        &self,
        gmt_offset_secs: i32,
        daylight_offset_secs: i32,
    ) -> Result<(), SchedulerError> {
        let timezone = timezone_from(gmt_offset_secs, daylight_offset_secs)?;

        let mut shared = lock(&self.shared);
        // Anything already due fires under the zone it was armed with.
        shared.catch_up();
        shared.timezone = timezone;
        shared.rearm();

        tracing::info!(offset_secs = timezone.offset_secs(), "Time zone changed");
        Ok(())
    }

    pub fn timezone(&self) -> TimeZone {
        lock(&self.shared).timezone
    }

    /// Write every slot to the store.
    pub fn save_all(&self) -> Result<(), SchedulerError> {
        lock(&self.shared).table.save_all()?;
        Ok(())
    }

    /// Reprogram the alarm now, e.g. right after the clock has synchronized
    /// instead of waiting for the retry backoff.
    pub fn rearm(&self) {
        lock(&self.shared).rearm();
    }

    /// The next alarm as computed from the current clock and table.
    pub fn next_alarm(&self) -> Option<NextAlarm> {
        let shared = lock(&self.shared);
        next_alarm(shared.clock.now(), &shared.timezone, shared.table.entries())
    }

    /// Time until the programmed alarm expiry, if one is outstanding.
    pub fn armed_in(&self) -> Option<Duration> {
        lock(&self.shared).alarm.remaining()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Teardown
    // ─────────────────────────────────────────────────────────────────────────

    /// Stop scheduling. Durable records are left as they are.
    pub fn stop(self) {
        tracing::info!("Scheduler stopped");
    }

    /// Stop scheduling and disable and delete every timer.
    ///
    /// Once this returns no alarm expiry or queued action is observed.
    pub fn cancel_all(mut self) -> Result<(), SchedulerError> {
        self.halt();
        lock(&self.shared).table.disable_all()?;
        tracing::info!("All timers cancelled");
        Ok(())
    }

    /// Cancel the alarm and the action processor. Queued events are
    /// discarded with the processor.
    fn halt(&mut self) {
        lock(&self.shared).alarm.cancel();
        self.processor.abort();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.halt();
    }
}

fn timezone_from(gmt_offset_secs: i32, daylight_offset_secs: i32) -> Result<TimeZone, SchedulerError> {
    TimeZone::new(gmt_offset_secs, daylight_offset_secs).ok_or(SchedulerError::InvalidTimeZone {
        gmt_offset_secs,
        daylight_offset_secs,
    })
}

//! Alarm expiry handling
//!
//! Runs on the expiry path, so it only touches the table and the store and
//! returns the events to enqueue. It never waits on the action itself.

use chrono::{NaiveDateTime, Timelike};

use acsched_types::TimerEntry;

use super::processor::FireEvent;
use crate::clock::date_code;
use crate::timers::TimerTable;

/// Fire every enabled entry due at the local minute of `local_now`.
///
/// Each due entry gets today's date recorded; one-shot entries are disabled
/// and deleted, daily entries are persisted with the new date. An entry that
/// already fired today is skipped. Returns one event per fired entry, in id
/// order.
pub(crate) fn fire_due(table: &mut TimerTable, local_now: NaiveDateTime) -> Vec<FireEvent> {
    let today = date_code(local_now.date());
    let (hour, minute) = (local_now.hour(), local_now.minute());

    let due: Vec<TimerEntry> = table
        .entries()
        .iter()
        .filter(|e| e.enabled)
        .filter(|e| u32::from(e.hour) == hour && u32::from(e.minute) == minute)
        .filter(|e| e.last_fired_date != today)
        .copied()
        .collect();

    due.iter()
        .map(|entry| {
            if let Err(e) = table.record_fire(entry.id, today) {
                tracing::error!(id = entry.id, error = %e, "Failed to persist fired timer");
            }

            tracing::info!(
                id = entry.id,
                time = %entry.time_label(),
                action = %entry.action,
                repeat_daily = entry.repeat_daily,
                "Timer fired"
            );

            FireEvent {
                id: entry.id,
                action: entry.action,
                forced: false,
            }
        })
        .collect()
}

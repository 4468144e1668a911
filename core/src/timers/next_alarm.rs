//! Next-alarm calculation
//!
//! Given the current instant and the timer slots, find the earliest instant
//! strictly in the future at which an enabled entry is due.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};

use acsched_types::TimerEntry;

use crate::clock::{TimeZone, date_code, is_synchronized};

/// The next instant the alarm timer should expire at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextAlarm {
    /// Absolute fire instant (always on a whole local minute)
    pub at: DateTime<Utc>,
    /// Time from `now` until `at`; never zero
    pub delay: Duration,
    /// Ids of the entries due at `at`, in id order
    pub due: Vec<u8>,
}

/// Compute the next alarm, or `None` when nothing can be scheduled.
///
/// An unsynchronized clock never yields an alarm. Entries that already fired
/// today are only considered again tomorrow, and only if they repeat; a
/// one-shot entry whose time has passed today is expired for good.
pub fn next_alarm(now: DateTime<Utc>, tz: &TimeZone, entries: &[TimerEntry]) -> Option<NextAlarm> {
    if !is_synchronized(now) {
        return None;
    }

    let local_now = tz.local(now);
    let today = date_code(local_now.date());
    let mut next: Option<NextAlarm> = None;

    for entry in entries.iter().filter(|e| e.enabled) {
        let Some(local_at) = candidate(entry, local_now, today) else {
            continue;
        };
        let at = tz.to_utc(local_at);

        // Negative deltas fail the conversion.
        let Ok(delay) = (at - now).to_std() else {
            continue;
        };
        if delay.is_zero() {
            continue;
        }

        match next.as_mut() {
            Some(best) if best.at < at => {}
            Some(best) if best.at == at => best.due.push(entry.id),
            _ => {
                next = Some(NextAlarm {
                    at,
                    delay,
                    due: vec![entry.id],
                })
            }
        }
    }

    next
}

/// Local fire instant for one entry, relative to `local_now`.
fn candidate(entry: &TimerEntry, local_now: NaiveDateTime, today: u32) -> Option<NaiveDateTime> {
    let fired_today = entry.last_fired_date == today;
    if fired_today && !entry.repeat_daily {
        return None;
    }

    let time = NaiveTime::from_hms_opt(u32::from(entry.hour), u32::from(entry.minute), 0)?;
    let at = local_now.date().and_time(time);

    if at > local_now && !fired_today {
        return Some(at);
    }
    if !entry.repeat_daily {
        return None;
    }
    at.checked_add_signed(chrono::Duration::days(1))
}

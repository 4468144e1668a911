//! Persisted record format
//!
//! One record per enabled slot, six comma-separated ASCII integers:
//! `enabled,repeat_daily,hour,minute,action,last_fired_date`, where `action`
//! is the ordinal of [`TimerAction`] and `last_fired_date` is `YYYYMMDD` or 0.

use acsched_types::{TimerAction, TimerEntry};

/// Encode an entry as a store record.
pub fn encode(entry: &TimerEntry) -> String {
    format!(
        "{},{},{},{},{},{}",
        u8::from(entry.enabled),
        u8::from(entry.repeat_daily),
        entry.hour,
        entry.minute,
        entry.action.ordinal(),
        entry.last_fired_date
    )
}

/// Decode a store record for slot `id`.
///
/// Returns `None` for anything that is not six integers with an in-range
/// hour, minute and action; the caller treats that slot as disabled.
pub fn decode(id: u8, record: &str) -> Option<TimerEntry> {
    let fields = record
        .split(',')
        .map(|field| field.trim().parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()?;

    let [enabled, repeat, hour, minute, action, last_fired] = fields.as_slice() else {
        return None;
    };

    let hour = u8::try_from(*hour).ok().filter(|h| *h <= 23)?;
    let minute = u8::try_from(*minute).ok().filter(|m| *m <= 59)?;

    Some(TimerEntry {
        id,
        hour,
        minute,
        action: TimerAction::from_ordinal(*action)?,
        enabled: *enabled != 0,
        repeat_daily: *repeat != 0,
        last_fired_date: u32::try_from(*last_fired).ok()?,
    })
}

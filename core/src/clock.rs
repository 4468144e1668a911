//! Wall clock access and local calendar conversion
//!
//! The scheduler never reads the system time directly. It goes through a
//! [`Clock`] so tests can drive it with a [`ManualClock`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

use acsched_types::TimeZoneConfig;

/// Anything earlier than one day after the epoch means the clock has not
/// been synchronized yet.
const SYNC_THRESHOLD_SECS: i64 = 86_400;

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The host's real-time clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// A clock that has never been synchronized (reads the epoch)
    pub fn unsynchronized() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|guard| *guard)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Whether `now` is a plausible synchronized reading.
pub fn is_synchronized(now: DateTime<Utc>) -> bool {
    now.timestamp() >= SYNC_THRESHOLD_SECS
}

// ─────────────────────────────────────────────────────────────────────────────
// Local Calendar
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed local offset used to derive hour, minute and calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZone {
    offset: FixedOffset,
}

impl TimeZone {
    /// Build from GMT and daylight offsets. Returns `None` when the combined
    /// offset is not strictly within one day.
    pub fn new(gmt_offset_secs: i32, daylight_offset_secs: i32) -> Option<Self> {
        let total = gmt_offset_secs.checked_add(daylight_offset_secs)?;
        FixedOffset::east_opt(total).map(|offset| Self { offset })
    }

    pub fn from_config(config: &TimeZoneConfig) -> Option<Self> {
        Self::new(config.gmt_offset_secs, config.daylight_offset_secs)
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn offset_secs(&self) -> i32 {
        self.offset.local_minus_utc()
    }

    /// Local wall-clock reading of an instant
    pub fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    /// Convert a local wall-clock reading back to an instant
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        (local - Duration::seconds(i64::from(self.offset_secs()))).and_utc()
    }
}

impl Default for TimeZone {
    fn default() -> Self {
        Self::from_config(&TimeZoneConfig::default()).unwrap_or_else(Self::utc)
    }
}

/// Encode a calendar date as `YYYYMMDD`.
pub fn date_code(date: NaiveDate) -> u32 {
    // Years before 1 never occur on a synchronized clock.
    let year = u32::try_from(date.year()).unwrap_or(0);
    year * 10_000 + date.month() * 100 + date.day()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    #[test]
    fn epoch_is_not_synchronized() {
        assert!(!is_synchronized(DateTime::<Utc>::UNIX_EPOCH));
        assert!(!is_synchronized(Utc.timestamp_opt(86_399, 0).unwrap()));
        assert!(is_synchronized(Utc.timestamp_opt(86_400, 0).unwrap()));
    }

    #[test]
    fn date_code_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(date_code(date), 20260307);
    }

    #[test]
    fn timezone_combines_gmt_and_daylight() {
        let tz = TimeZone::new(-3 * 3600, 3600).unwrap();
        assert_eq!(tz.offset_secs(), -2 * 3600);

        let instant = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let local = tz.local(instant);
        assert_eq!(local.to_string(), "2026-10-17 10:00:00");
        assert_eq!(tz.to_utc(local), instant);
    }

    #[test]
    fn local_date_rolls_back_across_midnight() {
        let tz = TimeZone::new(-3 * 3600, 0).unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 10, 17, 1, 30, 0).unwrap();
        assert_eq!(date_code(tz.local(instant).date()), 20261016);
    }

    #[test]
    fn timezone_rejects_offsets_beyond_a_day() {
        assert!(TimeZone::new(86_400, 0).is_none());
        assert!(TimeZone::new(82_800, 7_200).is_none());
        assert!(TimeZone::new(i32::MAX, 1).is_none());
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::unsynchronized();
        let other = clock.clone();
        other.advance(Duration::days(2));
        assert!(is_synchronized(clock.now()));
    }
}

//! Shared timer and configuration types for acsched
//!
//! This crate contains the serializable types that are shared between the
//! scheduling engine (acsched-core) and the command line front end.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of timer slots. Slot ids are always in `0..MAX_TIMERS`.
pub const MAX_TIMERS: usize = 8;

// ─────────────────────────────────────────────────────────────────────────────
// Timer Entries
// ─────────────────────────────────────────────────────────────────────────────

/// What a timer does to the device when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
    #[default]
    On,
    Off,
}

impl TimerAction {
    /// Zero-based ordinal used in persisted records (0 = on, 1 = off)
    pub fn ordinal(self) -> u8 {
        match self {
            TimerAction::On => 0,
            TimerAction::Off => 1,
        }
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        match ordinal {
            0 => Some(TimerAction::On),
            1 => Some(TimerAction::Off),
            _ => None,
        }
    }
}

impl fmt::Display for TimerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerAction::On => f.write_str("on"),
            TimerAction::Off => f.write_str("off"),
        }
    }
}

impl FromStr for TimerAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(TimerAction::On),
            "off" => Ok(TimerAction::Off),
            other => Err(format!("unknown action '{other}' (expected 'on' or 'off')")),
        }
    }
}

/// One scheduled trigger occupying a table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEntry {
    /// Slot index, stable while the slot is occupied
    pub id: u8,
    /// Local hour of day (0-23)
    pub hour: u8,
    /// Local minute (0-59)
    pub minute: u8,
    pub action: TimerAction,
    /// Disabled entries are logically absent
    pub enabled: bool,
    /// One-shot entries disable themselves after firing
    pub repeat_daily: bool,
    /// `YYYYMMDD` of the last fire, 0 if never fired
    pub last_fired_date: u32,
}

impl TimerEntry {
    /// An unoccupied slot
    pub fn vacant(id: u8) -> Self {
        Self {
            id,
            hour: 0,
            minute: 0,
            action: TimerAction::On,
            enabled: false,
            repeat_daily: false,
            last_fired_date: 0,
        }
    }

    /// `HH:MM` label for display
    pub fn time_label(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Local time offset applied when deriving hour, minute and date.
///
/// The effective offset is `gmt_offset_secs + daylight_offset_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeZoneConfig {
    #[serde(default = "default_gmt_offset")]
    pub gmt_offset_secs: i32,
    #[serde(default)]
    pub daylight_offset_secs: i32,
}

impl Default for TimeZoneConfig {
    fn default() -> Self {
        Self {
            gmt_offset_secs: default_gmt_offset(),
            daylight_offset_secs: 0,
        }
    }
}

impl TimeZoneConfig {
    pub fn utc() -> Self {
        Self {
            gmt_offset_secs: 0,
            daylight_offset_secs: 0,
        }
    }
}

/// Tunables for the scheduling engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Capacity of the handoff queue between the expiry context and the
    /// action processor. Events beyond this are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Delay applied by the action processor before invoking an action
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Backoff between rearm attempts while the clock is unsynchronized
    #[serde(default = "default_sync_retry_secs")]
    pub sync_retry_secs: u64,

    #[serde(default)]
    pub timezone: TimeZoneConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            settle_delay_ms: default_settle_delay_ms(),
            sync_retry_secs: default_sync_retry_secs(),
            timezone: TimeZoneConfig::default(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Serde Helpers
// ═══════════════════════════════════════════════════════════════════════════

fn default_gmt_offset() -> i32 {
    -3 * 3600
}

fn default_queue_capacity() -> usize {
    10
}

fn default_settle_delay_ms() -> u64 {
    200
}

fn default_sync_retry_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_ordinals_match_record_format() {
        assert_eq!(TimerAction::On.ordinal(), 0);
        assert_eq!(TimerAction::Off.ordinal(), 1);
        assert_eq!(TimerAction::from_ordinal(1), Some(TimerAction::Off));
        assert_eq!(TimerAction::from_ordinal(2), None);
        assert_eq!(TimerAction::from_ordinal(-1), None);
    }

    #[test]
    fn action_parses_case_insensitively() {
        assert_eq!("ON".parse::<TimerAction>(), Ok(TimerAction::On));
        assert_eq!("off".parse::<TimerAction>(), Ok(TimerAction::Off));
        assert!("toggle".parse::<TimerAction>().is_err());
    }

    #[test]
    fn vacant_entry_is_disabled_and_never_fired() {
        let entry = TimerEntry::vacant(3);
        assert_eq!(entry.id, 3);
        assert!(!entry.enabled);
        assert_eq!(entry.last_fired_date, 0);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: SchedulerConfig = toml::from_str("").unwrap();
        assert_eq!(config, SchedulerConfig::default());
        assert_eq!(config.timezone.gmt_offset_secs, -10800);
    }

    #[test]
    fn partial_timezone_fills_daylight_offset() {
        let config: SchedulerConfig =
            toml::from_str("[timezone]\ngmt_offset_secs = 3600\n").unwrap();
        assert_eq!(config.timezone.gmt_offset_secs, 3600);
        assert_eq!(config.timezone.daylight_offset_secs, 0);
        assert_eq!(config.queue_capacity, 10);
    }
}

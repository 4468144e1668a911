//! Error types for the scheduler lifecycle and control surface

use thiserror::Error;

use crate::store::StoreError;
use crate::timers::TimerError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No runtime is available to drive the alarm timer. Nothing can be
    /// scheduled, so this is fatal for `start`.
    #[error("no alarm timer available: the scheduler must be started inside a tokio runtime")]
    TimerUnavailable,

    #[error("invalid time zone: {gmt_offset_secs}s GMT offset + {daylight_offset_secs}s daylight offset")]
    InvalidTimeZone {
        gmt_offset_secs: i32,
        daylight_offset_secs: i32,
    },

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("failed to persist timers")]
    Store(#[from] StoreError),
}

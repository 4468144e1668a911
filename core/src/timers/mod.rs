//! Timer table and next-alarm calculation
//!
//! This module provides:
//! - **Table**: the fixed set of timer slots, loaded from and written back to
//!   a [`TimerStore`](crate::store::TimerStore)
//! - **Next alarm**: the pure calculation of the next instant at which any
//!   enabled entry is due
//!
//! # Entry lifecycle
//!
//! 1. `add` claims the first disabled slot and persists it
//! 2. The entry fires at its local hour:minute, recording today's date
//! 3. One-shot entries are disabled and deleted on their first fire;
//!    daily entries are rescheduled for the next day

mod error;
mod next_alarm;
mod table;


pub use error::TimerError;
pub use next_alarm::{NextAlarm, next_alarm};
pub use table::TimerTable;

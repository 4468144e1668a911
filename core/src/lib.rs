pub mod clock;
pub mod scheduler;
pub mod store;
pub mod timers;

// Re-exports for convenience
pub use acsched_types::{MAX_TIMERS, SchedulerConfig, TimeZoneConfig, TimerAction, TimerEntry};
pub use clock::{Clock, ManualClock, SystemClock, TimeZone};
pub use scheduler::{ActionProcessor, ActionSink, FireEvent, Scheduler, SchedulerError};
pub use store::{FileStore, MemoryStore, StoreError, TimerStore};
pub use timers::{NextAlarm, TimerError, TimerTable, next_alarm};

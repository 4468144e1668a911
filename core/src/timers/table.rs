//! Fixed-capacity timer table
//!
//! The table is the source of truth while running. Every mutation is written
//! through to the store; a slot without a record is disabled.

use acsched_types::{MAX_TIMERS, TimerAction, TimerEntry};

use super::TimerError;
use crate::store::{StoreError, TimerStore, key_for, record};

/// The in-memory timer slots and their backing store.
pub struct TimerTable {
    slots: [TimerEntry; MAX_TIMERS],
    store: Box<dyn TimerStore>,
}

impl std::fmt::Debug for TimerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerTable")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

impl TimerTable {
    /// Create a table with every slot vacant. Call [`load`](Self::load) to
    /// populate it from the store.
    pub fn new(store: Box<dyn TimerStore>) -> Self {
        Self {
            slots: std::array::from_fn(|i| TimerEntry::vacant(slot_id(i))),
            store,
        }
    }

    /// Populate every slot from the store.
    ///
    /// Missing or malformed records leave the slot disabled and never fired.
    /// Returns the number of enabled entries loaded.
    pub fn load(&mut self) -> usize {
        for index in 0..MAX_TIMERS {
            let id = slot_id(index);
            let key = key_for(id);

            let loaded = match self.store.get(&key) {
                Ok(Some(value)) => {
                    let decoded = record::decode(id, &value);
                    if decoded.is_none() {
                        tracing::warn!(id, record = %value, "Ignoring malformed timer record");
                    }
                    decoded
                }
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(id, error = %e, "Failed to read timer record");
                    None
                }
            };

            let previous = self.slots[index];
            self.slots[index] = loaded.unwrap_or(TimerEntry {
                enabled: false,
                last_fired_date: 0,
                ..previous
            });
        }

        let enabled = self.slots.iter().filter(|e| e.enabled).count();
        tracing::info!(enabled, "Loaded timer table");
        enabled
    }

    /// Claim the first disabled slot for a new entry.
    pub fn add(
        &mut self,
        hour: u8,
        minute: u8,
        action: TimerAction,
        repeat_daily: bool,
    ) -> Result<u8, TimerError> {
        if hour > 23 {
            return Err(TimerError::invalid(format!("hour {hour} is outside 0-23")));
        }
        if minute > 59 {
            return Err(TimerError::invalid(format!(
                "minute {minute} is outside 0-59"
            )));
        }

        let index = self
            .slots
            .iter()
            .position(|e| !e.enabled)
            .ok_or(TimerError::CapacityExceeded {
                capacity: MAX_TIMERS,
            })?;

        let entry = TimerEntry {
            id: slot_id(index),
            hour,
            minute,
            action,
            enabled: true,
            repeat_daily,
            last_fired_date: 0,
        };
        self.commit(entry)?;

        tracing::info!(
            id = entry.id,
            time = %entry.time_label(),
            %action,
            repeat_daily,
            "Timer added"
        );
        Ok(entry.id)
    }

    /// Disable an enabled entry and delete its record.
    pub fn remove(&mut self, id: u8) -> Result<(), TimerError> {
        let current = self.enabled_slot(id)?;

        let entry = TimerEntry {
            enabled: false,
            repeat_daily: false,
            last_fired_date: 0,
            ..current
        };
        self.commit(entry)?;

        tracing::info!(id, "Timer removed");
        Ok(())
    }

    /// Toggle an entry. A change of state resets its last fired date.
    pub fn set_enabled(&mut self, id: u8, enabled: bool) -> Result<(), TimerError> {
        let current = self
            .get(id)
            .ok_or_else(|| TimerError::invalid(format!("timer id {id} is out of range")))?;

        let mut entry = TimerEntry { enabled, ..current };
        if current.enabled != enabled {
            entry.last_fired_date = 0;
        }
        self.commit(entry)?;

        tracing::info!(id, enabled, "Timer enabled state changed");
        Ok(())
    }

    /// Slot contents for `id`, or `None` when out of range.
    pub fn get(&self, id: u8) -> Option<TimerEntry> {
        self.slots.get(usize::from(id)).copied()
    }

    /// Enabled entries, ordered by id.
    pub fn list_enabled(&self) -> Vec<TimerEntry> {
        self.slots.iter().filter(|e| e.enabled).copied().collect()
    }

    pub fn has_enabled(&self) -> bool {
        self.slots.iter().any(|e| e.enabled)
    }

    /// All slots, enabled or not.
    pub fn entries(&self) -> &[TimerEntry] {
        &self.slots
    }

    /// Write every slot's current state to the store.
    pub fn save_all(&mut self) -> Result<(), StoreError> {
        for index in 0..MAX_TIMERS {
            let entry = self.slots[index];
            self.persist(&entry)?;
        }
        Ok(())
    }

    /// Disable every slot and delete every record.
    ///
    /// All slots are cleared in memory even if a delete fails; the first
    /// failure is returned.
    pub fn disable_all(&mut self) -> Result<(), StoreError> {
        let mut first_error = None;

        for index in 0..MAX_TIMERS {
            let slot = &mut self.slots[index];
            slot.enabled = false;
            slot.last_fired_date = 0;

            if let Err(e) = self.store.delete(&key_for(slot.id)) {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Record that `id` fired on `today` (`YYYYMMDD`).
    ///
    /// One-shot entries are disabled and their record deleted; daily entries
    /// keep their slot with the new date. The in-memory state is updated even
    /// when persisting fails.
    pub(crate) fn record_fire(&mut self, id: u8, today: u32) -> Result<(), StoreError> {
        let Some(slot) = self.slots.get_mut(usize::from(id)) else {
            return Ok(());
        };

        slot.last_fired_date = today;
        if !slot.repeat_daily {
            slot.enabled = false;
        }

        let entry = *slot;
        self.persist(&entry)
    }

    pub(crate) fn enabled_slot(&self, id: u8) -> Result<TimerEntry, TimerError> {
        match self.get(id) {
            Some(entry) if entry.enabled => Ok(entry),
            Some(_) => Err(TimerError::invalid(format!("timer {id} is not enabled"))),
            None => Err(TimerError::invalid(format!("timer id {id} is out of range"))),
        }
    }

    /// Persist `entry` and, on success, store it in its slot.
    fn commit(&mut self, entry: TimerEntry) -> Result<(), TimerError> {
        self.persist(&entry)?;
        self.slots[usize::from(entry.id)] = entry;
        Ok(())
    }

    fn persist(&mut self, entry: &TimerEntry) -> Result<(), StoreError> {
        let key = key_for(entry.id);
        if entry.enabled {
            self.store.put(&key, &record::encode(entry))
        } else if self.store.has(&key)? {
            self.store.delete(&key)
        } else {
            Ok(())
        }
    }
}

fn slot_id(index: usize) -> u8 {
    debug_assert!(index < MAX_TIMERS);
    index as u8
}

//! Durable key-value persistence of timer slots.
//!
//! Each enabled slot is stored as one comma-separated record under the key
//! `t{id}` (`t0`, `t1`, ...). A missing key means the slot is disabled.

mod error;
mod file;
mod memory;
pub mod record;

#[cfg(test)]
mod failing;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

#[cfg(test)]
pub(crate) use failing::FailingStore;

use std::path::PathBuf;

const KEY_PREFIX: &str = "t";

/// Backing key-value store for timer records.
///
/// Writes are expected to be synchronous and quick; they happen on the
/// expiry path.
pub trait TimerStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: TimerStore + ?Sized> TimerStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        (**self).has(key)
    }
}

/// Store key for a slot id.
pub fn key_for(id: u8) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Default location of the timer store file.
/// Resolves to `~/.local/share/acsched/timers.toml` on Linux.
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("acsched")
        .join("timers.toml")
}

//! Store double whose writes can be made to fail

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{MemoryStore, StoreError, TimerStore};

/// Wraps a [`MemoryStore`]. While failing, `put` and `delete` return a write
/// error and leave the contents alone. Reads always succeed.
#[derive(Debug, Clone, Default)]
pub(crate) struct FailingStore {
    inner: MemoryStore,
    failing: Arc<AtomicBool>,
}

impl FailingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn contents(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                path: PathBuf::from("failing-store"),
                source: std::io::Error::other("disk unavailable"),
            });
        }
        Ok(())
    }
}

impl TimerStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put(key, value)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete(key)
    }
}

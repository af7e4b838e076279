//! Per-key lock table.
//!
//! Backends without a native conditional write serialize read-modify-write
//! operations on the same key through this table. Different keys get different
//! mutexes, so unrelated codes never wait on each other.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

/// A table of mutexes keyed by string, created on demand.
///
/// An entry is dropped as soon as no caller holds or waits on it, so the table
/// only grows with the number of keys under concurrent use.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        // Clone the handle out of the map so the shard lock is released
        // before blocking on the key's own mutex.
        let lock = Arc::clone(self.locks.entry(key.to_string()).or_default().value());

        let result = {
            let _guard = lock.lock();
            f()
        };

        drop(lock);
        // The count is read under the shard's write lock, the same lock
        // `entry` takes, so no handle can be handed out concurrently.
        self.locks.remove_if(key, |_, l| Arc::strong_count(l) == 1);

        result
    }

    /// Number of keys currently locked or awaited.
    #[must_use]
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

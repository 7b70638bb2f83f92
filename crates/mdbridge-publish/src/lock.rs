//! Per-target publish serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mutexes keyed by publish target (page title or issue key).
///
/// At most one closure runs per key at a time; different keys do not block each other.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(key);
        let _guard = lock.lock().unwrap();
        f()
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        Arc::clone(locks.entry(key.to_owned()).or_default())
    }
}

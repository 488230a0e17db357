use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;

/// A table of per-key locks
///
/// Only keys currently held are kept in the table.
#[derive(Default, Debug)]
pub struct KeyLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `key` is free, then hold it until the guard is dropped
    pub fn lock(&self, key: &str) -> KeyGuard<'_> {
        let mut held = self.held.lock();
        while held.contains(key) {
            self.released.wait(&mut held);
        }
        held.insert(key.to_owned());

        KeyGuard {
            locks: self,
            key: key.to_owned(),
        }
    }

    /// Number of keys currently held
    pub fn held(&self) -> usize {
        self.held.lock().len()
    }
}

/// Releases its key on drop
#[derive(Debug)]
#[must_use = "the key is released as soon as the guard is dropped"]
pub struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: String,
}

impl KeyGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock();
        held.remove(&self.key);
        self.locks.released.notify_all();
    }
}

use parking_lot::RwLock;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure reported by a state store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("state error at {key}: {reason}")]
pub struct StoreError {
    pub key: String,
    pub reason: String,
}

impl StoreError {
    pub fn new(key: impl Into<String>, reason: impl ToString) -> Self {
        StoreError {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// A byte-oriented key-value state store
///
/// No transactions and no conditional writes are assumed. Implementations
/// must be shareable between threads, so writes take `&self`.
pub trait Store: Send + Sync {
    /// Get the bytes stored under `key`.
    ///
    /// An entry holding zero bytes is reported as `None`.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing whatever was there.
    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for &S {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        (**self).put_state(key, value)
    }
}

impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        (**self).put_state(key, value)
    }
}

/// A simple store that uses an in-memory BTreeMap
#[derive(Default, Debug)]
pub struct MemStore {
    inner: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemStore {
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Snapshot of all keys, in order
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }
}

impl Clone for MemStore {
    fn clone(&self) -> Self {
        MemStore {
            inner: RwLock::new(self.inner.read().clone()),
        }
    }
}

impl Store for MemStore {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let inner = self.inner.read();
        Ok(inner.get(key).filter(|v| !v.is_empty()).cloned())
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.inner.write().insert(key.to_owned(), value);
        Ok(())
    }
}

impl From<Vec<(String, Vec<u8>)>> for MemStore {
    fn from(item: Vec<(String, Vec<u8>)>) -> Self {
        MemStore {
            inner: RwLock::new(item.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_entries_read_as_absent() {
        let store = MemStore::default();
        assert_eq!(store.get_state("alice").unwrap(), None);

        store.put_state("alice", vec![]).unwrap();
        assert_eq!(store.get_state("alice").unwrap(), None);
        assert_eq!(store.len(), 1);

        store.put_state("alice", b"yes".to_vec()).unwrap();
        assert_eq!(store.get_state("alice").unwrap(), Some(b"yes".to_vec()));
    }

    #[test]
    fn clone_is_a_snapshot() {
        let store = MemStore::from(vec![("a".to_owned(), b"1".to_vec())]);
        let snapshot = store.clone();
        store.put_state("b", b"2".to_vec()).unwrap();

        assert_eq!(store.keys(), vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(snapshot.keys(), vec!["a".to_owned()]);
        assert!(!snapshot.is_empty());
    }
}

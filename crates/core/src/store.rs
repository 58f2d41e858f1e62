//! Key-value store seam.
//!
//! The election lives under a single key. The store must make
//! [`KeyValueStore::compare_and_swap`] atomic for that key; everything else
//! about durability and replication belongs to the implementation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;
use crate::Version;

/// Trait for the backing store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Unconditionally write `value` under `key`.
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Write `value` only if the current value still has version `expected`
    /// (`None` meaning the key must be absent). Returns `false` when another
    /// writer got there first.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Version>,
        value: Vec<u8>,
    ) -> Result<bool, StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Version>,
        value: Vec<u8>,
    ) -> Result<bool, StoreError> {
        (**self).compare_and_swap(key, expected, value)
    }
}

/// In-process store guarded by a mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Version>,
        value: Vec<u8>,
    ) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        let current = entries.get(key).map(|bytes| Version::of(bytes));
        if current != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), value);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("1").unwrap(), None);
    }

    #[test]
    fn put_then_get() {
        let store = MemoryStore::new();
        store.put("1", b"v1".to_vec()).unwrap();
        store.put("1", b"v2".to_vec()).unwrap();
        assert_eq!(store.get("1").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn cas_on_absent_key() {
        let store = MemoryStore::new();
        assert!(store.compare_and_swap("1", None, b"first".to_vec()).unwrap());
        // Key now exists, so "expect absent" must fail.
        assert!(!store.compare_and_swap("1", None, b"second".to_vec()).unwrap());
        assert_eq!(store.get("1").unwrap(), Some(b"first".to_vec()));
    }

    #[test]
    fn cas_rejects_stale_version() {
        let store = MemoryStore::new();
        store.put("1", b"v1".to_vec()).unwrap();
        let stale = Version::of(b"v1");

        store.put("1", b"v2".to_vec()).unwrap();

        assert!(!store.compare_and_swap("1", Some(stale), b"v3".to_vec()).unwrap());
        assert!(store
            .compare_and_swap("1", Some(Version::of(b"v2")), b"v3".to_vec())
            .unwrap());
        assert_eq!(store.get("1").unwrap(), Some(b"v3".to_vec()));
    }
}

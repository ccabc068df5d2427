//! Test stores — mock `KeyValueStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use treasure_core::error::GameError;
use treasure_core::store::KeyValueStore;

/// A key-value store that keeps values in memory and records every write
/// and removal, so tests can assert that each mutation was persisted.
#[derive(Debug, Default)]
pub struct RecordingStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
    removals: Mutex<Vec<String>>,
}

impl RecordingStore {
    /// Create an empty recording store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `value` under `key`. The seed is
    /// not counted as a write.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        store
    }

    /// Returns the value currently stored under `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    /// Returns a snapshot of all `(key, value)` writes, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    /// Returns the keys removed so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn removals(&self) -> Vec<String> {
        self.removals.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, GameError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), GameError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        self.writes
            .lock()
            .unwrap()
            .push((key.to_owned(), value.to_owned()));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), GameError> {
        self.values.lock().unwrap().remove(key);
        self.removals.lock().unwrap().push(key.to_owned());
        Ok(())
    }
}

/// A key-value store that always returns a persistence error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, GameError> {
        Err(GameError::Persistence("storage unavailable".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), GameError> {
        Err(GameError::Persistence("storage unavailable".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), GameError> {
        Err(GameError::Persistence("storage unavailable".into()))
    }
}

/// A `RecordingStore` whose first write stalls for a fixed delay before it
/// lands. Lets tests overlap an in-flight save with later operations.
#[derive(Debug)]
pub struct SlowStore {
    inner: RecordingStore,
    first_write_delay: Duration,
    stalled: AtomicBool,
}

impl SlowStore {
    /// Create an empty store whose first `set` sleeps for `first_write_delay`.
    #[must_use]
    pub fn new(first_write_delay: Duration) -> Self {
        Self {
            inner: RecordingStore::new(),
            first_write_delay,
            stalled: AtomicBool::new(false),
        }
    }

    /// Returns the value currently stored under `key`.
    pub fn value(&self, key: &str) -> Option<String> {
        self.inner.value(key)
    }

    /// Returns a snapshot of all `(key, value)` writes, in landing order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.inner.writes()
    }
}

#[async_trait]
impl KeyValueStore for SlowStore {
    async fn get(&self, key: &str) -> Result<Option<String>, GameError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), GameError> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.first_write_delay).await;
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), GameError> {
        self.inner.remove(key).await
    }
}

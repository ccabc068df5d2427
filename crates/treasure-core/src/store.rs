//! Key-value store abstraction used by the save slot.

use async_trait::async_trait;

use crate::error::GameError;

/// A string-keyed store of string values.
///
/// Single-writer, single-key overwrite semantics: `set` replaces the whole
/// value and there are no multi-key transactions.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value under `key`, or `None` if nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<String>, GameError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), GameError>;

    /// Removes the value under `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), GameError>;
}

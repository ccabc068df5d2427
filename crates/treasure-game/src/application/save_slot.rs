//! Save slot: the game state's persistence adapter.
//!
//! The whole `GameState` is serialized to JSON and stored under one key of a
//! `KeyValueStore`. Loads fail soft: a missing, unreadable or corrupt record
//! is reported as "no save" and logged, never propagated.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use treasure_core::error::GameError;
use treasure_core::store::KeyValueStore;
use treasure_core::time::Clock;

use crate::domain::state::GameState;

/// One save record under a fixed key.
#[derive(Clone)]
pub struct SaveSlot {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    key: String,
}

impl std::fmt::Debug for SaveSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveSlot").field("key", &self.key).finish_non_exhaustive()
    }
}

impl SaveSlot {
    /// Creates a slot storing under `key`, stamping saves with `clock`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, key: impl Into<String>) -> Self {
        Self {
            store,
            clock,
            key: key.into(),
        }
    }

    /// The store key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the saved state, or `None` if there is no usable record.
    pub async fn load(&self) -> Option<GameState> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no save record");
                return None;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read save record");
                return None;
            }
        };

        match serde_json::from_str::<GameState>(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(key = %self.key, error = %e, "ignoring corrupt save record");
                None
            }
        }
    }

    /// Writes `state`, stamped with the current time, replacing the record.
    ///
    /// Returns the state as written.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Persistence` if the store write fails.
    pub async fn save(&self, state: &GameState) -> Result<GameState, GameError> {
        let stamped = GameState {
            saved_at: Some(self.clock.now()),
            ..state.clone()
        };
        let raw = serde_json::to_string(&stamped)
            .map_err(|e| GameError::Persistence(format!("save serialization failed: {e}")))?;
        self.store.set(&self.key, &raw).await?;
        debug!(key = %self.key, "save record written");
        Ok(stamped)
    }

    /// Removes the record.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Persistence` if the store removal fails.
    pub async fn clear(&self) -> Result<(), GameError> {
        self.store.remove(&self.key).await
    }

    /// The `savedAt` of the stored record, if there is a usable one.
    pub async fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.load().await.and_then(|state| state.saved_at)
    }
}

//! Game state and the persisted save record.
//!
//! `GameState` serializes directly to the save record:
//!
//! ```json
//! {
//!   "currentScene": "sea",
//!   "progress": {
//!     "library": {
//!       "sceneId": "library",
//!       "data": { "found": true },
//!       "completedAt": "2026-01-15T10:00:00Z"
//!     }
//!   },
//!   "savedAt": "2026-01-15T10:00:05Z"
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::scenes::SceneRegistry;

/// Record of a completed story in one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    /// Scene the story belongs to.
    pub scene_id: String,
    /// Scene-specific reward fields, e.g. `found: true`.
    #[serde(default)]
    pub data: Map<String, Value>,
    /// When the story completed.
    pub completed_at: DateTime<Utc>,
}

/// The single save slot's contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// The open scene, if any.
    #[serde(default)]
    pub current_scene: Option<String>,
    /// Completed stories keyed by scene id.
    #[serde(default)]
    pub progress: BTreeMap<String, ProgressEntry>,
    /// When the state was last written to the save slot.
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl GameState {
    /// Returns the progress entry for `scene_id`, if its story was completed.
    #[must_use]
    pub fn progress_for(&self, scene_id: &str) -> Option<&ProgressEntry> {
        self.progress.get(scene_id)
    }

    /// Records (or overwrites) the progress entry for its scene.
    pub fn record_progress(&mut self, entry: ProgressEntry) {
        self.progress.insert(entry.scene_id.clone(), entry);
    }

    /// Drops references to scenes the registry does not know.
    ///
    /// Returns `true` if anything was removed.
    pub fn sanitize(&mut self, registry: &SceneRegistry) -> bool {
        let mut changed = false;

        if let Some(id) = self.current_scene.as_deref() {
            if !registry.contains(id) {
                warn!(scene_id = id, "dropping unknown current scene from save");
                self.current_scene = None;
                changed = true;
            }
        }

        let before = self.progress.len();
        self.progress.retain(|id, entry| {
            let keep = registry.contains(id) && entry.scene_id == *id;
            if !keep {
                warn!(scene_id = %id, "dropping progress for unknown scene from save");
            }
            keep
        });
        changed || self.progress.len() != before
    }
}

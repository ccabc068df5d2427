//! Scene registry.

use std::collections::HashSet;

use serde::Serialize;
use treasure_core::error::GameError;

/// Hotspot placement on the panorama, in percent of its width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    /// Horizontal offset from the left edge.
    pub x: f32,
    /// Vertical offset from the top edge.
    pub y: f32,
}

/// A place the player can open from the panorama.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    /// Stable identifier, used as the save-file key for progress.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Background music track the presentation layer plays while open.
    pub music_ref: String,
    /// Hotspot placement.
    pub position: Position,
}

impl Scene {
    /// Creates a scene.
    #[must_use]
    pub fn new(id: &str, title: &str, music_ref: &str, x: f32, y: f32) -> Self {
        Self {
            id: id.to_owned(),
            title: title.to_owned(),
            music_ref: music_ref.to_owned(),
            position: Position { x, y },
        }
    }
}

/// Ordered, read-only set of scenes.
#[derive(Debug, Clone)]
pub struct SceneRegistry {
    scenes: Vec<Scene>,
}

impl SceneRegistry {
    /// Builds a registry, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns `GameError::DuplicateScene` if two scenes share an id.
    pub fn new(scenes: Vec<Scene>) -> Result<Self, GameError> {
        let mut seen = HashSet::new();
        for scene in &scenes {
            if !seen.insert(scene.id.as_str()) {
                return Err(GameError::DuplicateScene(scene.id.clone()));
            }
        }
        Ok(Self { scenes })
    }

    /// The four scenes of the reference game.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            scenes: vec![
                Scene::new("library", "Ancient Library", "bg_music_library", 12.0, 18.0),
                Scene::new("temple", "Temple Ruins", "bg_music_temple", 46.0, 30.0),
                Scene::new("sea", "Sea Voyage", "bg_music_sea", 70.0, 60.0),
                Scene::new("cave", "Cave Expedition", "bg_music_cave", 30.0, 68.0),
            ],
        }
    }

    /// All scenes in registration order.
    #[must_use]
    pub fn list(&self) -> &[Scene] {
        &self.scenes
    }

    /// Looks a scene up by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// Returns whether `id` names a registered scene.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }
}

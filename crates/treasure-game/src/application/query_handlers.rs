//! Read-only views for the presentation layer's status area.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::scenes::SceneRegistry;
use crate::domain::session::Phase;
use crate::domain::state::GameState;

/// Playback phase as shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseView {
    /// No scene open.
    Idle,
    /// A scene is open.
    SceneOpen,
    /// A story is playing.
    StoryPlaying,
}

/// Id and title of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    /// Scene identifier.
    pub id: String,
    /// Display title.
    pub title: String,
}

/// Read-only snapshot of the game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameView {
    /// Playback phase.
    pub phase: PhaseView,
    /// The open scene, if any.
    pub current_scene: Option<SceneSummary>,
    /// Scenes whose story was completed, in registry order.
    pub completed_scenes: Vec<SceneSummary>,
    /// Total number of scenes.
    pub total_scenes: usize,
    /// When the state was last saved.
    pub saved_at: Option<DateTime<Utc>>,
}

/// Builds the view of `state` in `phase`.
#[must_use]
pub fn build_view(state: &GameState, phase: &Phase, registry: &SceneRegistry) -> GameView {
    let phase = match phase {
        Phase::Idle => PhaseView::Idle,
        Phase::SceneOpen { .. } => PhaseView::SceneOpen,
        Phase::StoryPlaying { .. } => PhaseView::StoryPlaying,
    };
    let summary = |id: &str| {
        registry.find(id).map(|s| SceneSummary {
            id: s.id.clone(),
            title: s.title.clone(),
        })
    };

    GameView {
        phase,
        current_scene: state.current_scene.as_deref().and_then(summary),
        completed_scenes: registry
            .list()
            .iter()
            .filter(|s| state.progress.contains_key(&s.id))
            .filter_map(|s| summary(s.id.as_str()))
            .collect(),
        total_scenes: registry.list().len(),
        saved_at: state.saved_at,
    }
}

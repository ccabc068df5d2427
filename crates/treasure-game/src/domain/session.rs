//! The session state machine.
//!
//! `GameSession` owns the `GameState` and the playback phase and validates
//! every transition. It is synchronous: the controller locks it for each
//! transition and never holds it across an await.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use treasure_core::cancel::CancellationToken;
use treasure_core::error::GameError;

use super::scenes::SceneRegistry;
use super::state::{GameState, ProgressEntry};
use super::stories::{Story, StoryLibrary, StoryOutcome};

/// Where the player is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No scene open.
    Idle,
    /// A scene is open and nothing is playing.
    SceneOpen {
        /// The open scene.
        scene_id: String,
    },
    /// A story is playing in the open scene.
    StoryPlaying {
        /// The open scene.
        scene_id: String,
        /// Identifies this playback among all runs of the session.
        run_id: u64,
    },
}

/// A playback handed out by [`GameSession::begin_story`].
#[derive(Debug, Clone)]
pub struct StoryRun {
    /// Identifies this playback.
    pub run_id: u64,
    /// Scene being played.
    pub scene_id: String,
    /// The script.
    pub story: Arc<Story>,
    /// Flag the run checks between lines.
    pub cancel: CancellationToken,
}

/// What [`GameSession::finish_story`] did with a run's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSettlement {
    /// The run was current; progress was recorded.
    Recorded,
    /// The run was current but ended early; nothing was recorded.
    Discarded,
    /// The scene was closed, reopened or reset while the run played.
    Superseded,
}

/// Game state plus playback phase.
#[derive(Debug)]
pub struct GameSession {
    state: GameState,
    phase: Phase,
    cancel: Option<CancellationToken>,
    next_run_id: u64,
}

impl GameSession {
    /// Wraps a loaded (or empty) state. The session starts `Idle`; the
    /// controller reopens a saved scene explicitly.
    #[must_use]
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            phase: Phase::Idle,
            cancel: None,
            next_run_id: 1,
        }
    }

    /// The current game state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Opens `scene_id`, superseding any playback.
    ///
    /// Returns the scene's existing progress entry, if any.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownScene` if the registry has no such scene;
    /// the session is left unchanged.
    pub fn open_scene(
        &mut self,
        registry: &SceneRegistry,
        scene_id: &str,
    ) -> Result<Option<ProgressEntry>, GameError> {
        if !registry.contains(scene_id) {
            return Err(GameError::UnknownScene(scene_id.to_owned()));
        }
        self.cancel_run();
        self.state.current_scene = Some(scene_id.to_owned());
        self.phase = Phase::SceneOpen {
            scene_id: scene_id.to_owned(),
        };
        Ok(self.state.progress_for(scene_id).cloned())
    }

    /// Closes the open scene from any phase. Returns `true` if a story was
    /// playing.
    pub fn close_scene(&mut self) -> bool {
        let was_playing = self.cancel_run();
        self.state.current_scene = None;
        self.phase = Phase::Idle;
        was_playing
    }

    /// Starts playback in the open scene.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NoSceneOpen` when idle,
    /// `GameError::StoryAlreadyPlaying` while another run is in flight, and
    /// `GameError::NoStory` if the library has nothing for the scene.
    pub fn begin_story(&mut self, library: &StoryLibrary) -> Result<StoryRun, GameError> {
        let scene_id = match &self.phase {
            Phase::Idle => return Err(GameError::NoSceneOpen),
            Phase::StoryPlaying { scene_id, .. } => {
                return Err(GameError::StoryAlreadyPlaying(scene_id.clone()));
            }
            Phase::SceneOpen { scene_id } => scene_id.clone(),
        };
        let story = library
            .story_for(&scene_id)
            .ok_or_else(|| GameError::NoStory(scene_id.clone()))?;

        let run_id = self.next_run_id;
        self.next_run_id += 1;
        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());
        self.phase = Phase::StoryPlaying {
            scene_id: scene_id.clone(),
            run_id,
        };

        Ok(StoryRun {
            run_id,
            scene_id,
            story,
            cancel,
        })
    }

    /// Requests the running story to stop at its next line boundary.
    ///
    /// Returns the scene being played.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NoStoryPlaying` unless a story is playing.
    pub fn stop_story(&mut self) -> Result<String, GameError> {
        match &self.phase {
            Phase::StoryPlaying { scene_id, .. } => {
                if let Some(cancel) = &self.cancel {
                    cancel.cancel();
                }
                Ok(scene_id.clone())
            }
            Phase::Idle | Phase::SceneOpen { .. } => Err(GameError::NoStoryPlaying),
        }
    }

    /// Settles a finished run.
    ///
    /// A completed run records progress stamped `completed_at`. Either way
    /// the phase returns to `SceneOpen`, unless the run was superseded, in
    /// which case nothing changes.
    pub fn finish_story(
        &mut self,
        run_id: u64,
        outcome: &StoryOutcome,
        completed_at: DateTime<Utc>,
    ) -> RunSettlement {
        let scene_id = match &self.phase {
            Phase::StoryPlaying {
                scene_id,
                run_id: current,
            } if *current == run_id => scene_id.clone(),
            _ => return RunSettlement::Superseded,
        };

        self.cancel = None;
        let settlement = match outcome {
            StoryOutcome::Completed { reward, .. } => {
                self.state.record_progress(ProgressEntry {
                    scene_id: scene_id.clone(),
                    data: reward.clone(),
                    completed_at,
                });
                RunSettlement::Recorded
            }
            StoryOutcome::Interrupted { .. } => RunSettlement::Discarded,
        };
        self.phase = Phase::SceneOpen { scene_id };
        settlement
    }

    /// Restores the empty state from any phase.
    pub fn reset(&mut self) {
        self.cancel_run();
        self.state = GameState::default();
        self.phase = Phase::Idle;
    }

    /// Records the save timestamp after a successful write.
    pub fn mark_saved(&mut self, saved_at: Option<DateTime<Utc>>) {
        self.state.saved_at = saved_at;
    }

    fn cancel_run(&mut self) -> bool {
        match self.cancel.take() {
            Some(cancel) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Map, Value};

    fn completed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn completed(key: &str) -> StoryOutcome {
        let mut reward = Map::new();
        reward.insert(key.to_owned(), Value::Bool(true));
        StoryOutcome::Completed {
            lines: vec!["line".into()],
            reward,
        }
    }

    fn open(scene: &str) -> GameSession {
        let mut session = GameSession::new(GameState::default());
        session
            .open_scene(&SceneRegistry::reference(), scene)
            .unwrap();
        session
    }

    #[test]
    fn test_open_scene_sets_current_scene() {
        let session = open("temple");

        assert_eq!(session.state().current_scene.as_deref(), Some("temple"));
        assert_eq!(
            session.phase(),
            &Phase::SceneOpen {
                scene_id: "temple".into()
            }
        );
    }

    #[test]
    fn test_open_unknown_scene_leaves_session_unchanged() {
        let mut session = open("temple");

        let result = session.open_scene(&SceneRegistry::reference(), "attic");

        assert_eq!(result, Err(GameError::UnknownScene("attic".into())));
        assert_eq!(session.state().current_scene.as_deref(), Some("temple"));
    }

    #[test]
    fn test_begin_story_requires_open_scene() {
        let mut session = GameSession::new(GameState::default());

        let result = session.begin_story(&StoryLibrary::reference());

        assert!(matches!(result, Err(GameError::NoSceneOpen)));
        assert_eq!(session.phase(), &Phase::Idle);
    }

    #[test]
    fn test_begin_story_rejects_second_run() {
        let mut session = open("sea");
        let library = StoryLibrary::reference();
        session.begin_story(&library).unwrap();

        let second = session.begin_story(&library);

        assert!(matches!(second, Err(GameError::StoryAlreadyPlaying(id)) if id == "sea"));
    }

    #[test]
    fn test_begin_story_without_story_fails() {
        let mut session = open("sea");

        let result = session.begin_story(&StoryLibrary::default());

        assert!(matches!(result, Err(GameError::NoStory(id)) if id == "sea"));
        assert_eq!(session.phase(), &Phase::SceneOpen { scene_id: "sea".into() });
    }

    #[test]
    fn test_finish_completed_run_records_progress() {
        // Arrange
        let mut session = open("library");
        let run = session.begin_story(&StoryLibrary::reference()).unwrap();

        // Act
        let settlement = session.finish_story(run.run_id, &completed("found"), completed_at());

        // Assert
        assert_eq!(settlement, RunSettlement::Recorded);
        let entry = session.state().progress_for("library").unwrap();
        assert_eq!(entry.data.get("found"), Some(&Value::Bool(true)));
        assert_eq!(entry.completed_at, completed_at());
        assert_eq!(
            session.phase(),
            &Phase::SceneOpen {
                scene_id: "library".into()
            }
        );
    }

    #[test]
    fn test_stop_story_cancels_token() {
        let mut session = open("cave");
        let run = session.begin_story(&StoryLibrary::reference()).unwrap();

        let scene = session.stop_story().unwrap();

        assert_eq!(scene, "cave");
        assert!(run.cancel.is_cancelled());
    }

    #[test]
    fn test_stop_story_when_not_playing_fails() {
        let mut session = open("cave");

        assert_eq!(session.stop_story(), Err(GameError::NoStoryPlaying));
    }

    #[test]
    fn test_close_scene_supersedes_running_story() {
        // Arrange
        let mut session = open("sea");
        let run = session.begin_story(&StoryLibrary::reference()).unwrap();

        // Act
        let was_playing = session.close_scene();
        let settlement = session.finish_story(run.run_id, &completed("sea"), completed_at());

        // Assert
        assert!(was_playing);
        assert!(run.cancel.is_cancelled());
        assert_eq!(settlement, RunSettlement::Superseded);
        assert!(session.state().progress.is_empty());
        assert_eq!(session.phase(), &Phase::Idle);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = open("library");
        let run = session.begin_story(&StoryLibrary::reference()).unwrap();
        session.finish_story(run.run_id, &completed("found"), completed_at());

        session.reset();

        assert_eq!(session.state(), &GameState::default());
        assert_eq!(session.phase(), &Phase::Idle);
    }
}

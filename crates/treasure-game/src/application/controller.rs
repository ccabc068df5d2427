//! Game controller.
//!
//! Orchestrates the session state machine: validate and apply a transition
//! under the session lock, release the lock, persist, then notify the
//! observer. Story playback runs outside the lock so `stop_story`,
//! `close_scene` and `reset_game` can be called while a story is playing.
//!
//! Store writes are serialized behind a separate async gate. Each write
//! snapshots the state only once it holds the gate, so the last write to
//! land always carries the latest state, and a reset's removal cannot be
//! overtaken by a write that started before it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{error, info, instrument, warn};
use treasure_core::error::GameError;
use treasure_core::rng::{DeterministicRng, StdRandom};
use treasure_core::store::KeyValueStore;
use treasure_core::time::{Clock, Pacer, SystemClock, TokioPacer};

use crate::application::query_handlers::{self, GameView};
use crate::application::save_slot::SaveSlot;
use crate::config::GameConfig;
use crate::domain::events::{GameEvent, GameObserver, StoryStatus};
use crate::domain::scenes::{Scene, SceneRegistry};
use crate::domain::session::{GameSession, Phase, RunSettlement};
use crate::domain::state::GameState;
use crate::domain::stories::{
    StoryContext, StoryInterruption, StoryLibrary, StoryOutcome, run_story,
};

/// Injected collaborators of a controller.
#[derive(Clone)]
pub struct GameServices {
    /// Stamps saves and completed progress.
    pub clock: Arc<dyn Clock>,
    /// Source of story checkpoint draws.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    /// Schedules the pause before each story line.
    pub pacer: Arc<dyn Pacer>,
    /// Backing store of the save slot.
    pub store: Arc<dyn KeyValueStore>,
    /// Receives notifications.
    pub observer: Arc<dyn GameObserver>,
}

impl GameServices {
    /// Production services: system clock, OS-seeded RNG and real-time pacing
    /// scaled by `config.pacing_scale`.
    #[must_use]
    pub fn production(
        config: &GameConfig,
        store: Arc<dyn KeyValueStore>,
        observer: Arc<dyn GameObserver>,
    ) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            rng: Arc::new(Mutex::new(StdRandom::from_os())),
            pacer: Arc::new(TokioPacer::new(config.pacing_scale)),
            store,
            observer,
        }
    }
}

/// Owns the game session and drives it.
pub struct GameController {
    registry: SceneRegistry,
    library: StoryLibrary,
    session: Mutex<GameSession>,
    save_slot: SaveSlot,
    persist_gate: tokio::sync::Mutex<()>,
    clock: Arc<dyn Clock>,
    rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    pacer: Arc<dyn Pacer>,
    observer: Arc<dyn GameObserver>,
}

impl std::fmt::Debug for GameController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameController")
            .field("registry", &self.registry)
            .field("save_slot", &self.save_slot)
            .finish_non_exhaustive()
    }
}

impl GameController {
    /// Creates a controller over an empty game without touching the save.
    #[must_use]
    pub fn new(
        config: &GameConfig,
        registry: SceneRegistry,
        library: StoryLibrary,
        services: GameServices,
    ) -> Self {
        let save_slot = SaveSlot::new(
            services.store,
            Arc::clone(&services.clock),
            config.save_key.clone(),
        );
        Self {
            registry,
            library,
            session: Mutex::new(GameSession::new(GameState::default())),
            save_slot,
            persist_gate: tokio::sync::Mutex::new(()),
            clock: services.clock,
            rng: services.rng,
            pacer: services.pacer,
            observer: services.observer,
        }
    }

    /// Creates a controller from the saved game.
    ///
    /// A missing or corrupt save starts an empty game. If the save names an
    /// open scene, that scene is reopened, which replays the
    /// restored-progress line when the scene has progress.
    pub async fn start(
        config: &GameConfig,
        registry: SceneRegistry,
        library: StoryLibrary,
        services: GameServices,
    ) -> Self {
        let controller = Self::new(config, registry, library, services);

        let Some(mut loaded) = controller.save_slot.load().await else {
            info!("starting a new game");
            return controller;
        };
        loaded.sanitize(&controller.registry);
        let resume = loaded.current_scene.clone();
        *controller.lock() = GameSession::new(loaded);
        info!(current_scene = ?resume, "save restored");

        if let Some(scene_id) = resume {
            // Sanitized above, so the scene exists.
            if let Err(e) = controller.open_scene(&scene_id).await {
                error!(error = %e, "failed to reopen saved scene");
            }
        }
        controller
    }

    /// The scene registry.
    #[must_use]
    pub fn scenes(&self) -> &[Scene] {
        self.registry.list()
    }

    /// A copy of the current game state.
    #[must_use]
    pub fn state(&self) -> GameState {
        self.lock().state().clone()
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lock().phase().clone()
    }

    /// Read-only snapshot for the status area.
    #[must_use]
    pub fn view(&self) -> GameView {
        let session = self.lock();
        query_handlers::build_view(session.state(), session.phase(), &self.registry)
    }

    /// Opens a scene and starts its music.
    ///
    /// A story playing in another (or the same) scene is cancelled and its
    /// result discarded.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownScene` if `scene_id` is not registered.
    #[instrument(skip(self))]
    pub async fn open_scene(&self, scene_id: &str) -> Result<(), GameError> {
        let restored = self.lock().open_scene(&self.registry, scene_id)?;
        info!("scene opened");

        self.persist().await;
        self.emit(GameEvent::MusicChanged(self.music_for(scene_id)));
        if let Some(entry) = restored {
            match serde_json::to_string(&entry) {
                Ok(json) => self.emit(GameEvent::LogLine(format!("restored progress: {json}"))),
                Err(e) => warn!(error = %e, "failed to render restored progress"),
            }
        }
        Ok(())
    }

    /// Closes the open scene and silences music. Callable in any phase; a
    /// playing story is asked to stop and its result discarded.
    #[instrument(skip(self))]
    pub async fn close_scene(&self) {
        let was_playing = self.lock().close_scene();
        info!(was_playing, "scene closed");

        self.persist().await;
        self.emit(GameEvent::MusicChanged(None));
    }

    /// Plays the open scene's story, emitting each line as it is due.
    ///
    /// Narrative failures and cancellations are not errors: they produce a
    /// `story interrupted: <reason>` line and an `Interrupted` outcome.
    /// A run superseded by `open_scene`, `close_scene` or `reset_game`
    /// returns `Interrupted` with `StoryInterruption::Cancelled`, even if its
    /// last line had already been paced, and records nothing.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NoSceneOpen` when idle,
    /// `GameError::StoryAlreadyPlaying` while another story runs and
    /// `GameError::NoStory` if the scene has no story. No lines are emitted
    /// in those cases.
    #[instrument(skip(self))]
    pub async fn play_story(&self) -> Result<StoryOutcome, GameError> {
        let run = self.lock().begin_story(&self.library)?;
        info!(scene_id = %run.scene_id, run_id = run.run_id, "story started");
        self.emit(GameEvent::StoryStateChanged(StoryStatus::Playing {
            scene_id: run.scene_id.clone(),
        }));

        let sink = |text: &str| self.emit(GameEvent::LogLine(text.to_owned()));
        let outcome = run_story(
            &run.story,
            StoryContext {
                rng: &*self.rng,
                pacer: &*self.pacer,
                cancel: &run.cancel,
                sink: &sink,
            },
        )
        .await;

        let settlement = self
            .lock()
            .finish_story(run.run_id, &outcome, self.clock.now());

        // A superseded run recorded nothing, whatever the story itself reached.
        let outcome = match (outcome, &settlement) {
            (StoryOutcome::Completed { lines, .. }, RunSettlement::Superseded) => {
                StoryOutcome::Interrupted {
                    lines,
                    reason: StoryInterruption::Cancelled,
                }
            }
            (outcome, _) => outcome,
        };

        let status = match (&settlement, &outcome) {
            (RunSettlement::Superseded, _) => StoryStatus::Interrupted {
                scene_id: run.scene_id.clone(),
                reason: "the scene was left".to_owned(),
            },
            (_, StoryOutcome::Interrupted { reason, .. }) => StoryStatus::Interrupted {
                scene_id: run.scene_id.clone(),
                reason: reason.to_string(),
            },
            (_, StoryOutcome::Completed { .. }) => StoryStatus::Completed {
                scene_id: run.scene_id.clone(),
            },
        };

        match settlement {
            RunSettlement::Recorded => {
                info!(scene_id = %run.scene_id, "story completed");
                self.persist().await;
            }
            RunSettlement::Discarded => {
                if let StoryStatus::Interrupted { reason, .. } = &status {
                    info!(scene_id = %run.scene_id, %reason, "story interrupted");
                    self.emit(GameEvent::LogLine(format!("story interrupted: {reason}")));
                }
                self.persist().await;
            }
            RunSettlement::Superseded => {
                info!(scene_id = %run.scene_id, "story superseded by a scene change");
            }
        }
        self.emit(GameEvent::StoryStateChanged(status));

        Ok(outcome)
    }

    /// Asks the playing story to stop at its next line boundary.
    ///
    /// # Errors
    ///
    /// Returns `GameError::NoStoryPlaying` unless a story is playing.
    #[instrument(skip(self))]
    pub fn stop_story(&self) -> Result<(), GameError> {
        let scene_id = self.lock().stop_story()?;
        info!(%scene_id, "story stop requested");
        self.emit(GameEvent::StoryStateChanged(StoryStatus::Stopping { scene_id }));
        Ok(())
    }

    /// Wipes the save and returns to an empty, idle game.
    #[instrument(skip(self))]
    pub async fn reset_game(&self) {
        {
            // Held across the reset too, so an earlier save cannot stamp the
            // fresh state once it lands.
            let _gate = self.persist_gate.lock().await;
            self.lock().reset();
            info!("game reset");
            if let Err(e) = self.save_slot.clear().await {
                error!(error = %e, "failed to clear save record");
            }
        }
        self.emit(GameEvent::StateChanged(self.state()));
        self.emit(GameEvent::MusicChanged(None));
    }

    /// Starts the open scene's music. Does nothing when idle.
    pub fn play_music(&self) {
        let current = self.lock().state().current_scene.clone();
        if let Some(track) = current.as_deref().and_then(|id| self.music_for(id)) {
            self.emit(GameEvent::MusicChanged(Some(track)));
        }
    }

    /// Stops all music.
    pub fn pause_music(&self) {
        self.emit(GameEvent::MusicChanged(None));
    }

    /// When the stored record was last written, read from the store.
    pub async fn last_saved_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.save_slot.last_saved_at().await
    }

    /// Writes the current state and publishes it. Write failures are logged;
    /// the in-memory state stays authoritative.
    async fn persist(&self) {
        let _gate = self.persist_gate.lock().await;
        let snapshot = self.state();
        match self.save_slot.save(&snapshot).await {
            Ok(saved) => self.lock().mark_saved(saved.saved_at),
            Err(e) => error!(error = %e, "failed to write save record"),
        }
        self.emit(GameEvent::StateChanged(self.state()));
    }

    fn music_for(&self, scene_id: &str) -> Option<String> {
        self.registry.find(scene_id).map(|s| s.music_ref.clone())
    }

    fn emit(&self, event: GameEvent) {
        self.observer.notify(&event);
    }

    fn lock(&self) -> MutexGuard<'_, GameSession> {
        // Session methods never panic midway through a transition.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treasure_test_support::RecordingStore;

    use crate::domain::events::NullObserver;

    #[tokio::test]
    async fn test_production_services_drive_an_unpaced_game() {
        // Arrange
        let config = GameConfig {
            pacing_scale: 0.0,
            ..GameConfig::default()
        };
        let store = Arc::new(RecordingStore::new());
        let services = GameServices::production(&config, store.clone(), Arc::new(NullObserver));
        let controller = GameController::new(
            &config,
            SceneRegistry::reference(),
            StoryLibrary::reference(),
            services,
        );

        // Act
        controller.open_scene("temple").await.unwrap();
        let outcome = controller.play_story().await.unwrap();

        // Assert
        assert_eq!(
            controller.phase(),
            Phase::SceneOpen {
                scene_id: "temple".into()
            }
        );
        assert_eq!(
            outcome.is_completed(),
            controller.state().progress.contains_key("temple")
        );
        assert!(store.value(&config.save_key).is_some());
    }
}

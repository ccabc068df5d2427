//! Shared test helpers for controller integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use treasure_core::rng::DeterministicRng;
use treasure_core::store::KeyValueStore;
use treasure_core::time::{Clock, Pacer};
use treasure_game::application::controller::{GameController, GameServices};
use treasure_game::config::GameConfig;
use treasure_game::domain::events::EventBuffer;
use treasure_game::domain::scenes::SceneRegistry;
use treasure_game::domain::stories::StoryLibrary;
use treasure_test_support::{FixedClock, InstantPacer, RecordingStore};

/// Save key used across all integration tests.
pub const SAVE_KEY: &str = "treasure_game_save_v1";

/// Fixed timestamp used across all integration tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// A controller plus handles on its test doubles.
pub struct Harness {
    pub controller: GameController,
    pub store: Arc<RecordingStore>,
    pub events: Arc<EventBuffer>,
}

impl Harness {
    /// The persisted record, parsed.
    pub fn saved_record(&self) -> Option<serde_json::Value> {
        self.store
            .value(SAVE_KEY)
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }
}

/// Build services from explicit doubles.
pub fn services(
    rng: impl DeterministicRng + Send + 'static,
    clock: Arc<dyn Clock>,
    pacer: Arc<dyn Pacer>,
    store: Arc<dyn KeyValueStore>,
    events: Arc<EventBuffer>,
) -> GameServices {
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    GameServices {
        clock,
        rng,
        pacer,
        store,
        observer: events,
    }
}

/// Build a fresh controller over an empty `RecordingStore` with instant
/// pacing and a fixed clock.
pub fn build(rng: impl DeterministicRng + Send + 'static) -> Harness {
    build_with_pacer(rng, Arc::new(InstantPacer::new()))
}

/// Like [`build`], with a custom pacer (e.g. a `TokioPacer` under paused
/// time).
pub fn build_with_pacer(rng: impl DeterministicRng + Send + 'static, pacer: Arc<dyn Pacer>) -> Harness {
    let store = Arc::new(RecordingStore::new());
    let events = Arc::new(EventBuffer::new());
    let controller = GameController::new(
        &GameConfig::default(),
        SceneRegistry::reference(),
        StoryLibrary::reference(),
        services(
            rng,
            Arc::new(FixedClock(fixed_now())),
            pacer,
            store.clone(),
            events.clone(),
        ),
    );
    Harness {
        controller,
        store,
        events,
    }
}

/// Build a fresh controller over an arbitrary store with instant pacing and
/// a fixed clock. Returns the controller and its event buffer.
pub fn build_over_store(
    rng: impl DeterministicRng + Send + 'static,
    store: Arc<dyn KeyValueStore>,
) -> (GameController, Arc<EventBuffer>) {
    let events = Arc::new(EventBuffer::new());
    let controller = GameController::new(
        &GameConfig::default(),
        SceneRegistry::reference(),
        StoryLibrary::reference(),
        services(
            rng,
            Arc::new(FixedClock(fixed_now())),
            Arc::new(InstantPacer::new()),
            store,
            events.clone(),
        ),
    );
    (controller, events)
}

/// Start a controller from whatever `store` holds.
pub async fn start_with_store(
    rng: impl DeterministicRng + Send + 'static,
    store: Arc<RecordingStore>,
) -> Harness {
    let events = Arc::new(EventBuffer::new());
    let controller = GameController::start(
        &GameConfig::default(),
        SceneRegistry::reference(),
        StoryLibrary::reference(),
        services(
            rng,
            Arc::new(FixedClock(fixed_now())),
            Arc::new(InstantPacer::new()),
            store.clone(),
            events.clone(),
        ),
    )
    .await;
    Harness {
        controller,
        store,
        events,
    }
}

//! Notifications for the presentation layer.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc;

use super::state::GameState;

/// Where the current playback stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StoryStatus {
    /// A story started.
    Playing {
        /// Scene being played.
        scene_id: String,
    },
    /// A stop was requested; the story ends at its next line boundary.
    Stopping {
        /// Scene being played.
        scene_id: String,
    },
    /// The story ran to the end and progress was recorded.
    Completed {
        /// Scene that was played.
        scene_id: String,
    },
    /// The story ended early; nothing was recorded.
    Interrupted {
        /// Scene that was played.
        scene_id: String,
        /// Narrative reason.
        reason: String,
    },
}

/// A notification emitted by the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GameEvent {
    /// A line for the scene log.
    LogLine(String),
    /// The game state changed (and was persisted).
    StateChanged(GameState),
    /// Playback changed status.
    StoryStateChanged(StoryStatus),
    /// The background track to play, or `None` to silence all music.
    MusicChanged(Option<String>),
}

/// Receives controller notifications.
///
/// Called synchronously from controller operations; implementations should
/// hand the event off rather than block.
pub trait GameObserver: Send + Sync {
    /// Handles one event.
    fn notify(&self, event: &GameEvent);
}

/// Observer that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl GameObserver for NullObserver {
    fn notify(&self, _event: &GameEvent) {}
}

/// Observer that forwards events into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<GameEvent>,
}

impl ChannelObserver {
    /// Creates the observer and the receiving end for the presentation layer.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl GameObserver for ChannelObserver {
    fn notify(&self, event: &GameEvent) {
        // A dropped receiver means nobody is rendering any more.
        let _ = self.tx.send(event.clone());
    }
}

/// Observer that buffers events until drained, for frame-polled front ends.
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Mutex<Vec<GameEvent>>,
}

impl EventBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every buffered event.
    pub fn drain(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Copies the buffered events without removing them.
    #[must_use]
    pub fn snapshot(&self) -> Vec<GameEvent> {
        self.lock().clone()
    }

    /// The buffered log lines, in order.
    #[must_use]
    pub fn log_lines(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                GameEvent::LogLine(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// The buffered story status changes, in order.
    #[must_use]
    pub fn story_statuses(&self) -> Vec<StoryStatus> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                GameEvent::StoryStateChanged(status) => Some(status.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<GameEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GameObserver for EventBuffer {
    fn notify(&self, event: &GameEvent) {
        self.lock().push(event.clone());
    }
}

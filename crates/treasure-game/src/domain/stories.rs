//! Story library and the story runner.
//!
//! A [`Story`] is a script: an ordered list of beats, each either a narrative
//! line preceded by a pacing delay or a failure checkpoint with a fixed
//! probability. [`run_story`] plays a script against an injected RNG, pacer
//! and cancellation token, handing each line to a sink as soon as it is due.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;
use treasure_core::cancel::CancellationToken;
use treasure_core::rng::DeterministicRng;
use treasure_core::time::Pacer;

/// One step of a story.
#[derive(Debug, Clone, PartialEq)]
pub enum Beat {
    /// Wait `delay`, then emit `text`.
    Line {
        /// Pause before the line appears.
        delay: Duration,
        /// Narrative text.
        text: String,
    },
    /// Fail the story with `reason` when a draw lands below `probability`.
    Checkpoint {
        /// Chance of failure in `[0.0, 1.0]`.
        probability: f64,
        /// Narrative explanation shown to the player.
        reason: String,
    },
}

/// A scripted narrative sequence for one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    scene_id: String,
    beats: Vec<Beat>,
    reward: Map<String, Value>,
}

impl Story {
    /// Starts an empty script for `scene_id`.
    #[must_use]
    pub fn new(scene_id: &str) -> Self {
        Self {
            scene_id: scene_id.to_owned(),
            beats: Vec::new(),
            reward: Map::new(),
        }
    }

    /// Appends a line shown after `delay_ms` milliseconds.
    #[must_use]
    pub fn line(mut self, delay_ms: u64, text: &str) -> Self {
        self.beats.push(Beat::Line {
            delay: Duration::from_millis(delay_ms),
            text: text.to_owned(),
        });
        self
    }

    /// Appends a failure checkpoint. `probability` is clamped to `[0.0, 1.0]`.
    #[must_use]
    pub fn checkpoint(mut self, probability: f64, reason: &str) -> Self {
        self.beats.push(Beat::Checkpoint {
            probability: probability.clamp(0.0, 1.0),
            reason: reason.to_owned(),
        });
        self
    }

    /// Adds a field to the progress payload recorded on completion.
    #[must_use]
    pub fn reward(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.reward.insert(key.to_owned(), value.into());
        self
    }

    /// The scene this story plays in.
    #[must_use]
    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    /// The script.
    #[must_use]
    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    /// The payload recorded when the story completes.
    #[must_use]
    pub fn reward_data(&self) -> &Map<String, Value> {
        &self.reward
    }

    /// Number of lines a successful run emits.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.beats
            .iter()
            .filter(|b| matches!(b, Beat::Line { .. }))
            .count()
    }
}

/// Stories keyed by scene id.
#[derive(Debug, Clone, Default)]
pub struct StoryLibrary {
    stories: HashMap<String, Arc<Story>>,
}

impl StoryLibrary {
    /// Builds a library from stories. A later story for the same scene
    /// replaces an earlier one.
    #[must_use]
    pub fn new(stories: impl IntoIterator<Item = Story>) -> Self {
        Self {
            stories: stories
                .into_iter()
                .map(|s| (s.scene_id.clone(), Arc::new(s)))
                .collect(),
        }
    }

    /// The stories of the reference game.
    #[must_use]
    pub fn reference() -> Self {
        Self::new([
            Story::new("library")
                .line(800, "In the old library you find the first clue: a torn page of ancient script.")
                .line(1200, "The script is decoded: the treasure lies in an ancient temple.")
                .checkpoint(0.45, "the temple guards caught you")
                .line(1400, "Behind the altar you find a mysterious box.")
                .line(900, "You open the box: the legendary treasure is yours!")
                .reward("found", true),
            Story::new("temple")
                .line(0, "You stand at the heart of the temple; the altar glows faintly.")
                .checkpoint(0.30, "an ancient trap was triggered and you had to retreat")
                .line(800, "You disarm the mechanism and claim a rune fragment.")
                .reward("rune", true),
            Story::new("sea")
                .line(800, "Set sail! The canvas fills with wind.")
                .line(700, "A storm rolls in and waves crash over the deck.")
                .checkpoint(0.35, "the storm was too strong and the ship was damaged")
                .line(800, "You fish out a drifting bottle. Its note reads: \"the lonely isle to the north\".")
                .line(700, "You reach the island and dig up a wooden chest.")
                .line(500, "You open the chest: treasure!")
                .reward("sea", true),
            Story::new("cave")
                .line(600, "You enter the cave; the air is cold and your footsteps echo.")
                .line(700, "Ancient murals point towards a hidden chamber below.")
                .checkpoint(0.40, "the cave collapsed and sealed the exit")
                .line(700, "By torchlight you find a secret mechanism.")
                .line(600, "The mechanism opens, revealing a box carved with runes.")
                .line(600, "Inside the box rests a glowing gem.")
                .reward("cave", true),
        ])
    }

    /// The story for `scene_id`, if one exists.
    #[must_use]
    pub fn story_for(&self, scene_id: &str) -> Option<Arc<Story>> {
        self.stories.get(scene_id).cloned()
    }
}

/// A checkpoint tripped during a story.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct NarrativeFailure {
    /// Narrative explanation shown to the player.
    pub reason: String,
}

/// Why a story ended early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryInterruption {
    /// A checkpoint failed.
    Failed(NarrativeFailure),
    /// The player (or a scene change) asked the story to stop.
    Cancelled,
}

impl fmt::Display for StoryInterruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(failure) => write!(f, "{failure}"),
            Self::Cancelled => f.write_str("stopped by the player"),
        }
    }
}

/// Result of one playback.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryOutcome {
    /// Every beat ran.
    Completed {
        /// All lines, in order.
        lines: Vec<String>,
        /// Progress payload to record.
        reward: Map<String, Value>,
    },
    /// The story stopped before its end.
    Interrupted {
        /// Lines emitted before the interruption.
        lines: Vec<String>,
        /// What stopped it.
        reason: StoryInterruption,
    },
}

impl StoryOutcome {
    /// Lines emitted during the run.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        match self {
            Self::Completed { lines, .. } | Self::Interrupted { lines, .. } => lines,
        }
    }

    /// Returns whether the story ran to the end.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Receives story lines as they are emitted.
pub trait LineSink: Send + Sync {
    /// Called once per line, in story order.
    fn line(&self, text: &str);
}

impl<F> LineSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn line(&self, text: &str) {
        self(text);
    }
}

/// Collaborators a story run needs.
#[derive(Clone, Copy)]
pub struct StoryContext<'a> {
    /// Source of checkpoint draws.
    pub rng: &'a Mutex<dyn DeterministicRng + Send>,
    /// Schedules the pause before each line.
    pub pacer: &'a dyn Pacer,
    /// Checked before every beat.
    pub cancel: &'a CancellationToken,
    /// Receives each line.
    pub sink: &'a dyn LineSink,
}

/// Plays `story` to completion, failure or cancellation.
///
/// Cancellation is checked before each beat only. A line whose pause has
/// already started is still emitted once the pause ends.
pub async fn run_story(story: &Story, ctx: StoryContext<'_>) -> StoryOutcome {
    let mut lines = Vec::with_capacity(story.line_count());

    for beat in &story.beats {
        if ctx.cancel.is_cancelled() {
            debug!(scene_id = %story.scene_id, emitted = lines.len(), "story cancelled");
            return StoryOutcome::Interrupted {
                lines,
                reason: StoryInterruption::Cancelled,
            };
        }

        match beat {
            Beat::Line { delay, text } => {
                ctx.pacer.pace(*delay).await;
                ctx.sink.line(text);
                lines.push(text.clone());
            }
            Beat::Checkpoint {
                probability,
                reason,
            } => {
                // Lock only for the draw, never across an await.
                let failed = ctx
                    .rng
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .chance(*probability);
                if failed {
                    debug!(scene_id = %story.scene_id, %reason, "story checkpoint failed");
                    return StoryOutcome::Interrupted {
                        lines,
                        reason: StoryInterruption::Failed(NarrativeFailure {
                            reason: reason.clone(),
                        }),
                    };
                }
            }
        }
    }

    StoryOutcome::Completed {
        lines,
        reward: story.reward.clone(),
    }
}

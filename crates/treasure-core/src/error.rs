//! Game error types.

use thiserror::Error;

/// Top-level error type for controller and registry operations.
///
/// Story-level failures (a narrative checkpoint tripping, a player stopping
/// playback) are not errors: they are reported as story outcomes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The requested scene id is not in the registry.
    #[error("unknown scene: {0}")]
    UnknownScene(String),

    /// A story was requested while no scene is open.
    #[error("no scene is open")]
    NoSceneOpen,

    /// A story was requested while another one is still playing.
    #[error("a story is already playing in scene {0}")]
    StoryAlreadyPlaying(String),

    /// A stop was requested while nothing is playing.
    #[error("no story is playing")]
    NoStoryPlaying,

    /// The scene exists but has no story attached.
    #[error("scene {0} has no story")]
    NoStory(String),

    /// Two scenes were registered under the same id.
    #[error("duplicate scene id: {0}")]
    DuplicateScene(String),

    /// The key-value store failed to read or write.
    #[error("persistence error: {0}")]
    Persistence(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_offending_scene() {
        assert_eq!(
            GameError::UnknownScene("attic".into()).to_string(),
            "unknown scene: attic"
        );
        assert_eq!(
            GameError::StoryAlreadyPlaying("sea".into()).to_string(),
            "a story is already playing in scene sea"
        );
    }

    #[test]
    fn test_persistence_error_carries_message() {
        let err = GameError::Persistence("disk full".into());
        assert_eq!(err.to_string(), "persistence error: disk full");
    }
}

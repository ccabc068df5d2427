//! Engine configuration.

/// Store key of the save record when none is configured.
pub const DEFAULT_SAVE_KEY: &str = "treasure_game_save_v1";

/// Environment variable overriding the save key.
pub const SAVE_KEY_ENV: &str = "TREASURE_SAVE_KEY";

/// Controller configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Store key of the save record.
    pub save_key: String,
    /// Multiplier applied to authored story delays by the production pacer.
    pub pacing_scale: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            save_key: DEFAULT_SAVE_KEY.to_owned(),
            pacing_scale: 1.0,
        }
    }
}

impl GameConfig {
    /// Reads configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`. Blank values fall back to the
    /// defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(key) = lookup(SAVE_KEY_ENV) {
            let key = key.trim();
            if !key.is_empty() {
                key.clone_into(&mut config.save_key);
            }
        }
        config
    }
}

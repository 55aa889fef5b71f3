//! Session configuration.

use crate::content::GAME_STORY;
use std::path::PathBuf;
use tracing::warn;

/// Environment variable naming the model to run the agents on.
pub const MODEL_ENV: &str = "THRILLER_MODEL";
/// Environment variable overriding the response token limit.
pub const MAX_TOKENS_ENV: &str = "THRILLER_MAX_TOKENS";
/// Environment variable overriding the sampling temperature.
pub const TEMPERATURE_ENV: &str = "THRILLER_TEMPERATURE";

/// Configuration for a game session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The model to use (the client default when `None`).
    pub model: Option<String>,

    /// Maximum tokens for responses.
    pub max_tokens: usize,

    /// Temperature for generation.
    pub temperature: Option<f32>,

    /// Explicit save path. When `None` the path comes from the environment
    /// or the default, resolved at every save.
    pub save_path: Option<PathBuf>,

    /// Save after every turn.
    pub autosave: bool,

    /// Give the narrator the `query_external_research` bridge tool.
    pub research_agent: bool,

    /// Cap on tool-use rounds within a single agent run.
    pub max_tool_rounds: usize,

    /// World brief injected into the narrator's instructions.
    pub story: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 4096,
            temperature: Some(0.8),
            save_path: None,
            autosave: true,
            research_agent: true,
            max_tool_rounds: claude::DEFAULT_MAX_TOOL_ROUNDS,
            story: GAME_STORY.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with `THRILLER_MODEL`, `THRILLER_MAX_TOKENS` and
    /// `THRILLER_TEMPERATURE` applied. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(model) = env_value(MODEL_ENV) {
            config.model = Some(model);
        }

        if let Some(raw) = env_value(MAX_TOKENS_ENV) {
            match raw.parse::<usize>() {
                Ok(tokens) if tokens > 0 => config.max_tokens = tokens,
                _ => warn!(var = MAX_TOKENS_ENV, value = %raw, "ignoring invalid max tokens"),
            }
        }

        if let Some(raw) = env_value(TEMPERATURE_ENV) {
            match raw.parse::<f32>() {
                Ok(temp) if (0.0..=1.0).contains(&temp) => config.temperature = Some(temp),
                _ => warn!(var = TEMPERATURE_ENV, value = %raw, "ignoring invalid temperature"),
            }
        }

        config
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set max tokens for responses.
    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    /// Set temperature for generation.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Pin the save path instead of resolving it from the environment.
    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn with_research_agent(mut self, enabled: bool) -> Self {
        self.research_agent = enabled;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    /// Replace the world brief.
    pub fn with_story(mut self, story: impl Into<String>) -> Self {
        self.story = story.into();
        self
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

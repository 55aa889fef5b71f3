//! Blocking interface for synchronous callers.
//!
//! The core is async throughout. `BlockingSession` owns a tokio runtime and
//! blocks on it, for front ends and scripts that have no runtime of their
//! own. It must not be used from inside a runtime; doing so is reported as
//! [`SessionError::Blocking`] instead of panicking.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use thriller_core::headless::BlockingSession;
//! use thriller_core::{ClaudeRuntime, GameSession, SessionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::from_env();
//!     let runtime = Arc::new(ClaudeRuntime::from_env()?.with_config(&config));
//!     let mut game = BlockingSession::new(GameSession::new(config, runtime))?;
//!
//!     game.autoload()?;
//!     println!("{}", game.respond("I look out the window"));
//!     println!("Items: {}", game.snapshot()?.items.len());
//!     Ok(())
//! }
//! ```

use crate::session::{GameSession, SessionError, TurnOutcome};
use crate::state::GameState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::{Builder, Handle, Runtime};

/// An entry in the session transcript.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub player_input: String,
    pub reply: String,
    pub turn: usize,
}

/// A game session driven by blocking calls.
pub struct BlockingSession {
    runtime: Runtime,
    session: Arc<GameSession>,
    transcript: Vec<TranscriptEntry>,
}

impl BlockingSession {
    /// Wrap `session` with a dedicated multi-thread runtime.
    pub fn new(session: GameSession) -> Result<Self, SessionError> {
        Self::from_shared(Arc::new(session))
    }

    pub fn from_shared(session: Arc<GameSession>) -> Result<Self, SessionError> {
        ensure_outside_runtime()?;
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| SessionError::Blocking(format!("failed to start runtime: {e}")))?;

        Ok(Self {
            runtime,
            session,
            transcript: Vec::new(),
        })
    }

    /// Run one turn and return the reply shown to the player.
    pub fn respond(&mut self, input: &str) -> String {
        let reply = match ensure_outside_runtime() {
            Ok(()) => self.runtime.block_on(self.session.respond(input)),
            Err(e) => format!("⚠️ Error: {e}"),
        };
        self.record(input, &reply);
        reply
    }

    /// Run one turn, keeping the typed outcome.
    pub fn run_turn(&mut self, input: &str) -> Result<TurnOutcome, SessionError> {
        ensure_outside_runtime()?;
        let outcome = self.runtime.block_on(self.session.run_turn(input))?;
        self.record(input, &outcome.text);
        Ok(outcome)
    }

    /// Restore the configured save if one exists.
    pub fn autoload(&self) -> Result<bool, SessionError> {
        ensure_outside_runtime()?;
        self.runtime.block_on(self.session.autoload(None))
    }

    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, SessionError> {
        ensure_outside_runtime()?;
        self.runtime.block_on(self.session.save(path))
    }

    pub fn load(&self, path: Option<&Path>) -> Result<PathBuf, SessionError> {
        ensure_outside_runtime()?;
        self.runtime.block_on(self.session.load(path))
    }

    pub fn snapshot(&self) -> Result<GameState, SessionError> {
        ensure_outside_runtime()?;
        Ok(self.runtime.block_on(self.session.snapshot()))
    }

    pub fn session(&self) -> &Arc<GameSession> {
        &self.session
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn last_response(&self) -> Option<&str> {
        self.transcript.last().map(|e| e.reply.as_str())
    }

    fn record(&mut self, input: &str, reply: &str) {
        self.transcript.push(TranscriptEntry {
            player_input: input.to_string(),
            reply: reply.to_string(),
            turn: self.transcript.len() + 1,
        });
    }
}

fn ensure_outside_runtime() -> Result<(), SessionError> {
    match Handle::try_current() {
        Ok(_) => Err(SessionError::Blocking(
            "cannot block on a turn from inside an async runtime; await GameSession instead"
                .to_string(),
        )),
        Err(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::testing::{ScriptedRuntime, ScriptedTurn};
    use serde_json::json;
    use tempfile::TempDir;

    fn blocking_session(dir: &TempDir, turns: Vec<ScriptedTurn>) -> BlockingSession {
        let runtime = Arc::new(ScriptedRuntime::new(turns));
        let config = SessionConfig::new().with_save_path(dir.path().join("save.json"));
        BlockingSession::new(GameSession::new(config, runtime)).unwrap()
    }

    #[test]
    fn test_blocking_turns() {
        let dir = TempDir::new().unwrap();
        let mut game = blocking_session(
            &dir,
            vec![
                ScriptedTurn::narrative("You find a torn map.")
                    .with_call("add_player_item", json!({"item_name": "map", "description": "torn"})),
                ScriptedTurn::narrative("Sirens."),
            ],
        );

        assert!(!game.autoload().unwrap());
        assert_eq!(game.respond("Search the desk"), "You find a torn map.");
        assert_eq!(game.respond("Listen"), "Sirens.");

        assert_eq!(game.transcript().len(), 2);
        assert_eq!(game.last_response(), Some("Sirens."));
        assert!(game.snapshot().unwrap().has_item("map"));
        assert!(dir.path().join("save.json").exists());
    }

    #[tokio::test]
    async fn test_rejected_inside_runtime() {
        let dir = TempDir::new().unwrap();
        let runtime = Arc::new(ScriptedRuntime::new(vec![]));
        let config = SessionConfig::new().with_save_path(dir.path().join("save.json"));

        let result = BlockingSession::new(GameSession::new(config, runtime));

        assert!(matches!(result, Err(SessionError::Blocking(_))));
    }
}

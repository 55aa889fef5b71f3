//! GameSession - one player's run of the game.
//!
//! A session owns the shared state, the narrator's tools and a handle to
//! the agent runtime. Each call to [`GameSession::respond`] is one turn:
//!
//! 1. rebuild the narrator from the current state
//! 2. run it on the player's message, letting it call tools
//! 3. autosave, whether or not the run succeeded
//! 4. scrub tool chatter from the reply
//!
//! Turns are serialised by a turn lock, so the mutations and the autosave
//! of one turn finish before the next turn starts.

use crate::config::SessionConfig;
use crate::narrator::{
    narrator_definition, research_definition, scrub_tool_meta, NarratorTools, ResearchBridge,
};
use crate::persist::{load_state, resolve_save_path, save_state, session_save_path, PersistError};
use crate::runtime::{AgentRuntime, RuntimeError};
use crate::state::{GameState, SharedState};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("Blocking call rejected: {0}")]
    Blocking(String),
}

/// Result of the autosave attempted after a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutosaveStatus {
    Saved { path: PathBuf },
    Failed { path: PathBuf, error: String },
}

impl AutosaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, AutosaveStatus::Saved { .. })
    }

    pub fn path(&self) -> &Path {
        match self {
            AutosaveStatus::Saved { path } | AutosaveStatus::Failed { path, .. } => path,
        }
    }
}

/// Something that happened during a turn, for observers of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    Started { turn: u64 },
    Completed { turn: u64, tool_calls: usize },
    Failed { turn: u64, error: String },
    Autosaved { turn: u64, path: PathBuf },
    AutosaveFailed { turn: u64, path: PathBuf, error: String },
}

/// What a successful turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub turn: u64,
    /// Narration with tool chatter removed.
    pub text: String,
    /// Narration as the runtime returned it.
    pub raw_text: String,
    pub tool_calls: usize,
    /// `None` when autosave is disabled.
    pub autosave: Option<AutosaveStatus>,
}

/// A game session.
pub struct GameSession {
    state: SharedState,
    config: SessionConfig,
    runtime: Arc<dyn AgentRuntime>,
    tools: NarratorTools,
    turn_lock: Mutex<()>,
    turns: AtomicU64,
    last_autosave: Mutex<Option<AutosaveStatus>>,
    events: broadcast::Sender<TurnEvent>,
}

impl GameSession {
    /// Create a session with a fresh, empty state.
    pub fn new(config: SessionConfig, runtime: Arc<dyn AgentRuntime>) -> Self {
        Self::with_state(GameState::new().into_shared(), config, runtime)
    }

    /// Create a session that saves to its own file under `base_dir`.
    pub fn for_session(
        name: &str,
        base_dir: impl AsRef<Path>,
        config: SessionConfig,
        runtime: Arc<dyn AgentRuntime>,
    ) -> Self {
        let config = config.with_save_path(session_save_path(base_dir, name));
        Self::new(config, runtime)
    }

    /// Create a session around an existing shared state.
    pub fn with_state(
        state: SharedState,
        config: SessionConfig,
        runtime: Arc<dyn AgentRuntime>,
    ) -> Self {
        let mut tools = NarratorTools::new(state.clone());
        if config.research_agent {
            tools = tools.with_research(ResearchBridge::new(
                runtime.clone(),
                research_definition(&config),
            ));
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            state,
            config,
            runtime,
            tools,
            turn_lock: Mutex::new(()),
            turns: AtomicU64::new(0),
            last_autosave: Mutex::new(None),
            events,
        }
    }

    /// Run one turn and return the text to show the player.
    ///
    /// Never fails: an agent error becomes a "⚠️ Error: ..." reply.
    pub async fn respond(&self, message: &str) -> String {
        match self.run_turn(message).await {
            Ok(outcome) => outcome.text,
            Err(e) => format!("⚠️ Error: {e}"),
        }
    }

    /// Run one turn.
    ///
    /// The autosave is attempted before this returns, on failure as well as
    /// on success. An autosave failure does not fail the turn; it is
    /// reported in [`TurnOutcome::autosave`] and as a [`TurnEvent`].
    pub async fn run_turn(&self, message: &str) -> Result<TurnOutcome, SessionError> {
        let _turn_guard = self.turn_lock.lock().await;
        let turn = self.turns.fetch_add(1, Ordering::SeqCst) + 1;

        info!(turn, "turn started");
        self.publish(TurnEvent::Started { turn });

        let agent = {
            let state = self.state.lock().await;
            narrator_definition(&state, &self.config, &self.tools)
        };

        let result = self.runtime.run(&agent, message, &self.tools).await;
        let autosave = self.autosave(turn).await;

        match result {
            Ok(run) => {
                info!(turn, tool_calls = run.tool_calls, "turn completed");
                self.publish(TurnEvent::Completed {
                    turn,
                    tool_calls: run.tool_calls,
                });
                Ok(TurnOutcome {
                    turn,
                    text: scrub_tool_meta(&run.final_output),
                    raw_text: run.final_output,
                    tool_calls: run.tool_calls,
                    autosave,
                })
            }
            Err(e) => {
                error!(turn, error = %e, "turn failed");
                self.publish(TurnEvent::Failed {
                    turn,
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    async fn autosave(&self, turn: u64) -> Option<AutosaveStatus> {
        if !self.config.autosave {
            return None;
        }

        let path = resolve_save_path(self.config.save_path.as_deref());
        let status = match save_state(&self.state, Some(path.as_path())).await {
            Ok(path) => {
                self.publish(TurnEvent::Autosaved {
                    turn,
                    path: path.clone(),
                });
                AutosaveStatus::Saved { path }
            }
            Err(e) => {
                warn!(turn, path = %path.display(), error = %e, "autosave failed");
                self.publish(TurnEvent::AutosaveFailed {
                    turn,
                    path: path.clone(),
                    error: e.to_string(),
                });
                AutosaveStatus::Failed {
                    path,
                    error: e.to_string(),
                }
            }
        };

        *self.last_autosave.lock().await = Some(status.clone());
        Some(status)
    }

    fn publish(&self, event: TurnEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Restore the last save if there is one.
    ///
    /// Returns `Ok(false)` when no save exists yet. A save that exists but
    /// cannot be read is an error; the in-memory state is left as it was.
    pub async fn autoload(&self, path: Option<&Path>) -> Result<bool, SessionError> {
        match self.load(path).await {
            Ok(_) => Ok(true),
            Err(SessionError::Persist(e)) if e.is_not_found() => {
                info!(error = %e, "no save to resume, starting fresh");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Save now. `path` overrides the configured save path.
    pub async fn save(&self, path: Option<&Path>) -> Result<PathBuf, SessionError> {
        let _turn_guard = self.turn_lock.lock().await;
        let path = path.or(self.config.save_path.as_deref());
        Ok(save_state(&self.state, path).await?)
    }

    /// Replace the state with a save. `path` overrides the configured path.
    pub async fn load(&self, path: Option<&Path>) -> Result<PathBuf, SessionError> {
        let _turn_guard = self.turn_lock.lock().await;
        let path = path.or(self.config.save_path.as_deref());
        Ok(load_state(&self.state, path).await?)
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> GameState {
        self.state.lock().await.clone()
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Receive [`TurnEvent`]s from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.events.subscribe()
    }

    pub async fn last_autosave(&self) -> Option<AutosaveStatus> {
        self.last_autosave.lock().await.clone()
    }

    /// Turns started so far, including failed ones.
    pub fn turn_count(&self) -> u64 {
        self.turns.load(Ordering::SeqCst)
    }

    /// Where the next save will go if no path is given.
    pub fn save_path(&self) -> PathBuf {
        resolve_save_path(self.config.save_path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::GameLogCategory;
    use crate::testing::{ScriptedRuntime, ScriptedTurn};
    use serde_json::json;
    use tempfile::TempDir;

    fn session_in(dir: &TempDir, turns: Vec<ScriptedTurn>) -> (GameSession, Arc<ScriptedRuntime>) {
        let runtime = Arc::new(ScriptedRuntime::new(turns));
        let config = SessionConfig::new()
            .with_save_path(dir.path().join("save.json"))
            .with_research_agent(false);
        (GameSession::new(config, runtime.clone()), runtime)
    }

    #[tokio::test]
    async fn test_turn_logs_and_autosaves() {
        let dir = TempDir::new().unwrap();
        let (session, _) = session_in(
            &dir,
            vec![ScriptedTurn::narrative("The door splinters.")
                .with_call("update_game_log", json!({"new_entry": "Door kicked open"}))],
        );

        let outcome = session.run_turn("Hide").await.unwrap();

        assert_eq!(outcome.turn, 1);
        assert_eq!(outcome.text, "The door splinters.");
        assert_eq!(outcome.tool_calls, 1);
        assert!(outcome.autosave.as_ref().is_some_and(AutosaveStatus::is_saved));

        let saved = GameState::load_json(dir.path().join("save.json")).await.unwrap();
        assert_eq!(saved.game_log.len(), 1);
        assert_eq!(saved.game_log[0].category, GameLogCategory::Event);
    }

    #[tokio::test]
    async fn test_failed_turn_still_autosaves() {
        let dir = TempDir::new().unwrap();
        let (session, _) = session_in(&dir, vec![ScriptedTurn::failure("model overloaded")]);
        session
            .state()
            .lock()
            .await
            .add_item("keycard", "Blue access card");

        let reply = session.respond("Run").await;

        assert_eq!(reply, "⚠️ Error: Agent failed: model overloaded");
        let saved = GameState::load_json(dir.path().join("save.json")).await.unwrap();
        assert!(saved.has_item("keycard"));
        assert_eq!(session.turn_count(), 1);
    }

    #[tokio::test]
    async fn test_reply_is_scrubbed() {
        let dir = TempDir::new().unwrap();
        let (session, _) = session_in(
            &dir,
            vec![ScriptedTurn::narrative(
                "You pocket the phone.\n[Assistant has added the phone to your inventory]",
            )],
        );

        let outcome = session.run_turn("Take phone").await.unwrap();
        assert_eq!(outcome.text, "You pocket the phone.");
        assert!(outcome.raw_text.contains("[Assistant has added"));
    }

    #[tokio::test]
    async fn test_autosave_disabled() {
        let dir = TempDir::new().unwrap();
        let runtime = Arc::new(ScriptedRuntime::new(vec![ScriptedTurn::narrative("Quiet.")]));
        let config = SessionConfig::new()
            .with_save_path(dir.path().join("save.json"))
            .with_autosave(false);
        let session = GameSession::new(config, runtime);

        let outcome = session.run_turn("Wait").await.unwrap();
        assert!(outcome.autosave.is_none());
        assert!(session.last_autosave().await.is_none());
        assert!(!dir.path().join("save.json").exists());
    }

    #[tokio::test]
    async fn test_autoload_missing_save() {
        let dir = TempDir::new().unwrap();
        let (session, _) = session_in(&dir, vec![]);
        assert!(!session.autoload(None).await.unwrap());
    }

    #[tokio::test]
    async fn test_narrator_sees_current_state() {
        let dir = TempDir::new().unwrap();
        let (session, runtime) = session_in(
            &dir,
            vec![
                ScriptedTurn::narrative("You grab it.")
                    .with_call("add_player_item", json!({"item_name": "flashlight"})),
                ScriptedTurn::narrative("The beam flickers."),
            ],
        );

        session.respond("Take the flashlight").await;
        session.respond("Turn it on").await;

        let runs = runtime.received().await;
        assert_eq!(runs.len(), 2);
        assert!(runs[0].instructions.contains("(empty)"));
        assert!(runs[1].instructions.contains("- flashlight\n"));
        assert_eq!(runs[1].message, "Turn it on");
    }
}

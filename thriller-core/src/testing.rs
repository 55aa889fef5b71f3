//! Testing utilities for the narrator core.
//!
//! This module provides tools for integration testing:
//! - `ScriptedRuntime`, an [`AgentRuntime`] that plays back scripted turns
//!   (tool calls plus narration) without API calls
//! - `TestHarness` for scripted game scenarios
//! - Assertion helpers for verifying game state

use crate::config::SessionConfig;
use crate::runtime::{
    AgentDefinition, AgentRuntime, RunResult, RuntimeError, ToolExecutor, ToolResult, ToolUse,
};
use crate::session::GameSession;
use crate::state::GameState;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A tool call the scripted agent makes.
#[derive(Debug, Clone)]
pub struct ScriptedCall {
    pub name: String,
    pub input: Value,
}

/// One scripted agent run.
#[derive(Debug, Clone)]
pub enum ScriptedTurn {
    /// Make the calls in order, then answer with `narrative`.
    Reply {
        calls: Vec<ScriptedCall>,
        narrative: String,
    },
    /// Fail the run with [`RuntimeError::Agent`].
    Fail(String),
}

impl ScriptedTurn {
    /// A run that only narrates.
    pub fn narrative(text: impl Into<String>) -> Self {
        ScriptedTurn::Reply {
            calls: Vec::new(),
            narrative: text.into(),
        }
    }

    /// A run that fails with `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        ScriptedTurn::Fail(message.into())
    }

    /// Add a tool call before the narration. No effect on a failing run.
    pub fn with_call(mut self, name: impl Into<String>, input: Value) -> Self {
        if let ScriptedTurn::Reply { calls, .. } = &mut self {
            calls.push(ScriptedCall {
                name: name.into(),
                input,
            });
        }
        self
    }
}

/// What the runtime was asked to do in one run.
#[derive(Debug, Clone)]
pub struct ReceivedRun {
    pub agent: String,
    pub instructions: String,
    pub tools: Vec<String>,
    pub message: String,
    pub tool_results: Vec<ToolResult>,
}

/// An agent runtime that plays back scripted turns.
///
/// Turns are consumed in order by every run, including nested runs such as
/// the research agent answering a `query_external_research` call. Running
/// past the end of the script fails the run.
#[derive(Debug, Default)]
pub struct ScriptedRuntime {
    script: Mutex<VecDeque<ScriptedTurn>>,
    received: Mutex<Vec<ReceivedRun>>,
}

impl ScriptedRuntime {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            script: Mutex::new(turns.into()),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Queue another turn.
    pub async fn push(&self, turn: ScriptedTurn) {
        self.script.lock().await.push_back(turn);
    }

    /// Turns not yet played.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }

    /// Every run so far, in the order they finished.
    pub async fn received(&self) -> Vec<ReceivedRun> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn run(
        &self,
        agent: &AgentDefinition,
        message: &str,
        tools: &dyn ToolExecutor,
    ) -> Result<RunResult, RuntimeError> {
        let turn = self.script.lock().await.pop_front();

        let mut received = ReceivedRun {
            agent: agent.name.clone(),
            instructions: agent.instructions.clone(),
            tools: agent.tool_names().into_iter().map(str::to_string).collect(),
            message: message.to_string(),
            tool_results: Vec::new(),
        };

        let result = match turn {
            Some(ScriptedTurn::Reply { calls, narrative }) => {
                for (index, call) in calls.into_iter().enumerate() {
                    tokio::task::yield_now().await;
                    let result = tools
                        .execute(ToolUse {
                            id: format!("toolu_scripted_{index}"),
                            name: call.name,
                            input: call.input,
                        })
                        .await;
                    received.tool_results.push(result);
                }
                Ok(RunResult {
                    final_output: narrative,
                    tool_calls: received.tool_results.len(),
                })
            }
            Some(ScriptedTurn::Fail(message)) => Err(RuntimeError::Agent(message)),
            None => Err(RuntimeError::Agent("script exhausted".to_string())),
        };

        self.received.lock().await.push(received);
        result
    }
}

/// Test harness for running scripted sessions.
pub struct TestHarness {
    pub session: Arc<GameSession>,
    pub runtime: Arc<ScriptedRuntime>,
}

impl TestHarness {
    /// A session saving to `save_path`, with the research agent enabled.
    pub fn new(save_path: impl AsRef<Path>) -> Self {
        Self::with_config(SessionConfig::new().with_save_path(save_path.as_ref()))
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let runtime = Arc::new(ScriptedRuntime::default());
        let session = Arc::new(GameSession::new(config, runtime.clone()));
        Self { session, runtime }
    }

    /// Queue a narration-only turn.
    pub async fn expect_narrative(&self, text: impl Into<String>) -> &Self {
        self.runtime.push(ScriptedTurn::narrative(text)).await;
        self
    }

    /// Queue a scripted turn.
    pub async fn expect_turn(&self, turn: ScriptedTurn) -> &Self {
        self.runtime.push(turn).await;
        self
    }

    /// Send player input and get the reply.
    pub async fn input(&self, text: &str) -> String {
        self.session.respond(text).await
    }

    pub async fn state(&self) -> GameState {
        self.session.snapshot().await
    }

    /// Results of the tool calls in the most recent run.
    pub async fn last_tool_results(&self) -> Vec<ToolResult> {
        self.runtime
            .received()
            .await
            .last()
            .map(|run| run.tool_results.clone())
            .unwrap_or_default()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that the inventory holds an item with the given name.
#[track_caller]
pub fn assert_has_item(state: &GameState, name: &str) {
    assert!(
        state.has_item(name),
        "Expected '{name}' in inventory, found: {:?}",
        state.items.iter().map(|i| &i.name).collect::<Vec<_>>()
    );
}

/// Assert that the inventory does not hold an item with the given name.
#[track_caller]
pub fn assert_no_item(state: &GameState, name: &str) {
    assert!(!state.has_item(name), "Expected '{name}' not to be in inventory");
}

/// Assert the game log's entries, in order.
#[track_caller]
pub fn assert_game_log(state: &GameState, expected: &[&str]) {
    let entries: Vec<&str> = state.game_log.iter().map(|e| e.entry.as_str()).collect();
    assert_eq!(entries, expected, "Unexpected game log");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_harness_plays_script() {
        let dir = TempDir::new().unwrap();
        let harness = TestHarness::new(dir.path().join("save.json"));
        harness
            .expect_turn(
                ScriptedTurn::narrative("You pocket the keycard.")
                    .with_call("add_player_item", json!({"item_name": "keycard"}))
                    .with_call("update_game_log", json!({"new_entry": "Took the keycard", "category": "item"})),
            )
            .await;

        let reply = harness.input("Take the keycard").await;

        assert_eq!(reply, "You pocket the keycard.");
        let state = harness.state().await;
        assert_has_item(&state, "keycard");
        assert_game_log(&state, &["Took the keycard"]);
        assert!(harness.last_tool_results().await.iter().all(|r| !r.is_error));
    }

    #[tokio::test]
    async fn test_exhausted_script_fails_turn() {
        let dir = TempDir::new().unwrap();
        let harness = TestHarness::new(dir.path().join("save.json"));
        let reply = harness.input("Hello?").await;
        assert_eq!(reply, "⚠️ Error: Agent failed: script exhausted");
    }

    #[tokio::test]
    async fn test_failing_turn_skips_calls() {
        let dir = TempDir::new().unwrap();
        let harness = TestHarness::new(dir.path().join("save.json"));
        harness
            .expect_turn(
                ScriptedTurn::failure("boom").with_call("add_player_item", json!({"item_name": "x"})),
            )
            .await;

        harness.input("Grab it").await;

        assert_no_item(&harness.state().await, "x");
        assert_eq!(harness.runtime.remaining().await, 0);
    }
}

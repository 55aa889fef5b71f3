//! Tools the agents call to read and change the game state.
//!
//! Each executor closes over the [`SharedState`] it was built with. Input is
//! parsed into the typed structs below before anything is touched; a call
//! that fails to parse, or names a category outside the closed set, comes
//! back as an error result and leaves the state alone.

use crate::entry::{GameLogCategory, ResearchCategory, UnknownCategory};
use crate::runtime::{AgentDefinition, AgentRuntime, ToolExecutor, ToolResult, ToolUse};
use crate::state::{ItemChange, SharedState};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use thriller_macros::Tool;
use tracing::{debug, info, warn};

/// Saves a structured entry to the game log. Record player choices,
/// discoveries, gained or lost items and critical moments, one short
/// sentence each.
#[derive(Debug, Clone, Tool, Deserialize)]
#[tool(name = "update_game_log")]
pub struct UpdateGameLog {
    /// Concise summary of what happened
    pub new_entry: String,
    /// Kind of entry
    #[tool(
        one_of = "event, discovery, decision, question, item, ambient",
        default = "event"
    )]
    #[serde(default = "default_game_category")]
    pub category: String,
}

/// Saves a structured entry to the research log.
#[derive(Debug, Clone, Tool, Deserialize)]
#[tool(name = "update_research_log")]
pub struct UpdateResearchLog {
    /// The finding to record
    pub new_entry: String,
    /// Kind of finding
    #[tool(
        one_of = "info, symbol, historical, technical, psychological, warning",
        default = "info"
    )]
    #[serde(default = "default_research_category")]
    pub category: String,
}

/// Adds a new item to the player's inventory. Items are unique by name.
#[derive(Debug, Clone, Tool, Deserialize)]
#[tool(name = "add_player_item")]
pub struct AddPlayerItem {
    /// Exact item name as used in the story
    pub item_name: String,
    /// Short description of the item
    #[tool(optional)]
    #[serde(default)]
    pub description: String,
}

/// Removes an item from the player's inventory by name.
#[derive(Debug, Clone, Tool, Deserialize)]
#[tool(name = "remove_player_item")]
pub struct RemovePlayerItem {
    /// Exact name of the item to remove
    pub item_name: String,
}

/// Asks the research agent a factual question about the real world and
/// returns its answer.
#[derive(Debug, Clone, Tool, Deserialize)]
#[tool(name = "query_external_research")]
pub struct QueryExternalResearch {
    /// A focused question, e.g. "How do hotel keycard locks work?"
    pub query: String,
}

fn default_game_category() -> String {
    GameLogCategory::default().to_string()
}

fn default_research_category() -> String {
    ResearchCategory::default().to_string()
}

/// Reason a tool call was refused before it ran.
#[derive(Debug, Error)]
enum Rejected {
    #[error("{0}")]
    Input(serde_json::Error),
    #[error("{0}")]
    Category(UnknownCategory),
}

fn rejected(tool: &str, reason: Rejected) -> ToolResult {
    warn!(tool, %reason, "rejected tool input");
    ToolResult::error(format!("Invalid input for {tool}: {reason}"))
}

fn unknown_tool(name: &str) -> ToolResult {
    warn!(tool = name, "unknown tool");
    ToolResult::error(format!("Unknown tool: {name}"))
}

fn parse<T, F>(input: &Value, from_input: F) -> Result<T, Rejected>
where
    F: FnOnce(&Value) -> Result<T, serde_json::Error>,
{
    from_input(input).map_err(Rejected::Input)
}

// ---------- state operations ----------

/// Append a game-log entry.
pub async fn update_game_log(state: &SharedState, entry: &str, category: GameLogCategory) -> String {
    state.lock().await.log_event(category, entry);
    format!("Game log updated with a {category} entry.")
}

/// Append a research-log entry.
pub async fn update_research_log(
    state: &SharedState,
    entry: &str,
    category: ResearchCategory,
) -> String {
    state.lock().await.log_research(category, entry);
    format!("Research log updated with a {category} entry.")
}

/// Add an item unless the player already holds one with that name.
pub async fn add_player_item(state: &SharedState, name: &str, description: &str) -> String {
    match state.lock().await.add_item(name, description) {
        ItemChange::AlreadyPresent => format!("{name} is already in your inventory."),
        _ => format!("{name} added to your inventory."),
    }
}

/// Remove an item by exact name. A missing item is reported, not raised.
pub async fn remove_player_item(state: &SharedState, name: &str) -> String {
    match state.lock().await.remove_item(name) {
        ItemChange::Removed(_) => format!("{name} removed from your inventory."),
        _ => format!("{name} not found in your inventory."),
    }
}

// ---------- executors ----------

/// The research agent and the definition it runs under.
#[derive(Clone)]
pub struct ResearchBridge {
    runtime: Arc<dyn AgentRuntime>,
    agent: AgentDefinition,
}

impl ResearchBridge {
    pub fn new(runtime: Arc<dyn AgentRuntime>, agent: AgentDefinition) -> Self {
        Self { runtime, agent }
    }

    pub fn agent(&self) -> &AgentDefinition {
        &self.agent
    }
}

/// Tools available to the narrator.
#[derive(Clone)]
pub struct NarratorTools {
    state: SharedState,
    research: Option<ResearchBridge>,
}

impl NarratorTools {
    pub fn new(state: SharedState) -> Self {
        Self {
            state,
            research: None,
        }
    }

    /// Enable `query_external_research`, answered by `bridge`.
    pub fn with_research(mut self, bridge: ResearchBridge) -> Self {
        self.research = Some(bridge);
        self
    }

    pub fn has_research(&self) -> bool {
        self.research.is_some()
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Forward a question to the research agent and record the exchange.
    ///
    /// Any failure becomes a bracketed notice for the narrator and nothing
    /// is logged.
    pub async fn query_external_research(&self, query: &str) -> String {
        let Some(bridge) = &self.research else {
            return "[Research unavailable: no research agent configured]".to_string();
        };

        let tools = ResearchTools::new(self.state.clone());
        match bridge.runtime.run(&bridge.agent, query, &tools).await {
            Ok(result) => {
                let answer = result.final_output;
                self.state
                    .lock()
                    .await
                    .log_research(ResearchCategory::Info, format!("Q: {query}\nA: {answer}"));
                info!(query, "research answered");
                answer
            }
            Err(e) => {
                warn!(query, error = %e, "research agent failed");
                format!("[Research unavailable: {e}]")
            }
        }
    }
}

#[async_trait]
impl ToolExecutor for NarratorTools {
    fn tools(&self) -> Vec<claude::Tool> {
        let mut tools = vec![
            UpdateGameLog::as_tool(),
            AddPlayerItem::as_tool(),
            RemovePlayerItem::as_tool(),
        ];
        if self.has_research() {
            tools.push(QueryExternalResearch::as_tool());
        }
        tools
    }

    async fn execute(&self, call: ToolUse) -> ToolResult {
        debug!(tool = %call.name, "narrator tool call");
        let name = call.name.as_str();

        match name {
            "update_game_log" => {
                let parsed = parse(&call.input, UpdateGameLog::from_input).and_then(|input| {
                    let category = input
                        .category
                        .parse::<GameLogCategory>()
                        .map_err(Rejected::Category)?;
                    Ok((input.new_entry, category))
                });
                match parsed {
                    Ok((entry, category)) => {
                        ToolResult::success(update_game_log(&self.state, &entry, category).await)
                    }
                    Err(reason) => rejected(name, reason),
                }
            }
            "add_player_item" => match parse(&call.input, AddPlayerItem::from_input) {
                Ok(input) => ToolResult::success(
                    add_player_item(&self.state, &input.item_name, &input.description).await,
                ),
                Err(reason) => rejected(name, reason),
            },
            "remove_player_item" => match parse(&call.input, RemovePlayerItem::from_input) {
                Ok(input) => {
                    ToolResult::success(remove_player_item(&self.state, &input.item_name).await)
                }
                Err(reason) => rejected(name, reason),
            },
            "query_external_research" if self.has_research() => {
                match parse(&call.input, QueryExternalResearch::from_input) {
                    Ok(input) => ToolResult::success(self.query_external_research(&input.query).await),
                    Err(reason) => rejected(name, reason),
                }
            }
            _ => unknown_tool(name),
        }
    }
}

/// Tools available to the research agent.
#[derive(Clone)]
pub struct ResearchTools {
    state: SharedState,
}

impl ResearchTools {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Declarations of the research agent's tools.
    pub fn declarations() -> Vec<claude::Tool> {
        vec![UpdateResearchLog::as_tool()]
    }
}

#[async_trait]
impl ToolExecutor for ResearchTools {
    fn tools(&self) -> Vec<claude::Tool> {
        Self::declarations()
    }

    async fn execute(&self, call: ToolUse) -> ToolResult {
        debug!(tool = %call.name, "research tool call");
        let name = call.name.as_str();

        if name != UpdateResearchLog::tool_name() {
            return unknown_tool(name);
        }

        let parsed = parse(&call.input, UpdateResearchLog::from_input).and_then(|input| {
            let category = input
                .category
                .parse::<ResearchCategory>()
                .map_err(Rejected::Category)?;
            Ok((input.new_entry, category))
        });
        match parsed {
            Ok((entry, category)) => {
                ToolResult::success(update_research_log(&self.state, &entry, category).await)
            }
            Err(reason) => rejected(name, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GameState;
    use serde_json::json;

    fn call(name: &str, input: Value) -> ToolUse {
        ToolUse {
            id: "toolu_test".to_string(),
            name: name.to_string(),
            input,
        }
    }

    fn schema_enum(schema: &Value, field: &str) -> Vec<String> {
        schema["properties"][field]["enum"]
            .as_array()
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_game_log_schema_matches_categories() {
        let schema = UpdateGameLog::input_schema();
        let expected: Vec<String> = GameLogCategory::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(schema_enum(&schema, "category"), expected);
        assert_eq!(schema["properties"]["category"]["default"], "event");
        assert_eq!(schema["required"], json!(["new_entry"]));
    }

    #[test]
    fn test_research_log_schema_matches_categories() {
        let schema = UpdateResearchLog::input_schema();
        let expected: Vec<String> = ResearchCategory::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(schema_enum(&schema, "category"), expected);
        assert_eq!(schema["properties"]["category"]["default"], "info");
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(UpdateGameLog::tool_name(), "update_game_log");
        assert_eq!(AddPlayerItem::tool_name(), "add_player_item");
        assert_eq!(RemovePlayerItem::tool_name(), "remove_player_item");
        assert_eq!(QueryExternalResearch::tool_name(), "query_external_research");
        assert!(AddPlayerItem::tool_description().contains("inventory"));
    }

    #[test]
    fn test_narrator_tool_set() {
        let tools = NarratorTools::new(GameState::new().into_shared());
        let names: Vec<String> = tools.tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["update_game_log", "add_player_item", "remove_player_item"]);
    }

    #[tokio::test]
    async fn test_update_game_log_defaults_to_event() {
        let state = GameState::new().into_shared();
        let tools = NarratorTools::new(state.clone());

        let result = tools
            .execute(call("update_game_log", json!({"new_entry": "Door kicked open"})))
            .await;

        assert!(!result.is_error);
        assert_eq!(result.content, "Game log updated with a event entry.");
        let guard = state.lock().await;
        assert_eq!(guard.game_log[0].category, GameLogCategory::Event);
        assert_eq!(guard.game_log[0].entry, "Door kicked open");
    }

    #[tokio::test]
    async fn test_unknown_category_rejected() {
        let state = GameState::new().into_shared();
        let tools = NarratorTools::new(state.clone());

        let result = tools
            .execute(call(
                "update_game_log",
                json!({"new_entry": "x", "category": "gossip"}),
            ))
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("gossip"));
        assert!(result.content.contains("ambient"));
        assert!(state.lock().await.game_log.is_empty());
    }

    #[tokio::test]
    async fn test_missing_argument_rejected() {
        let state = GameState::new().into_shared();
        let tools = NarratorTools::new(state.clone());

        let result = tools
            .execute(call("add_player_item", json!({"description": "no name"})))
            .await;

        assert!(result.is_error);
        assert!(result.content.starts_with("Invalid input for add_player_item"));
        assert!(state.lock().await.items.is_empty());
    }

    #[tokio::test]
    async fn test_research_tool_hidden_without_bridge() {
        let tools = NarratorTools::new(GameState::new().into_shared());
        let result = tools
            .execute(call("query_external_research", json!({"query": "anything"})))
            .await;
        assert!(result.is_error);
        assert_eq!(result.content, "Unknown tool: query_external_research");
    }

    #[tokio::test]
    async fn test_research_tools_only_log_research() {
        let state = GameState::new().into_shared();
        let tools = ResearchTools::new(state.clone());

        let ok = tools
            .execute(call(
                "update_research_log",
                json!({"new_entry": "Hospital badges use RFID", "category": "Technical"}),
            ))
            .await;
        assert_eq!(ok.content, "Research log updated with a technical entry.");

        let refused = tools
            .execute(call("add_player_item", json!({"item_name": "badge"})))
            .await;
        assert!(refused.is_error);

        let guard = state.lock().await;
        assert_eq!(guard.research_log.len(), 1);
        assert!(guard.items.is_empty());
    }
}

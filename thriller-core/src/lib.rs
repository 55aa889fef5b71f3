//! Game state and turn persistence for the Eternal Hunt narrator.
//!
//! This crate provides:
//! - The game state: game log, research log and inventory
//! - JSON save files with atomic writes and an environment-overridable path
//! - The tools the narrator and research agents call to change the state
//! - `GameSession`, which runs one turn per player message and autosaves
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use thriller_core::{ClaudeRuntime, GameSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::from_env();
//!     let runtime = Arc::new(ClaudeRuntime::from_env()?.with_config(&config));
//!     let session = GameSession::new(config, runtime);
//!
//!     session.autoload(None).await?;
//!     println!("{}", session.respond("I look out the window").await);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod content;
pub mod entry;
pub mod headless;
pub mod narrator;
pub mod persist;
pub mod router;
pub mod runtime;
pub mod session;
pub mod state;
pub mod testing;

// Re-export for convenience
pub use thriller_macros::Tool;

// Primary public API
pub use config::SessionConfig;
pub use entry::{GameLogCategory, GameLogEntry, InventoryItem, ResearchCategory, ResearchLogEntry};
pub use headless::BlockingSession;
pub use persist::{load_state, resolve_save_path, save_state, PersistError};
pub use router::Router;
pub use runtime::{AgentDefinition, AgentRuntime, ClaudeRuntime, RunResult, RuntimeError, ToolExecutor};
pub use session::{AutosaveStatus, GameSession, SessionError, TurnEvent, TurnOutcome};
pub use state::{GameState, ItemChange, SharedState};
pub use testing::{ScriptedRuntime, ScriptedTurn, TestHarness};

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    /// Marks a location on the player's map
    #[derive(Tool, Deserialize)]
    #[tool(name = "mark_location")]
    struct MarkLocation {
        /// Place name like "Flushing Meadows"
        place: String,
        /// How safe the place feels
        #[tool(one_of = "safe, unsure, hostile", default = "unsure")]
        #[serde(default)]
        safety: String,
        /// Optional note
        note: Option<String>,
    }

    #[test]
    fn test_tool_derive() {
        assert_eq!(MarkLocation::tool_name(), "mark_location");
        assert_eq!(
            MarkLocation::tool_description(),
            "Marks a location on the player's map"
        );
    }

    #[test]
    fn test_tool_schema() {
        let schema = MarkLocation::input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["place"]["type"], "string");
        assert_eq!(schema["properties"]["note"]["type"], "string");
        assert_eq!(
            schema["properties"]["safety"]["enum"],
            serde_json::json!(["safe", "unsure", "hostile"])
        );
        assert_eq!(schema["properties"]["safety"]["default"], "unsure");

        // place is required; safety has a default and note is an Option
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "place"));
        assert!(!required.iter().any(|v| v == "safety"));
        assert!(!required.iter().any(|v| v == "note"));
    }

    #[test]
    fn test_from_input() {
        let parsed = MarkLocation::from_input(&serde_json::json!({"place": "Astoria"})).unwrap();
        assert_eq!(parsed.place, "Astoria");
        assert!(parsed.note.is_none());
        assert!(MarkLocation::from_input(&serde_json::json!({"note": "x"})).is_err());
    }
}

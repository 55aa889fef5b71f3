//! Agent definitions for the narrator and the research agent.
//!
//! The narrator is rebuilt every turn so its instructions always carry the
//! current game log and inventory.

use super::tools::{NarratorTools, ResearchTools};
use crate::config::SessionConfig;
use crate::content::GAME_STORY;
use crate::runtime::{AgentDefinition, ToolExecutor};
use crate::state::GameState;
use std::fmt::Write;

pub const NARRATOR_NAME: &str = "Thriller Narrator";
pub const RESEARCH_NAME: &str = "Research Agent";

const NARRATOR_HEADER: &str = include_str!("prompts/narrator_header.txt");
const NARRATOR_TOOLS: &str = include_str!("prompts/narrator_tools.txt");
const NARRATOR_RESEARCH: &str = include_str!("prompts/narrator_research.txt");
const RESEARCH_BRIEF: &str = include_str!("prompts/research.txt");

/// Narrator context for `state` with the built-in story.
pub fn render_context(state: &GameState) -> String {
    render_context_with_story(state, GAME_STORY)
}

/// Narrator context: header, world brief, game log, inventory and tool
/// instructions, in that order.
pub fn render_context_with_story(state: &GameState, story: &str) -> String {
    let mut out = String::new();

    out.push_str(NARRATOR_HEADER.trim_end());
    out.push_str("\n\nThe game world is described here:\n");
    out.push_str(story.trim_end());

    out.push_str("\n\nCurrent game details are stored here:\n");
    if state.game_log.is_empty() {
        out.push_str("(no events recorded yet)\n");
    }
    for entry in &state.game_log {
        let _ = writeln!(out, "- [{}] {}", entry.category, entry.entry);
    }

    out.push_str("\nThe player's current inventory is listed here:\n");
    if state.items.is_empty() {
        out.push_str("(empty)\n");
    }
    for item in &state.items {
        if item.description.is_empty() {
            let _ = writeln!(out, "- {}", item.name);
        } else {
            let _ = writeln!(out, "- {}: {}", item.name, item.description);
        }
    }

    out.push('\n');
    out.push_str(NARRATOR_TOOLS.trim_end());
    out
}

/// Narrator definition for this turn.
pub fn narrator_definition(
    state: &GameState,
    config: &SessionConfig,
    tools: &NarratorTools,
) -> AgentDefinition {
    let mut instructions = render_context_with_story(state, &config.story);
    if tools.has_research() {
        instructions.push('\n');
        instructions.push_str(NARRATOR_RESEARCH.trim_end());
    }

    AgentDefinition::new(NARRATOR_NAME, instructions)
        .with_model(config.model.clone())
        .with_tools(tools.tools())
}

/// The research agent's standing brief.
pub fn research_instructions() -> &'static str {
    RESEARCH_BRIEF
}

pub fn research_definition(config: &SessionConfig) -> AgentDefinition {
    AgentDefinition::new(RESEARCH_NAME, research_instructions().trim_end())
        .with_model(config.model.clone())
        .with_tools(ResearchTools::declarations())
}

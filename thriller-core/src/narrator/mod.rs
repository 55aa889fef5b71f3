//! The narrator agent: its instructions, its tools and the clean-up of its
//! output.

mod agent;
mod scrub;
pub mod tools;

pub use agent::{
    narrator_definition, render_context, render_context_with_story, research_definition,
    research_instructions, NARRATOR_NAME, RESEARCH_NAME,
};
pub use scrub::scrub_tool_meta;
pub use tools::{NarratorTools, ResearchBridge, ResearchTools};

//! The seam between the game and the agent runtime.
//!
//! The session never talks to a model directly. It hands an
//! [`AgentDefinition`] and the player's message to an [`AgentRuntime`],
//! which may call back into a [`ToolExecutor`] any number of times before
//! producing the final text.

mod claude_runtime;

pub use claude::{Tool, ToolResult, ToolUse};
pub use claude_runtime::ClaudeRuntime;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from running an agent.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Claude API error: {0}")]
    Api(#[from] claude::Error),

    #[error("No API key configured - set ANTHROPIC_API_KEY")]
    NoApiKey,

    #[error("Agent failed: {0}")]
    Agent(String),
}

/// Everything the runtime needs to run one agent.
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    pub name: String,
    pub instructions: String,
    /// Model identifier; the runtime's default when `None`.
    pub model: Option<String>,
    pub tools: Vec<Tool>,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: None,
            tools: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Result of one agent run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub final_output: String,
    pub tool_calls: usize,
}

/// Executes the tool calls an agent makes.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Declarations of the tools this executor understands.
    fn tools(&self) -> Vec<Tool>;

    /// Run one tool call. Failures are reported in the result, never raised.
    async fn execute(&self, call: ToolUse) -> ToolResult;
}

/// Runs an agent to completion.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn run(
        &self,
        agent: &AgentDefinition,
        message: &str,
        tools: &dyn ToolExecutor,
    ) -> Result<RunResult, RuntimeError>;
}

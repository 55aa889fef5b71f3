//! Agent runtime backed by the Claude Messages API.

use super::{AgentDefinition, AgentRuntime, RunResult, RuntimeError, ToolExecutor};
use crate::config::SessionConfig;
use async_trait::async_trait;
use claude::{Claude, Message, Request, DEFAULT_MAX_TOOL_ROUNDS};
use tracing::debug;

/// Runs agents against Claude, executing tool calls until the model answers.
#[derive(Debug, Clone)]
pub struct ClaudeRuntime {
    client: Claude,
    max_tokens: usize,
    temperature: Option<f32>,
    max_tool_rounds: usize,
}

impl ClaudeRuntime {
    pub fn new(client: Claude) -> Self {
        Self {
            client,
            max_tokens: 4096,
            temperature: Some(0.8),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Create a runtime from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> Result<Self, RuntimeError> {
        let client = Claude::from_env().map_err(|_| RuntimeError::NoApiKey)?;
        Ok(Self::new(client))
    }

    /// Take generation limits from a session config.
    pub fn with_config(mut self, config: &SessionConfig) -> Self {
        self.max_tokens = config.max_tokens;
        self.temperature = config.temperature;
        self.max_tool_rounds = config.max_tool_rounds;
        self
    }

    fn build_request(&self, agent: &AgentDefinition, message: &str) -> Request {
        let mut request = Request::new(vec![Message::user(message)])
            .with_system(&agent.instructions)
            .with_max_tokens(self.max_tokens);

        if !agent.tools.is_empty() {
            request = request.with_tools(agent.tools.clone());
        }

        if let Some(ref model) = agent.model {
            request = request.with_model(model);
        }

        if let Some(temp) = self.temperature {
            request = request.with_temperature(temp);
        }

        request
    }
}

#[async_trait]
impl AgentRuntime for ClaudeRuntime {
    async fn run(
        &self,
        agent: &AgentDefinition,
        message: &str,
        tools: &dyn ToolExecutor,
    ) -> Result<RunResult, RuntimeError> {
        debug!(agent = %agent.name, tools = ?agent.tool_names(), "running agent");

        let request = self.build_request(agent, message);
        let run = self
            .client
            .complete_with_tools(request, self.max_tool_rounds, |call| tools.execute(call))
            .await?;

        Ok(RunResult {
            final_output: run.text,
            tool_calls: run.tool_calls,
        })
    }
}

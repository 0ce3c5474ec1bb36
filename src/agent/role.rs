//! Role-configured agents
//!
//! A `CrewAgent` is a persona (role, goal, backstory) bound to a model. It runs
//! one task at a time through a bounded reason-act loop.

use std::sync::Arc;

use crate::agent::loop_state::AgentLoopState;
use crate::agent::task::TaskSpec;
use crate::core::{
    CrewError, Message, Result, SessionContext, TaskOutput, ToolDefinition, ToolResult,
};
use crate::llm::{GenerateOptions, LLMProvider};
use crate::tools::ToolRegistry;

/// An agent with a fixed role in the crew
#[derive(Clone)]
pub struct CrewAgent {
    role: String,
    goal: String,
    backstory: String,
    model: String,
    /// Maximum reasoning iterations per task
    max_iter: usize,
    /// Whether this agent may call tools from the registry
    use_tools: bool,
    llm: Arc<dyn LLMProvider>,
    tools: Arc<ToolRegistry>,
}

/// Builder for creating CrewAgents
pub struct CrewAgentBuilder {
    role: String,
    goal: Option<String>,
    backstory: Option<String>,
    model: Option<String>,
    max_iter: usize,
    use_tools: bool,
    llm: Option<Arc<dyn LLMProvider>>,
    tools: Option<Arc<ToolRegistry>>,
}

impl CrewAgentBuilder {
    /// Create a new builder for the given role
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: None,
            backstory: None,
            model: None,
            max_iter: 10,
            use_tools: false,
            llm: None,
            tools: None,
        }
    }

    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }

    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = Some(backstory.into());
        self
    }

    /// Set the model to use
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set maximum reasoning iterations
    pub fn max_iter(mut self, max: usize) -> Self {
        self.max_iter = max;
        self
    }

    /// Set the LLM provider
    pub fn llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Give the agent a tool registry
    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self.use_tools = true;
        self
    }

    /// Build the CrewAgent
    pub fn build(self) -> Result<CrewAgent> {
        let llm = self
            .llm
            .ok_or_else(|| CrewError::config(format!("Agent '{}' has no LLM provider", self.role)))?;
        let model = self
            .model
            .ok_or_else(|| CrewError::config(format!("Agent '{}' has no model", self.role)))?;

        Ok(CrewAgent {
            goal: self
                .goal
                .unwrap_or_else(|| format!("Complete the tasks assigned to the {}.", self.role)),
            backstory: self.backstory.unwrap_or_default(),
            role: self.role,
            model,
            max_iter: self.max_iter.max(1),
            use_tools: self.use_tools,
            llm,
            tools: self.tools.unwrap_or_else(|| Arc::new(ToolRegistry::new())),
        })
    }
}

impl CrewAgent {
    /// Create a builder
    pub fn builder(role: impl Into<String>) -> CrewAgentBuilder {
        CrewAgentBuilder::new(role)
    }

    fn system_prompt(&self) -> String {
        let mut prompt = format!("You are the {}.\n\nGOAL: {}\n", self.role, self.goal);
        if !self.backstory.is_empty() {
            prompt.push_str(&format!("\nBACKSTORY: {}\n", self.backstory));
        }
        if self.use_tools && self.tools.has_search() {
            prompt.push_str(
                "\nYou may call the web_search tool when you need current documentation. \
                 When you have enough information, answer directly without calling tools.",
            );
        }
        prompt
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        if !self.use_tools {
            return Vec::new();
        }
        self.tools.all_definitions().into_iter().cloned().collect()
    }

    /// Run one task against a snapshot of the session.
    ///
    /// The loop ends at the first answer without tool calls. At the iteration
    /// cap the model is asked once more, without tools, for its best answer.
    /// An empty answer leaves `result` unset.
    pub async fn execute(&self, task: &TaskSpec, context: &SessionContext) -> Result<TaskOutput> {
        let system = Message::system(self.system_prompt());
        let prompt = task.build_prompt(context);
        let tool_defs = self.tool_definitions();
        let mut state = AgentLoopState::new(self.max_iter);

        tracing::debug!(role = %self.role, model = %self.model, "task started");

        while state.should_continue() {
            let messages = vec![
                system.clone(),
                Message::user(with_observations(&prompt, state.observations())),
            ];

            let response = if tool_defs.is_empty() {
                self.llm
                    .chat(&self.model, &messages, Some(Self::options()))
                    .await?
            } else {
                self.llm
                    .chat_with_tools(&self.model, &messages, &tool_defs, Some(Self::options()))
                    .await?
            };

            if let Some(usage) = &response.usage {
                tracing::debug!(
                    role = %self.role,
                    round = state.rounds() + 1,
                    total_tokens = usage.total_tokens,
                    "model responded"
                );
            }

            if response.tool_calls.is_empty() {
                state.finish(response.content);
                break;
            }

            let mut results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                let result = match self.tools.execute(call).await {
                    Ok(result) => result,
                    Err(e) => ToolResult::failure(&call.name, e.to_string()),
                };
                results.push(result);
            }
            state.record_round(results);
        }

        let answer = match state.take_answer() {
            Some(answer) => answer,
            None => {
                tracing::warn!(role = %self.role, max_iter = self.max_iter, "iteration cap reached");
                self.final_attempt(&system, &prompt, &state).await?
            }
        };

        let result = Some(answer.trim().to_string()).filter(|a| !a.is_empty());

        Ok(TaskOutput::new(
            &self.role,
            Some(task.description.clone()),
            result,
        ))
    }

    /// Ask for an answer from the observations gathered so far
    async fn final_attempt(
        &self,
        system: &Message,
        prompt: &str,
        state: &AgentLoopState,
    ) -> Result<String> {
        let messages = vec![
            system.clone(),
            Message::user(format!(
                "{}\n\nYou have run out of tool calls. Give your best final answer now.",
                with_observations(prompt, state.observations())
            )),
        ];

        let response = self
            .llm
            .chat(&self.model, &messages, Some(Self::options()))
            .await?;
        Ok(response.content)
    }

    fn options() -> GenerateOptions {
        GenerateOptions {
            temperature: Some(0.3),
            ..Default::default()
        }
    }
}

/// The task prompt followed by the tool results gathered so far
fn with_observations(prompt: &str, observations: &[ToolResult]) -> String {
    if observations.is_empty() {
        return prompt.to_string();
    }

    let mut out = format!("{}\n\nResults of your earlier tool calls:\n", prompt);
    for (i, obs) in observations.iter().enumerate() {
        let status = if obs.success { "ok" } else { "failed" };
        out.push_str(&format!(
            "\n[{}] {} ({}):\n{}\n",
            i + 1,
            obs.tool_name,
            status,
            obs.output
        ));
    }
    out
}

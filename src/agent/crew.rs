//! The pentest crew
//!
//! Wires the command advisor and the report writer to their tasks, the LLM
//! provider and the search tool, and exposes them as the session loop's
//! `Advisor` and `Reporter`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::output_log::OutputLog;
use crate::agent::role::CrewAgent;
use crate::agent::task::TaskSpec;
use crate::agent::units::{Advisor, Reporter};
use crate::core::{Config, Result, SessionContext, TaskOutput};
use crate::llm::{LLMProvider, OpenAiClient};
use crate::tools::{SerperSearch, ToolRegistry};

pub const ADVISOR_ROLE: &str = "AWS Pentest Advisor";
pub const REPORTER_ROLE: &str = "Report Writer";

/// Command advisor and report writer with their tasks
pub struct Crew {
    advisor: CrewAgent,
    advice_task: TaskSpec,
    reporter: CrewAgent,
    report_task: TaskSpec,
    output_log: Option<OutputLog>,
}

impl Crew {
    /// Build the production crew: OpenAI for reasoning, Serper for search.
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm: Arc<dyn LLMProvider> = Arc::new(OpenAiClient::from_config(config)?);

        let tools = if config.search.enabled {
            ToolRegistry::with_search(Arc::new(SerperSearch::from_config(config)?))
        } else {
            ToolRegistry::new()
        };

        Self::with_provider(config, llm, Arc::new(tools))
    }

    /// Build the crew on top of any provider and tool registry
    pub fn with_provider(
        config: &Config,
        llm: Arc<dyn LLMProvider>,
        tools: Arc<ToolRegistry>,
    ) -> Result<Self> {
        let advisor = CrewAgent::builder(ADVISOR_ROLE)
            .goal(
                "Guide the pentester through AWS penetration testing with specific AWS CLI \
                 commands and strategies based on their input.",
            )
            .backstory(
                "You are an experienced AWS pentester AI assistant with extensive knowledge of \
                 AWS CLI commands and best practices for security assessments.",
            )
            .model(&config.models.advisor)
            .max_iter(config.agent.advisor_max_iter)
            .llm(llm.clone())
            .tools(tools)
            .build()?;

        let reporter = CrewAgent::builder(REPORTER_ROLE)
            .goal(
                "Generate a comprehensive AWS pentesting report based on the pentester's input \
                 and the test outcomes.",
            )
            .backstory(
                "You are a seasoned report writer who documents the entire AWS pentesting \
                 process professionally.",
            )
            .model(&config.models.reporter)
            .max_iter(config.agent.reporter_max_iter)
            .llm(llm)
            .build()?;

        Ok(Self {
            advisor,
            advice_task: TaskSpec::command_advice(),
            reporter,
            report_task: TaskSpec::pentest_report(),
            output_log: config.logging.output_log_file.clone().map(OutputLog::new),
        })
    }

    async fn run(
        &self,
        agent: &CrewAgent,
        task: &TaskSpec,
        context: &SessionContext,
    ) -> Result<TaskOutput> {
        let output = agent.execute(task, context).await?;

        if let Some(ref log) = self.output_log {
            if let Err(e) = log.append(&output) {
                tracing::warn!(path = %log.path().display(), error = %e, "failed to write crew output log");
            }
        }

        Ok(output)
    }
}

#[async_trait]
impl Advisor for Crew {
    async fn advise(&self, context: &SessionContext) -> Result<TaskOutput> {
        self.run(&self.advisor, &self.advice_task, context).await
    }
}

#[async_trait]
impl Reporter for Crew {
    async fn report(&self, context: &SessionContext) -> Result<TaskOutput> {
        self.run(&self.reporter, &self.report_task, context).await
    }
}

//! Task definitions
//!
//! A task is a unit of work handed to one agent together with the session
//! context.

use crate::core::SessionContext;

/// One task an agent can be asked to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    /// What the agent should do
    pub description: String,
    /// Shape of a good answer
    pub expected_output: String,
}

impl TaskSpec {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
        }
    }

    /// The command advisor's task
    pub fn command_advice() -> Self {
        Self::new(
            "Ask for specific details on the AWS pentesting target and guide with relevant AWS CLI commands.",
            "An AWS CLI command suggestion and an explanation based on the pentester's input.",
        )
    }

    /// The report writer's task
    pub fn pentest_report() -> Self {
        Self::new(
            "Generate a professional AWS pentesting report.",
            "A detailed report summarizing the AWS pentesting process and its results.",
        )
    }

    /// Build the user prompt for this task
    pub fn build_prompt(&self, context: &SessionContext) -> String {
        format!(
            "TASK: {}\n\nEXPECTED OUTPUT: {}\n\n=== SESSION CONTEXT ===\n{}\n=== END CONTEXT ===",
            self.description,
            self.expected_output,
            context.render().trim_end()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TurnKind, TurnRecord};

    #[test]
    fn test_prompt_includes_context() {
        let context = SessionContext {
            target: Some("IAM policies".to_string()),
            history: vec![TurnRecord::now(TurnKind::TargetSet, "IAM policies")],
        };

        let prompt = TaskSpec::command_advice().build_prompt(&context);
        assert!(prompt.starts_with("TASK: Ask for specific details"));
        assert!(prompt.contains("EXPECTED OUTPUT: An AWS CLI command suggestion"));
        assert!(prompt.contains("Current AWS pentest target: IAM policies"));
    }

    #[test]
    fn test_prompt_for_empty_context() {
        let prompt = TaskSpec::pentest_report().build_prompt(&SessionContext::empty());
        assert!(prompt.contains("No pentest target has been provided yet."));
    }
}

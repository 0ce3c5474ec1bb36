//! Shared types used across pentest-crew modules
//!
//! Chat messages and tool definitions for the LLM layer, and the turn,
//! output and context types the session loop hands to its collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{CrewError, Result};

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// A tool call made by the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: serde_json::Value,
    /// Why the model's argument string could not be decoded, if it couldn't
    #[serde(skip)]
    pub argument_error: Option<String>,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
            argument_error: None,
        }
    }

    /// A call whose arguments were not valid JSON
    pub fn malformed(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: serde_json::Value::Null,
            argument_error: Some(error.into()),
        }
    }

    /// Get a string argument by key
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// Result of executing a tool
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub tool_name: String,
    pub success: bool,
    /// Output from the tool, or the error text on failure
    pub output: String,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            output: output.into(),
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            output: error.into(),
        }
    }
}

/// What a turn record captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    /// The user named a new pentest target
    TargetSet,
    /// The user pasted the output of a command they ran
    CommandResult,
}

impl std::fmt::Display for TurnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnKind::TargetSet => write!(f, "target"),
            TurnKind::CommandResult => write!(f, "command result"),
        }
    }
}

/// One user exchange. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub kind: TurnKind,
    /// The raw user-supplied text
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl TurnRecord {
    /// Record a turn stamped with the current time
    pub fn now(kind: TurnKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Read-only snapshot of the session handed to one collaborator call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub target: Option<String>,
    pub history: Vec<TurnRecord>,
}

impl SessionContext {
    /// Context with no target and no history
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the user has said anything yet
    pub fn is_empty(&self) -> bool {
        self.target.is_none() && self.history.is_empty()
    }

    /// Render the context as prompt text
    pub fn render(&self) -> String {
        if self.is_empty() {
            return "No pentest target has been provided yet.".to_string();
        }

        let mut out = String::new();
        if let Some(ref target) = self.target {
            out.push_str(&format!("Current AWS pentest target: {}\n", target));
        }

        if !self.history.is_empty() {
            out.push_str("\nSession history (oldest first):\n");
            for (i, turn) in self.history.iter().enumerate() {
                out.push_str(&format!(
                    "\n[{}] {} at {}\n{}\n",
                    i + 1,
                    turn.kind,
                    turn.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                    turn.text
                ));
            }
        }

        out
    }
}

/// Raw result of a collaborator call.
///
/// Fields are optional: a backend may return nothing usable, and callers
/// check before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Role of the agent that produced the output
    pub agent: String,
    /// Description of the work performed
    pub description: Option<String>,
    /// Suggested command text or report body
    pub result: Option<String>,
}

impl TaskOutput {
    pub fn new(
        agent: impl Into<String>,
        description: Option<String>,
        result: Option<String>,
    ) -> Self {
        Self {
            agent: agent.into(),
            description,
            result,
        }
    }

    /// Description, or a `MissingField` error when absent or blank
    pub fn description(&self) -> Result<&str> {
        non_blank(&self.description).ok_or_else(|| CrewError::missing_field(&self.agent, "description"))
    }

    /// Result payload, or a `MissingField` error when absent or blank
    pub fn result(&self) -> Result<&str> {
        non_blank(&self.result).ok_or_else(|| CrewError::missing_field(&self.agent, "result"))
    }

    /// Interpret the output as an advisor suggestion
    pub fn into_suggestion(self) -> Result<Suggestion> {
        let explanation = self.description()?.to_string();
        let command_text = self.result()?.to_string();
        Ok(Suggestion {
            command_text,
            explanation,
        })
    }

    /// Interpret the output as a finished report
    pub fn into_report(self) -> Result<ReportDocument> {
        self.description()?;
        let body = self.result()?.to_string();
        Ok(ReportDocument { body })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Advisor output for one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub command_text: String,
    pub explanation: String,
}

/// Report writer output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    pub body: String,
}

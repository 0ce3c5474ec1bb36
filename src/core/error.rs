//! Error types for pentest-crew
//!
//! One error enum shared by the session loop, the crew and the HTTP clients.

use thiserror::Error;

/// Main error type for pentest-crew operations
#[derive(Error, Debug)]
pub enum CrewError {
    /// Missing or invalid configuration. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A collaborator result lacked a field the caller needs
    #[error("Task output from '{agent}' is missing the '{field}' field")]
    MissingField { agent: String, field: &'static str },

    /// A collaborator call exceeded its time budget
    #[error("External call timed out after {0} seconds")]
    Timeout(u64),

    /// The user pressed Ctrl-C while a collaborator call was running
    #[error("Interrupted by user")]
    Interrupted,

    /// Chat completion API errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Web search errors
    #[error("Search error: {0}")]
    Search(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for pentest-crew operations
pub type Result<T> = std::result::Result<T, CrewError>;

impl CrewError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create a search error
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Create a missing-field error for the given agent role
    pub fn missing_field(agent: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            agent: agent.into(),
            field,
        }
    }

    /// Whether the session loop may carry on after this error.
    ///
    /// Configuration errors end the process and an interrupt ends the session.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_fatal() {
        assert!(!CrewError::config("OPENAI_API_KEY is not set").is_recoverable());
        assert!(CrewError::missing_field("Report Writer", "result").is_recoverable());
        assert!(CrewError::Timeout(600).is_recoverable());
        assert!(!CrewError::Interrupted.is_recoverable());
    }

    #[test]
    fn test_missing_field_message() {
        let err = CrewError::missing_field("AWS Pentest Advisor", "description");
        assert_eq!(
            err.to_string(),
            "Task output from 'AWS Pentest Advisor' is missing the 'description' field"
        );
    }
}

//! Collaborator contracts used by the session loop
//!
//! The loop only knows these two capabilities. `Crew` implements both on top
//! of an LLM; tests substitute scripted versions.

use async_trait::async_trait;

use crate::core::{Result, SessionContext, TaskOutput};

/// Suggests the next command for the current session
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, context: &SessionContext) -> Result<TaskOutput>;
}

/// Writes the final report for a session
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn report(&self, context: &SessionContext) -> Result<TaskOutput>;
}

//! pentest-crew - AWS Penetration Testing Copilot
//!
//! An interactive assistant that pairs a command advisor with a report
//! writer. The user names an AWS target, runs the suggested AWS CLI commands
//! themselves and pastes the output back; when the session ends the whole
//! history is turned into a report.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, logging and error handling
//! - **LLM**: LLM provider abstraction with an OpenAI implementation
//! - **Tools**: Web search tool and the tool registry
//! - **Agent**: Crew agents, tasks, collaborator contracts and session state
//! - **CLI**: Console I/O and the interactive session loop
//!
//! # Usage
//!
//! ```rust,no_run
//! use pentest_crew::{Config, Repl};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load().unwrap();
//!     config.validate().unwrap();
//!
//!     let mut repl = Repl::with_config(&config).unwrap();
//!     repl.run().await.unwrap();
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::Crew;
pub use cli::{Repl, SessionOutcome};
pub use core::{Config, CrewError, Result};

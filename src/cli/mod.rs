//! CLI module - command-line interface
//!
//! Contains the console abstraction, prompt input handling and the session loop.

pub mod commands;
pub mod console;
pub mod repl;

pub use console::{Console, ConsoleInput, StdConsole};
pub use repl::{Repl, SessionOutcome};

//! Prompt input handling
//!
//! Turns raw console input into what the session loop should do next.

use crate::cli::console::ConsoleInput;

/// Result of reading one prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAction {
    /// Leave the current prompt level
    Exit,
    /// Abort the whole session now, without a report
    Interrupt,
    /// Nothing entered; ask again
    Empty,
    /// Free text for the session
    Text(String),
}

/// Classify console input at a prompt.
///
/// The exit keyword matches case-insensitively after trimming. End of input
/// counts as the exit keyword.
pub fn handle_input(input: ConsoleInput, exit_keyword: &str) -> PromptAction {
    match input {
        ConsoleInput::Interrupt => PromptAction::Interrupt,
        ConsoleInput::Eof => PromptAction::Exit,
        ConsoleInput::Line(line) => {
            let text = line.trim();
            if text.is_empty() {
                PromptAction::Empty
            } else if text.eq_ignore_ascii_case(exit_keyword.trim()) {
                PromptAction::Exit
            } else {
                PromptAction::Text(text.to_string())
            }
        }
    }
}

//! Bookkeeping for one task's reason-act loop

use crate::core::ToolResult;

/// Progress of a single task: rounds used, tool results gathered, and the
/// answer once the model gives one.
#[derive(Debug, Clone)]
pub struct AgentLoopState {
    rounds: usize,
    max_iter: usize,
    observations: Vec<ToolResult>,
    answer: Option<String>,
}

impl AgentLoopState {
    /// Start a task that may use at most `max_iter` tool rounds
    pub fn new(max_iter: usize) -> Self {
        Self {
            rounds: 0,
            max_iter,
            observations: Vec::new(),
            answer: None,
        }
    }

    /// Tool rounds completed so far
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// No answer yet and rounds left
    pub fn should_continue(&self) -> bool {
        self.answer.is_none() && self.rounds < self.max_iter
    }

    /// Record the results of one round of tool calls
    pub fn record_round(&mut self, results: Vec<ToolResult>) {
        self.observations.extend(results);
        self.rounds += 1;
    }

    pub fn finish(&mut self, answer: String) {
        self.answer = Some(answer);
    }

    /// The model's answer, if the loop ended with one
    pub fn take_answer(&mut self) -> Option<String> {
        self.answer.take()
    }

    /// Every tool result so far, oldest first
    pub fn observations(&self) -> &[ToolResult] {
        &self.observations
    }
}

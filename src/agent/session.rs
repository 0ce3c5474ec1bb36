//! Pentest session state
//!
//! The session is the only durable state of a run: the current target, the
//! ordered turn history and where the conversation stands.

use crate::core::{SessionContext, TurnKind, TurnRecord};

/// Where the interactive loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the user to name a target
    AwaitingTarget,
    /// Waiting for the output of a command run against the target
    AwaitingCommandResult,
    /// Session over; absorbing
    Terminated,
}

/// Interactive pentest session.
///
/// History is append-only: switching targets keeps every earlier turn.
#[derive(Debug, Clone)]
pub struct Session {
    target: Option<String>,
    history: Vec<TurnRecord>,
    ended: bool,
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self {
            target: None,
            history: Vec::new(),
            ended: false,
            state: SessionState::AwaitingTarget,
        }
    }

    /// Current target, if one has been set
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// All turns, oldest first
    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Set (or switch) the target and start collecting command results
    pub fn set_target(&mut self, text: impl Into<String>) {
        if self.ended {
            return;
        }
        let text = text.into();
        self.history.push(TurnRecord::now(TurnKind::TargetSet, text.clone()));
        self.target = Some(text);
        self.state = SessionState::AwaitingCommandResult;
    }

    /// Record the output of a command the user ran
    pub fn record_command_result(&mut self, text: impl Into<String>) {
        if self.ended {
            return;
        }
        self.history
            .push(TurnRecord::now(TurnKind::CommandResult, text));
    }

    /// Stop collecting results for the current target
    pub fn leave_target(&mut self) {
        if self.state == SessionState::AwaitingCommandResult {
            self.state = SessionState::AwaitingTarget;
        }
    }

    /// End the session. Nothing is recorded afterwards.
    pub fn terminate(&mut self) {
        self.ended = true;
        self.state = SessionState::Terminated;
    }

    /// Owned snapshot for one collaborator call
    pub fn snapshot(&self) -> SessionContext {
        SessionContext {
            target: self.target.clone(),
            history: self.history.clone(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

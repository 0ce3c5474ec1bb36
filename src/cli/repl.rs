//! Interactive session loop
//!
//! Asks for a target, relays pasted command output to the advisor, and hands
//! the whole session to the report writer at the end.

use std::sync::Arc;
use std::time::Duration;

use crate::agent::{Advisor, Crew, Reporter, Session};
use crate::cli::commands::{handle_input, PromptAction};
use crate::cli::console::{Console, StdConsole};
use crate::core::config::AgentConfig;
use crate::core::{Config, CrewError, ReportDocument, Result, SessionContext, Suggestion, TaskOutput};

pub const TARGET_PROMPT: &str = "What AWS service or component would you like to pentest today? (e.g., S3 bucket, EC2 instance, IAM policies): ";
pub const ADVICE_ERROR: &str = "Error processing the output.";
pub const REPORT_ERROR: &str = "Error generating the report.";
pub const INTERRUPTED: &str = "\nSession ended by user.";

/// How a session finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Exit keyword at the target prompt; the report if one could be produced
    Completed(Option<ReportDocument>),
    /// Ctrl-C; no report was attempted
    Interrupted,
}

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl<C: Console> {
    console: C,
    advisor: Arc<dyn Advisor>,
    reporter: Arc<dyn Reporter>,
    session: Session,
    exit_keyword: String,
    call_timeout: Duration,
}

impl Repl<StdConsole> {
    /// Create a terminal REPL backed by the production crew
    pub fn with_config(config: &Config) -> Result<Self> {
        let crew = Arc::new(Crew::from_config(config)?);
        Ok(Self::new(
            StdConsole::new(),
            crew.clone(),
            crew,
            &config.agent,
        ))
    }
}

impl<C: Console> Repl<C> {
    /// Create a REPL from its parts
    pub fn new(
        console: C,
        advisor: Arc<dyn Advisor>,
        reporter: Arc<dyn Reporter>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            console,
            advisor,
            reporter,
            session: Session::new(),
            exit_keyword: config.exit_keyword.clone(),
            call_timeout: Duration::from_secs(config.call_timeout_secs),
        }
    }

    /// The session as it stands
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Access the console (used by tests to inspect output)
    pub fn console(&self) -> &C {
        &self.console
    }

    /// Run the session to completion or interruption
    pub async fn run(&mut self) -> Result<SessionOutcome> {
        let banner = format!(
            "AWS Pentesting session started. Type '{}' to end the session and generate a report.",
            self.exit_keyword
        );
        let result_prompt = format!(
            "Enter the result of the executed AWS CLI command or type '{}' to end: ",
            self.exit_keyword
        );

        self.console.println(&banner);
        if let Err(e) = self.warm_up().await {
            return self.abandon(e);
        }

        loop {
            match self.prompt(TARGET_PROMPT).await? {
                PromptAction::Interrupt => return Ok(self.interrupted()),
                PromptAction::Exit => {
                    self.console.println("Exiting session...");
                    break;
                }
                PromptAction::Empty => continue,
                PromptAction::Text(target) => {
                    self.console.println(&format!("Target set to: {}", target));
                    self.session.set_target(target);
                    tracing::info!(pentest_target = ?self.session.target(), "target set");
                }
            }

            loop {
                match self.prompt(&result_prompt).await? {
                    PromptAction::Interrupt => return Ok(self.interrupted()),
                    PromptAction::Exit => {
                        self.session.leave_target();
                        break;
                    }
                    PromptAction::Empty => continue,
                    PromptAction::Text(result) => {
                        self.console.println(&format!("Processing input: {}", result));
                        self.session.record_command_result(result);
                        if let Err(e) = self.advise().await {
                            return self.abandon(e);
                        }
                    }
                }
            }
        }

        self.console.println("Generating report...");
        self.session.terminate();
        match self.report().await {
            Ok(report) => Ok(SessionOutcome::Completed(report)),
            Err(e) => self.abandon(e),
        }
    }

    async fn prompt(&mut self, prompt: &str) -> Result<PromptAction> {
        let input = self.console.read_line(prompt).await?;
        Ok(handle_input(input, &self.exit_keyword))
    }

    /// Stop the loop on an error it cannot carry on from
    fn abandon(&mut self, err: CrewError) -> Result<SessionOutcome> {
        match err {
            CrewError::Interrupted => Ok(self.interrupted()),
            other => Err(other),
        }
    }

    fn interrupted(&mut self) -> SessionOutcome {
        tracing::info!(turns = self.session.history().len(), "session interrupted by user");
        self.console.println(INTERRUPTED);
        SessionOutcome::Interrupted
    }

    /// One advisor call before any input. Only logged.
    async fn warm_up(&mut self) -> Result<()> {
        let advisor = self.advisor.clone();
        let context = SessionContext::empty();
        let output = self.bounded(advisor.advise(&context)).await;

        match output.and_then(|o| log_completed(&o).map(|_| o)) {
            Ok(_) => tracing::debug!("warm-up run completed"),
            Err(e) if e.is_recoverable() => tracing::error!(error = %e, "warm-up run failed"),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn advise(&mut self) -> Result<Option<Suggestion>> {
        let advisor = self.advisor.clone();
        let context = self.session.snapshot();
        let output = self.bounded(advisor.advise(&context)).await;

        let suggestion = output.and_then(|o| {
            log_completed(&o)?;
            o.into_suggestion()
        });

        match suggestion {
            Ok(suggestion) => {
                self.console
                    .println(&format!("Suggested Command: {}", suggestion.command_text));
                Ok(Some(suggestion))
            }
            Err(e) if e.is_recoverable() => {
                tracing::error!(error = %e, "advisor output could not be processed");
                self.console.println(ADVICE_ERROR);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn report(&mut self) -> Result<Option<ReportDocument>> {
        let reporter = self.reporter.clone();
        let context = self.session.snapshot();
        let output = self.bounded(reporter.report(&context)).await;

        let report = output.and_then(|o| {
            log_completed(&o)?;
            o.into_report()
        });

        match report {
            Ok(report) => {
                self.console
                    .println(&format!("Report Generated: {}", report.body));
                Ok(Some(report))
            }
            Err(e) if e.is_recoverable() => {
                tracing::error!(error = %e, "report could not be generated");
                self.console.println(REPORT_ERROR);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Run one collaborator call under the time limit, giving up early on Ctrl-C
    async fn bounded<F>(&mut self, call: F) -> Result<TaskOutput>
    where
        F: std::future::Future<Output = Result<TaskOutput>>,
    {
        let limit = self.call_timeout;
        tokio::select! {
            biased;
            output = tokio::time::timeout(limit, call) => match output {
                Ok(output) => output,
                Err(_) => Err(CrewError::Timeout(limit.as_secs())),
            },
            _ = self.console.interrupted() => {
                tracing::warn!("collaborator call abandoned on interrupt");
                Err(CrewError::Interrupted)
            }
        }
    }
}

/// Log a completed task. Fails when the output has no description.
fn log_completed(output: &TaskOutput) -> Result<()> {
    let description = output.description()?;
    tracing::info!(
        role = %output.agent,
        description,
        result = output.result.as_deref().unwrap_or("<none>"),
        "{} task completed",
        output.agent
    );
    Ok(())
}

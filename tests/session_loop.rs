//! Session loop integration tests
//!
//! Drives the REPL with a scripted console and counting collaborators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pentest_crew::agent::{Advisor, Reporter, SessionState};
use pentest_crew::cli::{Console, ConsoleInput, Repl, SessionOutcome};
use pentest_crew::core::config::AgentConfig;
use pentest_crew::core::{CrewError, Result, SessionContext, TaskOutput, TurnKind};
use tokio_test::assert_ok;

const TARGET_PROMPT_START: &str = "What AWS service";
const RESULT_PROMPT_START: &str = "Enter the result";

/// Console fed from a script. Returns EOF once the script runs out.
#[derive(Default)]
struct ScriptedConsole {
    inputs: VecDeque<ConsoleInput>,
    prompts: Vec<String>,
    output: Vec<String>,
    /// Press Ctrl-C once this many lines have been read
    interrupt_after: Option<usize>,
}

impl ScriptedConsole {
    fn lines(lines: &[&str]) -> Self {
        Self {
            inputs: lines
                .iter()
                .map(|l| ConsoleInput::Line(l.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    fn with_inputs(inputs: Vec<ConsoleInput>) -> Self {
        Self {
            inputs: inputs.into(),
            ..Default::default()
        }
    }

    fn interrupt_after(mut self, lines_read: usize) -> Self {
        self.interrupt_after = Some(lines_read);
        self
    }

    fn printed(&self, needle: &str) -> usize {
        self.output.iter().filter(|l| l.contains(needle)).count()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&mut self, prompt: &str) -> Result<ConsoleInput> {
        self.prompts.push(prompt.to_string());
        Ok(self.inputs.pop_front().unwrap_or(ConsoleInput::Eof))
    }

    fn println(&mut self, line: &str) {
        self.output.push(line.to_string());
    }

    async fn interrupted(&mut self) {
        match self.interrupt_after {
            Some(n) if self.prompts.len() >= n => {}
            _ => std::future::pending::<()>().await,
        }
    }
}

/// How a fake collaborator answers
#[derive(Clone, Copy)]
enum Reply {
    Complete,
    MissingResult,
    Fail,
    Hang,
}

/// Advisor and reporter double that records every context it sees
struct FakeUnit {
    role: &'static str,
    reply: Reply,
    contexts: Mutex<Vec<SessionContext>>,
}

impl FakeUnit {
    fn new(role: &'static str, reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            role,
            reply,
            contexts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.contexts.lock().unwrap().len()
    }

    fn context(&self, i: usize) -> SessionContext {
        self.contexts.lock().unwrap()[i].clone()
    }

    async fn answer(&self, context: &SessionContext, text: String) -> Result<TaskOutput> {
        self.contexts.lock().unwrap().push(context.clone());
        match self.reply {
            Reply::Complete => Ok(TaskOutput::new(
                self.role,
                Some(format!("{} task", self.role)),
                Some(text),
            )),
            Reply::MissingResult => Ok(TaskOutput::new(
                self.role,
                Some(format!("{} task", self.role)),
                None,
            )),
            Reply::Fail => Err(CrewError::llm("backend unavailable")),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("call should have timed out")
            }
        }
    }
}

#[async_trait]
impl Advisor for FakeUnit {
    async fn advise(&self, context: &SessionContext) -> Result<TaskOutput> {
        let n = self.calls();
        self.answer(context, format!("aws s3api list-buckets # {}", n))
            .await
    }
}

#[async_trait]
impl Reporter for FakeUnit {
    async fn report(&self, context: &SessionContext) -> Result<TaskOutput> {
        let body = format!("Report covering {} turns", context.history.len());
        self.answer(context, body).await
    }
}

struct Harness {
    repl: Repl<ScriptedConsole>,
    advisor: Arc<FakeUnit>,
    reporter: Arc<FakeUnit>,
}

fn harness_with(console: ScriptedConsole, advisor: Reply, reporter: Reply) -> Harness {
    let advisor = FakeUnit::new("AWS Pentest Advisor", advisor);
    let reporter = FakeUnit::new("Report Writer", reporter);
    let config = AgentConfig {
        call_timeout_secs: 5,
        ..AgentConfig::default()
    };
    let repl = Repl::new(console, advisor.clone(), reporter.clone(), &config);
    Harness {
        repl,
        advisor,
        reporter,
    }
}

fn harness(lines: &[&str]) -> Harness {
    harness_with(ScriptedConsole::lines(lines), Reply::Complete, Reply::Complete)
}

#[tokio::test]
async fn test_end_to_end_single_target() {
    let mut h = harness(&[
        "S3 bucket",
        "aws s3 ls output: bucket-A, bucket-B",
        "exit",
        "exit",
    ]);

    let outcome = h.repl.run().await.unwrap();

    let history = h.repl.session().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, TurnKind::TargetSet);
    assert_eq!(history[0].text, "S3 bucket");
    assert_eq!(history[1].kind, TurnKind::CommandResult);
    assert_eq!(history[1].text, "aws s3 ls output: bucket-A, bucket-B");

    // warm-up plus one call after the command result
    assert_eq!(h.advisor.calls(), 2);
    assert!(h.advisor.context(0).is_empty());
    assert_eq!(h.advisor.context(1).history.len(), 2);
    assert_eq!(h.advisor.context(1).target.as_deref(), Some("S3 bucket"));

    assert_eq!(h.reporter.calls(), 1);
    assert_eq!(h.reporter.context(0).history.len(), 2);
    assert_eq!(h.repl.session().state(), SessionState::Terminated);

    match outcome {
        SessionOutcome::Completed(Some(report)) => {
            assert_eq!(report.body, "Report covering 2 turns")
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let console = h.repl.console();
    assert_eq!(console.printed("Target set to: S3 bucket"), 1);
    assert_eq!(console.printed("Suggested Command: aws s3api list-buckets # 1"), 1);
    assert_eq!(console.printed("Report Generated: Report covering 2 turns"), 1);

    // outer, inner, inner, outer
    let kinds: Vec<bool> = console
        .prompts
        .iter()
        .map(|p| p.starts_with(TARGET_PROMPT_START))
        .collect();
    assert_eq!(kinds, vec![true, false, false, true]);
    assert!(console.prompts[1].starts_with(RESULT_PROMPT_START));
}

#[tokio::test]
async fn test_immediate_exit_reports_empty_session() {
    let mut h = harness(&["exit"]);

    let outcome = assert_ok!(h.repl.run().await);

    assert!(h.repl.session().history().is_empty());
    assert_eq!(h.advisor.calls(), 1);
    assert_eq!(h.reporter.calls(), 1);
    assert!(h.reporter.context(0).is_empty());
    assert!(matches!(outcome, SessionOutcome::Completed(Some(_))));
    assert_eq!(h.repl.console().printed("Exiting session..."), 1);
}

#[tokio::test]
async fn test_exit_keyword_is_case_insensitive() {
    let mut h = harness(&["Lambda functions", "EXIT", "ExIt"]);
    h.repl.run().await.unwrap();

    assert_eq!(h.repl.session().history().len(), 1);
    assert_eq!(h.reporter.calls(), 1);
}

#[tokio::test]
async fn test_inner_exit_returns_to_target_prompt() {
    let mut h = harness(&[
        "S3 bucket",
        "bucket-A",
        "exit",
        "IAM policies",
        "policy-1",
        "exit",
        "exit",
    ]);
    h.repl.run().await.unwrap();

    let texts: Vec<&str> = h
        .repl
        .session()
        .history()
        .iter()
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(texts, vec!["S3 bucket", "bucket-A", "IAM policies", "policy-1"]);
    assert_eq!(h.repl.session().target(), Some("IAM policies"));

    // The report runs once, at the very end, and sees both targets
    assert_eq!(h.reporter.calls(), 1);
    assert_eq!(h.reporter.context(0).history.len(), 4);

    // The advisor for the second target still sees the first one
    assert_eq!(h.advisor.calls(), 3);
    assert_eq!(h.advisor.context(2).history[0].text, "S3 bucket");
}

#[tokio::test]
async fn test_history_grows_in_submission_order() {
    let results: Vec<String> = (0..6).map(|i| format!("output {}", i)).collect();
    let mut lines = vec!["EC2 instance"];
    lines.extend(results.iter().map(String::as_str));
    lines.extend(["exit", "exit"]);

    let mut h = harness(&lines);
    h.repl.run().await.unwrap();

    let history = h.repl.session().history();
    assert_eq!(history.len(), 7);
    for (turn, expected) in history[1..].iter().zip(&results) {
        assert_eq!(turn.kind, TurnKind::CommandResult);
        assert_eq!(&turn.text, expected);
    }

    // Each advisor call saw one more turn than the previous one
    let seen: Vec<usize> = (1..h.advisor.calls())
        .map(|i| h.advisor.context(i).history.len())
        .collect();
    assert_eq!(seen, vec![2, 3, 4, 5, 6, 7]);
}

#[tokio::test]
async fn test_missing_field_keeps_loop_alive() {
    let console = ScriptedConsole::lines(&["S3 bucket", "bucket-A", "bucket-B", "exit", "exit"]);
    let mut h = harness_with(console, Reply::MissingResult, Reply::Complete);

    let outcome = h.repl.run().await.unwrap();

    let console = h.repl.console();
    assert_eq!(console.printed("Error processing the output."), 2);
    assert_eq!(console.printed("Suggested Command"), 0);
    // still prompted after each failure
    assert_eq!(console.prompts.len(), 5);
    assert_eq!(h.repl.session().history().len(), 3);
    assert!(matches!(outcome, SessionOutcome::Completed(Some(_))));
}

#[tokio::test]
async fn test_collaborator_errors_are_contained() {
    let console = ScriptedConsole::lines(&["S3 bucket", "bucket-A", "exit", "exit"]);
    let mut h = harness_with(console, Reply::Fail, Reply::Fail);

    let outcome = h.repl.run().await.unwrap();

    assert_eq!(outcome, SessionOutcome::Completed(None));
    let console = h.repl.console();
    assert_eq!(console.printed("Error processing the output."), 1);
    assert_eq!(console.printed("Error generating the report."), 1);
    // raw error text stays out of the console
    assert_eq!(console.printed("backend unavailable"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_call_times_out() {
    let console = ScriptedConsole::lines(&["S3 bucket", "bucket-A", "exit", "exit"]);
    let mut h = harness_with(console, Reply::Hang, Reply::Complete);

    let outcome = h.repl.run().await.unwrap();

    assert_eq!(h.advisor.calls(), 2);
    assert_eq!(h.repl.console().printed("Error processing the output."), 1);
    assert!(matches!(outcome, SessionOutcome::Completed(Some(_))));
}

#[tokio::test]
async fn test_interrupt_at_target_prompt_skips_report() {
    let console = ScriptedConsole::with_inputs(vec![ConsoleInput::Interrupt]);
    let mut h = harness_with(console, Reply::Complete, Reply::Complete);

    let outcome = h.repl.run().await.unwrap();

    assert_eq!(outcome, SessionOutcome::Interrupted);
    assert_eq!(h.reporter.calls(), 0);
    assert_eq!(h.repl.console().printed("Session ended by user."), 1);
    assert_ne!(h.repl.session().state(), SessionState::Terminated);
}

#[tokio::test]
async fn test_interrupt_at_result_prompt_skips_report() {
    let console = ScriptedConsole::with_inputs(vec![
        ConsoleInput::Line("S3 bucket".to_string()),
        ConsoleInput::Line("bucket-A".to_string()),
        ConsoleInput::Interrupt,
        ConsoleInput::Line("exit".to_string()),
    ]);
    let mut h = harness_with(console, Reply::Complete, Reply::Complete);

    let outcome = h.repl.run().await.unwrap();

    assert_eq!(outcome, SessionOutcome::Interrupted);
    assert_eq!(h.reporter.calls(), 0);
    assert_eq!(h.repl.session().history().len(), 2);
    // nothing is read after the interrupt
    assert_eq!(h.repl.console().prompts.len(), 3);
}

#[tokio::test]
async fn test_blank_lines_are_ignored() {
    let mut h = harness(&["", "S3 bucket", "   ", "bucket-A", "exit", "exit"]);
    h.repl.run().await.unwrap();

    assert_eq!(h.repl.session().history().len(), 2);
    assert_eq!(h.advisor.calls(), 2);
}

#[tokio::test]
async fn test_end_of_input_finishes_with_report() {
    let mut h = harness(&["S3 bucket", "bucket-A"]);

    let outcome = h.repl.run().await.unwrap();

    assert!(matches!(outcome, SessionOutcome::Completed(Some(_))));
    assert_eq!(h.reporter.calls(), 1);
    assert_eq!(h.repl.session().history().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_during_advisor_call() {
    let console = ScriptedConsole::lines(&["S3 bucket", "bucket-A", "bucket-B", "exit"])
        .interrupt_after(2);
    let mut h = harness_with(console, Reply::Hang, Reply::Complete);

    let outcome = h.repl.run().await.unwrap();

    assert_eq!(outcome, SessionOutcome::Interrupted);
    // the warm-up timed out before any line was read; the second call was cut short
    assert_eq!(h.advisor.calls(), 2);
    assert_eq!(h.reporter.calls(), 0);
    let console = h.repl.console();
    assert_eq!(console.printed("Session ended by user."), 1);
    assert_eq!(console.printed("Error processing the output."), 0);
    // no prompt after the interrupt
    assert_eq!(console.prompts.len(), 2);
    assert_eq!(h.repl.session().history().len(), 2);
}

#[tokio::test]
async fn test_interrupt_during_report_call() {
    let console = ScriptedConsole::lines(&["exit"]).interrupt_after(1);
    let mut h = harness_with(console, Reply::Complete, Reply::Hang);

    let outcome = h.repl.run().await.unwrap();

    assert_eq!(outcome, SessionOutcome::Interrupted);
    assert_eq!(h.reporter.calls(), 1);
    let console = h.repl.console();
    assert_eq!(console.printed("Report Generated"), 0);
    assert_eq!(console.printed("Error generating the report."), 0);
    assert_eq!(console.printed("Session ended by user."), 1);
}

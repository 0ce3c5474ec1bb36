//! Console I/O
//!
//! The session loop talks to the user only through `Console`, so tests can
//! script it. `StdConsole` reads stdin and treats Ctrl-C as an interrupt,
//! whether it arrives at a prompt or while the crew is working.

use std::io::{self, Write};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;

use crate::core::Result;

/// What came back from one prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// A line of text, without the trailing newline
    Line(String),
    /// The user pressed Ctrl-C
    Interrupt,
    /// Input stream closed
    Eof,
}

/// Line-oriented user interface
#[async_trait]
pub trait Console: Send {
    /// Show a prompt and wait for one line
    async fn read_line(&mut self, prompt: &str) -> Result<ConsoleInput>;

    /// Print one line of output
    fn println(&mut self, line: &str);

    /// Resolves once the user has asked to stop the session.
    ///
    /// Raced against every collaborator call. Never resolves by default.
    async fn interrupted(&mut self) {
        std::future::pending::<()>().await
    }
}

/// Terminal console on stdin/stdout
pub struct StdConsole {
    lines: Lines<BufReader<Stdin>>,
    interrupts: watch::Receiver<bool>,
}

impl StdConsole {
    /// Create the console and start listening for Ctrl-C.
    ///
    /// Must be called inside a Tokio runtime. The SIGINT listener lives for
    /// the whole process, so a signal that arrives between prompts is kept.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    let _ = tx.send(true);
                }
                Err(e) => tracing::warn!(error = %e, "cannot listen for Ctrl-C"),
            }
        });

        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            interrupts: rx,
        }
    }
}

/// Wait until Ctrl-C has been seen. Pends forever if the listener is gone.
async fn wait_for_interrupt(interrupts: &mut watch::Receiver<bool>) {
    if interrupts.wait_for(|seen| *seen).await.is_err() {
        std::future::pending::<()>().await
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn read_line(&mut self, prompt: &str) -> Result<ConsoleInput> {
        print!("{}", prompt);
        io::stdout().flush()?;

        tokio::select! {
            line = self.lines.next_line() => match line? {
                Some(line) => Ok(ConsoleInput::Line(line)),
                None => Ok(ConsoleInput::Eof),
            },
            _ = wait_for_interrupt(&mut self.interrupts) => Ok(ConsoleInput::Interrupt),
        }
    }

    fn println(&mut self, line: &str) {
        println!("{}", line);
    }

    async fn interrupted(&mut self) {
        wait_for_interrupt(&mut self.interrupts).await
    }
}

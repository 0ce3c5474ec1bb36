//! pentest-crew - AWS Penetration Testing Copilot
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;

use clap::Parser;
use pentest_crew::core::logging::init_logging;
use pentest_crew::{Config, Repl, SessionOutcome};

/// pentest-crew - AWS Penetration Testing Copilot
#[derive(Parser, Debug)]
#[command(name = "pentest-crew")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model for both the advisor and the report writer
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Upper bound in seconds for each advisor or report call
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    /// Disable the web search tool
    #[arg(long)]
    no_search: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration. Logging is not up yet, so a bad config file is
    // reported on stderr.
    let mut config = Config::load()?;

    // Apply CLI overrides
    if let Some(ref model) = args.model {
        config.set_model(model.clone());
    }

    if let Some(ref path) = args.log_file {
        config.logging.file = path.clone();
    }

    if let Some(secs) = args.timeout {
        config.agent.call_timeout_secs = secs;
    }

    if args.debug {
        config.agent.debug = true;
    }

    if args.no_search {
        config.search.enabled = false;
    }

    let guard = init_logging(&config.logging, config.agent.debug)?;

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "startup aborted");
        return Err(e.into());
    }

    let mut repl = Repl::with_config(&config)?;
    match repl.run().await? {
        SessionOutcome::Completed(report) => {
            tracing::info!(
                turns = repl.session().history().len(),
                report = report.is_some(),
                "session completed"
            );
        }
        SessionOutcome::Interrupted => {
            // A stdin read may still be parked on a blocking thread; exit
            // without waiting for the runtime to drain it.
            drop(guard);
            std::process::exit(0);
        }
    }

    Ok(())
}

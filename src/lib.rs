// src/lib.rs

//! Supervise an external command: stream its stdout and stderr line by line
//! to a [`StreamHandler`], enforce an optional timeout, and kill the whole
//! process tree on timeout or when a handler asks for it.
//!
//! ```no_run
//! use cmdstream::{CommandSpec, PrintHandler, RunConfig, StreamRunner, TerminationReason};
//!
//! # async fn demo() -> cmdstream::errors::Result<()> {
//! let mut runner = StreamRunner::new(PrintHandler);
//! let cmd = CommandSpec::from_argv(["ping", "localhost"])?;
//! let cfg = RunConfig::default().with_timeout_secs(3.0)?;
//! assert_eq!(runner.run(&cmd, &cfg).await?, TerminationReason::TimedOut);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod exit_codes;
pub mod logging;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::config::validate::{compile_pattern, validate_poll_interval};
use crate::config::{load_and_validate, parse_duration};
use crate::errors::{CmdStreamError, Result};

pub use crate::exec::{
    CallbackHandler, CommandSpec, LineEvent, PatternKillHandler, PrintHandler, RunConfig,
    RunOutcome, RunState, StreamHandler, StreamRunner, StreamSource, TerminationReason,
};

/// Everything needed to perform one CLI run.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: CommandSpec,
    pub config: RunConfig,
    pub handler: PatternKillHandler,
}

/// Merge CLI flags over the optional config file.
///
/// Flags win over file values; anything unset falls back to
/// [`RunConfig::default`].
pub fn resolve(args: &CliArgs) -> Result<Invocation> {
    let file = match args.config.as_ref() {
        Some(path) => {
            debug!(path = %path.display(), "loading config file");
            load_and_validate(path)?
        }
        None => ConfigFile::default(),
    };

    let command = CommandSpec::from_argv(args.command.iter().cloned())?;

    let mut config = file.run_config();
    if let Some(secs) = args.timeout {
        config = config.with_timeout_secs(secs)?;
    }
    if let Some(ref poll) = args.poll_interval {
        let poll = parse_duration(poll)
            .map_err(|e| CmdStreamError::Config(format!("--poll-interval {poll:?}: {e}")))?;
        validate_poll_interval(poll)?;
        config = config.with_poll_interval(poll);
    }

    let kill_on_stdout = match args.kill_on_stdout.as_deref() {
        Some(p) => compile_pattern("--kill-on-stdout", Some(p))?,
        None => file.kill_on_stdout,
    };
    let kill_on_stderr = match args.kill_on_stderr.as_deref() {
        Some(p) => compile_pattern("--kill-on-stderr", Some(p))?,
        None => file.kill_on_stderr,
    };

    Ok(Invocation {
        command,
        config,
        handler: PatternKillHandler {
            kill_on_stdout,
            kill_on_stderr,
            tag: args.tag,
        },
    })
}

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<RunOutcome> {
    let Invocation {
        command,
        config,
        handler,
    } = resolve(&args)?;

    debug!(cmd = %command, ?config, "resolved invocation");

    let mut runner = StreamRunner::new(handler);
    runner.run_with_outcome(&command, &config).await
}

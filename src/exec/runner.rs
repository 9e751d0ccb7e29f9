// src/exec/runner.rs

//! The supervising loop.
//!
//! One async task per run multiplexes both output pipes and a poll tick in a
//! single `tokio::select!`. The tick guarantees the deadline is re-checked at
//! least once per `poll_interval` even when the process is silent.

use std::fmt;
use std::io;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use tokio::io::AsyncRead;
use tokio::time::{MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::errors::{CmdStreamError, Result};
use crate::exec::handler::{LineEvent, StreamHandler, StreamSource};
use crate::exec::process::{CommandSpec, LineReader, ProcessHandle};

/// Default period of the poll tick.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(40);

/// Why a supervised run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// Both output streams closed (or the process exited and went quiet).
    Completed,
    /// The configured timeout elapsed; the process tree was killed.
    TimedOut,
    /// A line handler asked for the process tree to be killed.
    KilledByHandler,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TerminationReason::Completed => "completed",
            TerminationReason::TimedOut => "timed out",
            TerminationReason::KilledByHandler => "killed by handler",
        };
        f.write_str(s)
    }
}

/// Per-run settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Wall-clock limit for the run. `None` waits forever.
    pub timeout: Option<Duration>,
    /// How often the loop wakes up when no output arrives.
    pub poll_interval: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl RunConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Set the timeout from (possibly fractional) seconds.
    ///
    /// Zero disables the timeout. Negative, NaN or infinite values are
    /// rejected.
    pub fn with_timeout_secs(self, secs: f64) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(secs).map_err(|e| {
            CmdStreamError::Config(format!("invalid timeout {secs}: {e}"))
        })?;
        Ok(self.with_timeout(timeout))
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Full result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub reason: TerminationReason,
    pub status: ExitStatus,
    pub elapsed: Duration,
}

/// Lifecycle of the most recent run on a [`StreamRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Finished(TerminationReason),
}

/// Supervises one command at a time, feeding its output to a handler.
///
/// The runner can be reused: each call to [`run`](Self::run) spawns and
/// supervises a fresh process.
#[derive(Debug)]
pub struct StreamRunner<H> {
    handler: H,
    state: RunState,
}

impl<H: StreamHandler> StreamRunner<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Run `command` to termination and report why it ended.
    pub async fn run(
        &mut self,
        command: &CommandSpec,
        config: &RunConfig,
    ) -> Result<TerminationReason> {
        Ok(self.run_with_outcome(command, config).await?.reason)
    }

    /// Like [`run`](Self::run), also returning exit status and elapsed time.
    pub async fn run_with_outcome(
        &mut self,
        command: &CommandSpec,
        config: &RunConfig,
    ) -> Result<RunOutcome> {
        if config.poll_interval.is_zero() {
            return Err(CmdStreamError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        self.state = RunState::Idle;
        let start = Instant::now();
        let mut process = ProcessHandle::spawn(command)?;
        self.state = RunState::Running;

        let supervised = supervise(&mut self.handler, &mut process, config, start).await;

        if supervised.is_err() {
            process.kill_tree();
        }
        // Reap on every path, including errors.
        let status = process.wait().await;

        let (reason, status) = match (supervised, status) {
            (Ok(reason), Ok(status)) => (reason, status),
            (Ok(_), Err(e)) => {
                self.state = RunState::Idle;
                return Err(e);
            }
            (Err(e), wait) => {
                self.state = RunState::Idle;
                if let Err(wait_err) = wait {
                    warn!(error = %wait_err, "failed to reap process after supervision error");
                }
                return Err(e);
            }
        };

        let elapsed = start.elapsed();
        self.state = RunState::Finished(reason);
        info!(
            cmd = %command,
            %reason,
            %status,
            ?elapsed,
            "supervised run finished"
        );

        Ok(RunOutcome {
            reason,
            status,
            elapsed,
        })
    }
}

impl Default for StreamRunner<crate::exec::PrintHandler> {
    fn default() -> Self {
        Self::new(crate::exec::PrintHandler)
    }
}

enum Step {
    Line(StreamSource, io::Result<Option<String>>),
    Tick,
}

async fn next_line<R: AsyncRead + Unpin>(
    reader: Option<&mut LineReader<R>>,
) -> io::Result<Option<String>> {
    match reader {
        Some(r) => r.next_line().await,
        None => std::future::pending().await,
    }
}

/// Drive one process until it ends, times out, or a handler kills it.
///
/// Does not reap the process; the caller always does that afterwards.
async fn supervise<H: StreamHandler>(
    handler: &mut H,
    process: &mut ProcessHandle,
    config: &RunConfig,
    start: Instant,
) -> Result<TerminationReason> {
    let pid = process.pid();
    let deadline = config.timeout.map(|t| start + t);

    let mut ticker = interval_at(
        tokio::time::Instant::from_std(start) + config.poll_interval,
        config.poll_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Ticks since the last line was read. Two in a row means a full poll
    // interval passed without any output.
    let mut quiet_ticks: u32 = 0;

    loop {
        if let Some(deadline) = deadline {
            if Instant::now() > deadline {
                info!(pid, timeout = ?config.timeout, "timeout elapsed; killing process tree");
                handler.on_timeout();
                process.kill_tree();
                return Ok(TerminationReason::TimedOut);
            }
        }

        if process.streams_closed() {
            debug!(pid, "both output streams closed");
            return Ok(TerminationReason::Completed);
        }

        let step = tokio::select! {
            res = next_line(process.stdout.as_mut()), if process.stdout.is_some() => {
                Step::Line(StreamSource::Stdout, res)
            }
            res = next_line(process.stderr.as_mut()), if process.stderr.is_some() => {
                Step::Line(StreamSource::Stderr, res)
            }
            _ = ticker.tick() => Step::Tick,
        };

        match step {
            Step::Line(source, Ok(Some(text))) => {
                quiet_ticks = 0;
                debug!(pid, %source, line = %text, "line received");
                let event = LineEvent { source, text };
                if handler.on_line(&event) {
                    info!(pid, %source, "handler requested kill; killing process tree");
                    process.kill_tree();
                    return Ok(TerminationReason::KilledByHandler);
                }
            }
            Step::Line(source, Ok(None)) => {
                debug!(pid, %source, "stream hung up");
                match source {
                    StreamSource::Stdout => process.stdout = None,
                    StreamSource::Stderr => process.stderr = None,
                }
            }
            Step::Line(source, Err(e)) => {
                warn!(pid, %source, error = %e, "read error on live stream");
                return Err(CmdStreamError::Read { stream: source, source: e });
            }
            Step::Tick => {
                quiet_ticks = quiet_ticks.saturating_add(1);
                if quiet_ticks >= 2 && process.has_exited()? {
                    // A descendant still holds a pipe open, but the process
                    // we supervise is gone and nothing is being written.
                    debug!(pid, "process exited with pipes still open; finishing");
                    process.close_streams();
                    return Ok(TerminationReason::Completed);
                }
            }
        }
    }
}

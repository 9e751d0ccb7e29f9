//! Exit codes of the `cmdstream` binary.
//!
//! When the command completes, its own exit code is passed through. The
//! remaining codes follow the conventions of coreutils `timeout`:
//! - 124: the timeout elapsed
//! - 125: cmdstream itself failed (bad arguments, config, launch failure)
//! - 137: a kill pattern matched (128 + SIGKILL)

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use crate::exec::{RunOutcome, TerminationReason};

/// The supervised command was killed because the timeout elapsed.
pub const TIMED_OUT: i32 = 124;

/// cmdstream could not run the command at all.
pub const CMDSTREAM_ERROR: i32 = 125;

/// A line handler requested the kill.
pub const KILLED_BY_HANDLER: i32 = 137;

/// Exit code to report for a finished run.
pub fn for_outcome(outcome: &RunOutcome) -> i32 {
    match outcome.reason {
        TerminationReason::Completed => for_status(outcome.status),
        TerminationReason::TimedOut => TIMED_OUT,
        TerminationReason::KilledByHandler => KILLED_BY_HANDLER,
    }
}

/// The command's own code, or `128 + signal` if it was killed by a signal.
pub fn for_status(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(sig)) => 128 + sig,
        (None, None) => CMDSTREAM_ERROR,
    }
}

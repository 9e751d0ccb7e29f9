// src/config/validate.rs

use std::time::Duration;

use regex::Regex;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CmdStreamError, Result};

/// Upper bound on the poll tick; anything longer makes timeouts sloppy.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CmdStreamError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let timeout = raw
            .run
            .timeout
            .as_deref()
            .map(|s| parse_field("[run].timeout", s))
            .transpose()?
            .filter(|d| !d.is_zero());

        let poll_interval = raw
            .run
            .poll_interval
            .as_deref()
            .map(|s| parse_field("[run].poll_interval", s))
            .transpose()?;
        if let Some(poll) = poll_interval {
            validate_poll_interval(poll)?;
        }

        Ok(ConfigFile {
            timeout,
            poll_interval,
            kill_on_stdout: compile_pattern("[kill_on].stdout", raw.kill_on.stdout.as_deref())?,
            kill_on_stderr: compile_pattern("[kill_on].stderr", raw.kill_on.stderr.as_deref())?,
        })
    }
}

fn parse_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| CmdStreamError::Config(format!("{field} = {value:?}: {e}")))
}

/// Poll interval must be in `1ms ..= 1s`.
pub fn validate_poll_interval(poll: Duration) -> Result<()> {
    if poll < Duration::from_millis(1) || poll > MAX_POLL_INTERVAL {
        return Err(CmdStreamError::Config(format!(
            "poll_interval must be between 1ms and {}ms (got {}ms)",
            MAX_POLL_INTERVAL.as_millis(),
            poll.as_millis()
        )));
    }
    Ok(())
}

/// Compile an optional kill pattern, naming the offending field on error.
pub fn compile_pattern(field: &str, pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|e| {
                CmdStreamError::Config(format!("{field}: invalid regex {p:?}: {e}"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{KillOnSection, RunSection};

    fn raw(timeout: Option<&str>, poll: Option<&str>, stdout: Option<&str>) -> RawConfigFile {
        RawConfigFile {
            run: RunSection {
                timeout: timeout.map(str::to_string),
                poll_interval: poll.map(str::to_string),
            },
            kill_on: KillOnSection {
                stdout: stdout.map(str::to_string),
                stderr: None,
            },
        }
    }

    #[test]
    fn empty_config_is_valid() {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        assert_eq!(cfg.timeout, None);
        assert_eq!(cfg.poll_interval, None);
        assert!(cfg.kill_on_stdout.is_none());
    }

    #[test]
    fn zero_timeout_means_none() {
        let cfg = ConfigFile::try_from(raw(Some("0s"), None, None)).unwrap();
        assert_eq!(cfg.timeout, None);
    }

    #[test]
    fn poll_interval_bounds_are_enforced() {
        assert!(ConfigFile::try_from(raw(None, Some("0ms"), None)).is_err());
        assert!(ConfigFile::try_from(raw(None, Some("2s"), None)).is_err());
        assert!(ConfigFile::try_from(raw(None, Some("1s"), None)).is_ok());
    }

    #[test]
    fn bad_regex_names_field() {
        match ConfigFile::try_from(raw(None, None, Some("("))) {
            Err(CmdStreamError::Config(msg)) => assert!(msg.contains("[kill_on].stdout")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }
}

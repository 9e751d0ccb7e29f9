// src/logging.rs

//! Diagnostics go to stderr through a `tracing-subscriber` fmt layer; stdout
//! is reserved for the supervised command's lines.
//!
//! The level is picked by [`resolve_level`]: `--log-level`, else
//! `CMDSTREAM_LOG`, else `warn`.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV: &str = "CMDSTREAM_LOG";

/// Level used when neither the flag nor the environment names one.
pub const DEFAULT_LEVEL: Level = Level::WARN;

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Pick the effective level from the flag and the raw env value.
///
/// An unrecognised env value is ignored rather than rejected, so a stray
/// `CMDSTREAM_LOG` never stops the command from running.
pub fn resolve_level(flag: Option<LogLevel>, env: Option<&str>) -> Level {
    if let Some(lvl) = flag {
        return lvl.into();
    }
    env.and_then(|raw| raw.trim().parse::<Level>().ok())
        .unwrap_or(DEFAULT_LEVEL)
}

/// Install the process-wide subscriber. Fails if one is already set.
pub fn init_logging(flag: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let level = resolve_level(flag, env.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("installing the tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_environment() {
        assert_eq!(resolve_level(Some(LogLevel::Trace), Some("error")), Level::TRACE);
    }

    #[test]
    fn environment_is_case_and_space_insensitive() {
        assert_eq!(resolve_level(None, Some(" DEBUG ")), Level::DEBUG);
        assert_eq!(resolve_level(None, Some("info")), Level::INFO);
    }

    #[test]
    fn unknown_or_missing_environment_falls_back_to_warn() {
        assert_eq!(resolve_level(None, Some("loud")), DEFAULT_LEVEL);
        assert_eq!(resolve_level(None, Some("")), DEFAULT_LEVEL);
        assert_eq!(resolve_level(None, None), DEFAULT_LEVEL);
    }

    #[test]
    fn every_cli_level_maps_to_its_tracing_level() {
        let pairs = [
            (LogLevel::Error, Level::ERROR),
            (LogLevel::Warn, Level::WARN),
            (LogLevel::Info, Level::INFO),
            (LogLevel::Debug, Level::DEBUG),
            (LogLevel::Trace, Level::TRACE),
        ];
        for (cli, expected) in pairs {
            assert_eq!(Level::from(cli), expected);
        }
    }
}

// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cmdstream`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cmdstream",
    version,
    about = "Run a command, stream its stdout/stderr line by line, and kill its whole process tree on timeout or on a matching line.",
    long_about = None
)]
pub struct CliArgs {
    /// Kill the command after this many seconds (fractions allowed, 0 = no limit).
    ///
    /// Overrides `[run].timeout` from the config file.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// How often to re-check the timeout while the command is silent (e.g. "40ms").
    #[arg(long, value_name = "DURATION")]
    pub poll_interval: Option<String>,

    /// Optional TOML config file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Kill the command when a stdout line matches this regex.
    #[arg(long, value_name = "REGEX")]
    pub kill_on_stdout: Option<String>,

    /// Kill the command when a stderr line matches this regex.
    #[arg(long, value_name = "REGEX")]
    pub kill_on_stderr: Option<String>,

    /// Prefix every printed line with `[stdout]` or `[stderr]`.
    #[arg(long)]
    pub tag: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CMDSTREAM_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// The command to supervise, followed by its arguments.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_after_double_dash_keeps_its_flags() {
        let args = CliArgs::try_parse_from([
            "cmdstream", "--timeout", "1.5", "--tag", "--", "ls", "-la", "/tmp",
        ])
        .unwrap();
        assert_eq!(args.timeout, Some(1.5));
        assert!(args.tag);
        assert_eq!(args.command, ["ls", "-la", "/tmp"]);
    }

    #[test]
    fn command_is_required() {
        assert!(CliArgs::try_parse_from(["cmdstream", "--timeout", "1"]).is_err());
    }
}

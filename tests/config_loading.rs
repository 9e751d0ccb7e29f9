// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tempfile::NamedTempFile;

use cmdstream::cli::CliArgs;
use cmdstream::config::load_and_validate;
use cmdstream::errors::CmdStreamError;
use cmdstream::{resolve, StreamSource};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_config_is_parsed() {
    let file = write_config(
        r#"
[run]
timeout = "2.5s"
poll_interval = "25ms"

[kill_on]
stdout = "^FATAL"
stderr = "panic"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.timeout, Some(Duration::from_millis(2500)));
    assert_eq!(cfg.poll_interval, Some(Duration::from_millis(25)));
    assert!(cfg.kill_on_stdout.as_ref().unwrap().is_match("FATAL: x"));
    assert!(cfg.kill_on_stderr.as_ref().unwrap().is_match("thread panicked"));

    let run = cfg.run_config();
    assert_eq!(run.timeout, Some(Duration::from_millis(2500)));
    assert_eq!(run.poll_interval, Duration::from_millis(25));
}

#[test]
fn unknown_keys_are_rejected() {
    let file = write_config(
        r#"
[run]
timeuot = "1s"
"#,
    );

    match load_and_validate(file.path()) {
        Err(CmdStreamError::Toml(_)) => {}
        other => panic!("expected Toml error, got {other:?}"),
    }
}

#[test]
fn bad_duration_returns_config_error() {
    let file = write_config(
        r#"
[run]
timeout = "soon"
"#,
    );

    match load_and_validate(file.path()) {
        Err(CmdStreamError::Config(msg)) => {
            assert!(msg.contains("[run].timeout"));
            assert!(msg.contains("soon"));
        }
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_io_error() {
    let path = PathBuf::from("/nonexistent/cmdstream.toml");
    assert!(matches!(load_and_validate(path), Err(CmdStreamError::Io(_))));
}

#[test]
fn cli_flags_override_config_file() {
    let file = write_config(
        r#"
[run]
timeout = "30s"

[kill_on]
stdout = "from-file"
stderr = "err-from-file"
"#,
    );
    let path = file.path().to_string_lossy().into_owned();

    let args = CliArgs::try_parse_from([
        "cmdstream",
        "--config",
        &path,
        "--timeout",
        "0.5",
        "--kill-on-stdout",
        "from-flag",
        "--",
        "echo",
        "hi",
    ])
    .unwrap();

    let inv = resolve(&args).unwrap();
    assert_eq!(inv.command.program(), "echo");
    assert_eq!(inv.command.arguments(), ["hi"]);
    assert_eq!(inv.config.timeout, Some(Duration::from_millis(500)));
    assert!(inv.handler.matches(StreamSource::Stdout, "from-flag"));
    assert!(!inv.handler.matches(StreamSource::Stdout, "from-file"));
    assert!(inv.handler.matches(StreamSource::Stderr, "err-from-file"));
}

#[test]
fn zero_timeout_flag_clears_file_timeout() {
    let file = write_config(
        r#"
[run]
timeout = "30s"
"#,
    );
    let path = file.path().to_string_lossy().into_owned();

    let args =
        CliArgs::try_parse_from(["cmdstream", "--config", &path, "--timeout", "0", "--", "true"])
            .unwrap();

    assert_eq!(resolve(&args).unwrap().config.timeout, None);
}

#[test]
fn invalid_flag_values_are_config_errors() {
    let args = CliArgs::try_parse_from(["cmdstream", "--kill-on-stderr", "(", "--", "true"]).unwrap();
    assert!(matches!(resolve(&args), Err(CmdStreamError::Config(_))));

    let args = CliArgs::try_parse_from(["cmdstream", "--timeout=-3", "--", "true"]).unwrap();
    assert!(matches!(resolve(&args), Err(CmdStreamError::Config(_))));

    let args =
        CliArgs::try_parse_from(["cmdstream", "--poll-interval", "5s", "--", "true"]).unwrap();
    assert!(matches!(resolve(&args), Err(CmdStreamError::Config(_))));
}

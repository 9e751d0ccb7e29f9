// tests/runner_handler_kill.rs

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cmdstream::{CallbackHandler, CommandSpec, RunConfig, StreamRunner, TerminationReason};
use cmdstream_test_utils::{init_tracing, wait_until_dead, with_timeout, RecordingHandler};

type TestResult = Result<(), Box<dyn Error>>;

fn sh(script: &str) -> CommandSpec {
    CommandSpec::new("sh").arg("-c").arg(script)
}

#[tokio::test]
async fn kill_on_kth_line_stops_further_callbacks() -> TestResult {
    init_tracing();

    let handler = RecordingHandler::new().kill_on("line3");
    let mut runner = StreamRunner::new(handler.clone());

    let script = "for i in 1 2 3 4 5; do echo line$i; done; sleep 5; echo late";
    let outcome = with_timeout(runner.run_with_outcome(&sh(script), &RunConfig::default())).await?;

    assert_eq!(outcome.reason, TerminationReason::KilledByHandler);
    assert_eq!(handler.recorded().stdout(), ["line1", "line2", "line3"]);
    assert!(outcome.elapsed < Duration::from_secs(3));
    Ok(())
}

#[tokio::test]
async fn stderr_handler_can_kill() -> TestResult {
    init_tracing();

    let handler = RecordingHandler::new().kill_on("boom");
    let mut runner = StreamRunner::new(handler.clone());

    let reason = with_timeout(runner.run(
        &sh("echo working; echo boom >&2; sleep 5"),
        &RunConfig::default(),
    ))
    .await?;

    assert_eq!(reason, TerminationReason::KilledByHandler);
    let rec = handler.recorded();
    assert_eq!(rec.stderr(), ["boom"]);
    assert_eq!(rec.timeouts, 0);
    Ok(())
}

#[tokio::test]
async fn handler_kill_takes_grandchildren_down() -> TestResult {
    init_tracing();

    let mut runner = StreamRunner::new(RecordingHandler::new().kill_on("ready"));

    // Two levels: sh -> sh -> sleep. The inner shell reports the sleep pid.
    let script = r#"sh -c 'sleep 30 & echo $!; wait' & sleep 0.2; echo ready; wait"#;
    let reason = with_timeout(runner.run(&sh(script), &RunConfig::default())).await?;
    assert_eq!(reason, TerminationReason::KilledByHandler);

    let rec = runner.handler().recorded();
    let grandchild: u32 = rec.stdout()[0].parse()?;
    assert!(
        wait_until_dead(grandchild, Duration::from_secs(2)).await,
        "grandchild {grandchild} survived the kill"
    );
    Ok(())
}

#[tokio::test]
async fn closure_handler_can_request_kill() -> TestResult {
    init_tracing();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_out = Arc::clone(&seen);
    let timed_out = Arc::new(Mutex::new(false));
    let timed_out_cb = Arc::clone(&timed_out);

    let handler = CallbackHandler::new()
        .with_stdout(move |line| {
            seen_out.lock().unwrap().push(line.to_string());
            line.starts_with("stop")
        })
        .with_stderr(|_| false)
        .with_timeout(move || *timed_out_cb.lock().unwrap() = true);

    let mut runner = StreamRunner::new(handler);
    let cfg = RunConfig::default().with_timeout_secs(5.0)?;
    let reason = with_timeout(runner.run(
        &sh("echo go; echo stop now; echo never; sleep 5"),
        &cfg,
    ))
    .await?;

    assert_eq!(reason, TerminationReason::KilledByHandler);
    assert_eq!(*seen.lock().unwrap(), ["go", "stop now"]);
    assert!(!*timed_out.lock().unwrap());
    Ok(())
}

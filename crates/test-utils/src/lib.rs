pub mod recording;

use std::sync::Once;
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, UpdateKind};
use tracing_subscriber::{fmt, EnvFilter};

pub use recording::{Recorded, RecordingHandler};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

fn is_live(proc_: &Process) -> bool {
    !matches!(proc_.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
}

/// Whether a pid still refers to a live (non-zombie) process.
pub fn pid_alive(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_some_and(is_live)
}

/// Pids of live processes whose command line contains `needle`.
pub fn live_pids_matching(needle: &str) -> Vec<u32> {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
    );

    system
        .processes()
        .iter()
        .filter(|(_, proc_)| proc_.thread_kind().is_none() && is_live(proc_))
        .filter(|(_, proc_)| {
            let cmdline = proc_
                .cmd()
                .iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");
            cmdline.contains(needle)
        })
        .map(|(pid, _)| pid.as_u32())
        .collect()
}

/// Poll `pid_alive` until it turns false or `within` elapses.
pub async fn wait_until_dead(pid: u32, within: std::time::Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if !pid_alive(pid) {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    !pid_alive(pid)
}

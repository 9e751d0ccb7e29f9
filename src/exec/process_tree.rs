// src/exec/process_tree.rs

//! Process-tree enumeration and termination.
//!
//! A supervised command may spawn its own children (a shell running a
//! pipeline, a build tool forking compilers, ...). Killing only the direct
//! child would orphan those, so every kill walks the OS process table at kill
//! time and signals the whole tree.

use std::collections::{HashMap, HashSet, VecDeque};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::{debug, warn};

/// Return every transitive descendant of `root`, breadth-first.
///
/// `entries` is a snapshot of `(pid, parent_pid)` pairs. `root` itself is not
/// part of the result, and malformed snapshots (a pid listed as its own
/// ancestor) never cause a pid to be reported twice.
pub fn descendants_from<I>(root: u32, entries: I) -> Vec<u32>
where
    I: IntoIterator<Item = (u32, Option<u32>)>,
{
    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for (pid, parent) in entries {
        if let Some(parent) = parent {
            children.entry(parent).or_default().push(pid);
        }
    }

    let mut seen: HashSet<u32> = HashSet::from([root]);
    let mut queue: VecDeque<u32> = VecDeque::from([root]);
    let mut out = Vec::new();

    while let Some(pid) = queue.pop_front() {
        let Some(kids) = children.get(&pid) else {
            continue;
        };
        for &kid in kids {
            if seen.insert(kid) {
                out.push(kid);
                queue.push_back(kid);
            }
        }
    }

    out
}

/// Snapshot the OS process table and return all descendants of `root`.
pub fn descendants(root: u32) -> Vec<u32> {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing(),
    );

    let entries = system
        .processes()
        .iter()
        .filter(|(_, proc_)| proc_.thread_kind().is_none())
        .map(|(pid, proc_)| (pid.as_u32(), proc_.parent().map(|p| p.as_u32())));

    descendants_from(root, entries)
}

/// Send `signal` to a single pid.
///
/// Returns `Ok(true)` if the signal was delivered and `Ok(false)` if the
/// process no longer exists.
pub fn signal_pid(pid: u32, signal: Signal) -> nix::Result<bool> {
    let raw = i32::try_from(pid).map_err(|_| Errno::EINVAL)?;
    match signal::kill(Pid::from_raw(raw), signal) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Upper bound on freeze passes; each pass only finds children forked
/// before the previous pass stopped their parent.
const MAX_FREEZE_PASSES: usize = 16;

/// Stop `root` and every descendant with `SIGSTOP`, re-walking the table
/// until a pass turns up no new pids. Returns the frozen tree, root last.
fn freeze_tree(root: u32) -> Vec<u32> {
    let mut frozen: Vec<u32> = Vec::new();
    let mut seen: HashSet<u32> = HashSet::new();

    let mut stop = |pid: u32, frozen: &mut Vec<u32>| {
        if !seen.insert(pid) {
            return false;
        }
        if let Err(e) = signal_pid(pid, Signal::SIGSTOP) {
            warn!(pid, error = %e, "failed to stop process");
        }
        frozen.push(pid);
        true
    };

    stop(root, &mut frozen);
    for pass in 0..MAX_FREEZE_PASSES {
        let mut grew = false;
        for pid in descendants(root) {
            grew |= stop(pid, &mut frozen);
        }
        if !grew {
            break;
        }
        debug!(pid = root, pass, "process tree grew while freezing");
    }

    // Root was pushed first; kill it last.
    frozen.rotate_left(1);
    frozen
}

/// Kill `root` and all of its descendants.
///
/// The whole tree is frozen with `SIGSTOP` first, so no member can fork a
/// child the walk has not seen, then every frozen pid gets `SIGKILL`.
/// Returns the number of processes that received `SIGKILL`.
pub fn kill_tree(root: u32) -> usize {
    let tree = freeze_tree(root);
    debug!(pid = root, tree = ?tree, "killing frozen process tree");

    let mut delivered = 0;
    for pid in tree {
        match signal_pid(pid, Signal::SIGKILL) {
            Ok(true) => delivered += 1,
            Ok(false) => debug!(pid, "process already gone"),
            Err(e) => warn!(pid, error = %e, "failed to kill process"),
        }
    }

    delivered
}

// src/exec/process.rs

//! Spawning the supervised process and reading its output line by line.

use std::fmt;
use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info};

use crate::errors::{CmdStreamError, Result};
use crate::exec::process_tree;

/// Program plus arguments, exactly as they should be passed to `exec`.
///
/// No shell is involved; wrap the command in `sh -c` yourself if you need
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Build from an argv-style list. The first element is the program.
    pub fn from_argv<I, S>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut it = argv.into_iter().map(Into::into);
        let program = it.next().ok_or(CmdStreamError::EmptyCommand)?;
        if program.is_empty() {
            return Err(CmdStreamError::EmptyCommand);
        }
        Ok(Self {
            program,
            args: it.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Newline-delimited reader over one output pipe.
///
/// `next_line` is cancel safe, so it can sit in a `tokio::select!` branch
/// that loses to another branch without dropping partial data.
pub struct LineReader<R> {
    inner: Split<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader).split(b'\n'),
        }
    }

    /// Next line with `\n` (and a preceding `\r`) stripped, or `None` at EOF.
    ///
    /// Invalid UTF-8 is replaced rather than treated as an error.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let Some(mut bytes) = self.inner.next_segment().await? else {
            return Ok(None);
        };
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        let line = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(Some(line))
    }
}

/// A running supervised process and the read ends of its output pipes.
///
/// Consumed by [`ProcessHandle::wait`], which reaps the process; a handle
/// dropped without waiting kills the direct child.
pub struct ProcessHandle {
    pid: u32,
    child: Child,
    pub(super) stdout: Option<LineReader<ChildStdout>>,
    pub(super) stderr: Option<LineReader<ChildStderr>>,
}

impl ProcessHandle {
    /// Launch `spec` with stdout and stderr on separate pipes.
    pub fn spawn(spec: &CommandSpec) -> Result<Self> {
        let mut cmd = Command::new(spec.program());
        cmd.args(spec.arguments())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| CmdStreamError::Spawn {
            program: spec.program().to_string(),
            source,
        })?;

        // `id()` is only `None` after the child has been reaped.
        let Some(pid) = child.id() else {
            return Err(CmdStreamError::Spawn {
                program: spec.program().to_string(),
                source: io::Error::other("process exited before its pid could be read"),
            });
        };

        info!(pid, cmd = %spec, "spawned supervised process");

        let stdout = child.stdout.take().map(LineReader::new);
        let stderr = child.stderr.take().map(LineReader::new);

        Ok(Self {
            pid,
            child,
            stdout,
            stderr,
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Whether both output streams have hung up.
    pub fn streams_closed(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }

    /// Non-blocking exit check.
    pub fn has_exited(&mut self) -> Result<bool> {
        let status = self.child.try_wait().map_err(CmdStreamError::Wait)?;
        Ok(status.is_some())
    }

    /// Kill the process and every descendant it has at this moment.
    pub fn kill_tree(&mut self) {
        let delivered = process_tree::kill_tree(self.pid);
        debug!(pid = self.pid, delivered, "process tree kill issued");
    }

    /// Drop both pipe read ends.
    pub fn close_streams(&mut self) {
        self.stdout = None;
        self.stderr = None;
    }

    /// Close any remaining pipes and reap the process.
    pub async fn wait(mut self) -> Result<ExitStatus> {
        self.close_streams();
        let status = self.child.wait().await.map_err(CmdStreamError::Wait)?;
        info!(pid = self.pid, %status, "supervised process reaped");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_argv_splits_program_and_args() {
        let spec = CommandSpec::from_argv(["sh", "-c", "echo hi"]).unwrap();
        assert_eq!(spec.program(), "sh");
        assert_eq!(spec.arguments(), ["-c", "echo hi"]);
        assert_eq!(spec.to_string(), "sh -c echo hi");
    }

    #[test]
    fn from_argv_rejects_empty() {
        let empty: Vec<String> = Vec::new();
        assert!(matches!(
            CommandSpec::from_argv(empty),
            Err(CmdStreamError::EmptyCommand)
        ));
        assert!(matches!(
            CommandSpec::from_argv([""]),
            Err(CmdStreamError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn line_reader_strips_line_endings() {
        let data: &[u8] = b"one\ntwo\r\n\nlast";
        let mut reader = LineReader::new(data);
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("one"));
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("two"));
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some(""));
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("last"));
        assert_eq!(reader.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn line_reader_replaces_invalid_utf8() {
        let data: &[u8] = b"ok \xff\n";
        let mut reader = LineReader::new(data);
        assert_eq!(
            reader.next_line().await.unwrap().as_deref(),
            Some("ok \u{fffd}")
        );
    }
}

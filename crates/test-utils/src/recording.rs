use std::sync::{Arc, Mutex};

use cmdstream::{LineEvent, StreamHandler, StreamSource};

/// Everything a [`RecordingHandler`] saw during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recorded {
    pub lines: Vec<LineEvent>,
    pub timeouts: usize,
}

impl Recorded {
    pub fn stdout(&self) -> Vec<&str> {
        self.of(StreamSource::Stdout)
    }

    pub fn stderr(&self) -> Vec<&str> {
        self.of(StreamSource::Stderr)
    }

    fn of(&self, source: StreamSource) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|e| e.source == source)
            .map(|e| e.text.as_str())
            .collect()
    }
}

/// A handler that:
/// - records every line and timeout into shared state
/// - optionally requests a kill on a chosen line.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    recorded: Arc<Mutex<Recorded>>,
    kill_on: Option<String>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a kill when a line equal to `line` arrives on either stream.
    pub fn kill_on(mut self, line: &str) -> Self {
        self.kill_on = Some(line.to_string());
        self
    }

    /// Snapshot of what has been recorded so far.
    pub fn recorded(&self) -> Recorded {
        self.recorded.lock().unwrap().clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        *self.recorded.lock().unwrap() = Recorded::default();
    }

    fn record(&mut self, source: StreamSource, line: &str) -> bool {
        self.recorded.lock().unwrap().lines.push(LineEvent {
            source,
            text: line.to_string(),
        });
        self.kill_on.as_deref() == Some(line)
    }
}

impl StreamHandler for RecordingHandler {
    fn on_stdout(&mut self, line: &str) -> bool {
        self.record(StreamSource::Stdout, line)
    }

    fn on_stderr(&mut self, line: &str) -> bool {
        self.record(StreamSource::Stderr, line)
    }

    fn on_timeout(&mut self) {
        self.recorded.lock().unwrap().timeouts += 1;
    }
}

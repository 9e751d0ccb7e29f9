// src/exec/handler.rs

//! Line / timeout callbacks invoked by the [`StreamRunner`].
//!
//! - [`StreamHandler`] is the extension point. Every method has a default, so
//!   implementors only override what they care about.
//! - [`PrintHandler`] is the plain default: print every line, never kill.
//! - [`CallbackHandler`] lets callers plug in closures instead of writing a
//!   type.
//! - [`PatternKillHandler`] prints lines and requests a kill when a line
//!   matches a regex; the CLI is built on it.
//!
//! [`StreamRunner`]: crate::exec::StreamRunner

use std::fmt;

use regex::Regex;

/// Which output stream of the supervised process a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSource::Stdout => f.write_str("stdout"),
            StreamSource::Stderr => f.write_str("stderr"),
        }
    }
}

/// One line read from the supervised process, trailing newline stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvent {
    pub source: StreamSource,
    pub text: String,
}

/// Callbacks for a supervised run.
///
/// The line callbacks return `true` to request that the process tree be
/// killed immediately; the run then ends with
/// [`TerminationReason::KilledByHandler`] and no further callbacks fire.
///
/// [`TerminationReason::KilledByHandler`]: crate::exec::TerminationReason::KilledByHandler
pub trait StreamHandler: Send {
    fn on_stdout(&mut self, line: &str) -> bool {
        println!("{line}");
        false
    }

    fn on_stderr(&mut self, line: &str) -> bool {
        println!("{line}");
        false
    }

    fn on_timeout(&mut self) {
        println!("Timeout");
    }

    /// Route a line to `on_stdout` / `on_stderr` by its source.
    fn on_line(&mut self, event: &LineEvent) -> bool {
        match event.source {
            StreamSource::Stdout => self.on_stdout(&event.text),
            StreamSource::Stderr => self.on_stderr(&event.text),
        }
    }
}

/// Handler with all the default behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintHandler;

impl StreamHandler for PrintHandler {}

type LineFn = Box<dyn FnMut(&str) -> bool + Send>;
type TimeoutFn = Box<dyn FnMut() + Send>;

/// Handler assembled from closures.
///
/// Any callback left unset keeps the default behaviour of [`StreamHandler`].
///
/// ```
/// use cmdstream::exec::CallbackHandler;
///
/// let handler = CallbackHandler::new()
///     .with_stderr(|line| line.contains("fatal"))
///     .with_timeout(|| eprintln!("gave up waiting"));
/// # let _ = handler;
/// ```
#[derive(Default)]
pub struct CallbackHandler {
    stdout: Option<LineFn>,
    stderr: Option<LineFn>,
    timeout: Option<TimeoutFn>,
}

impl CallbackHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stdout(mut self, f: impl FnMut(&str) -> bool + Send + 'static) -> Self {
        self.stdout = Some(Box::new(f));
        self
    }

    pub fn with_stderr(mut self, f: impl FnMut(&str) -> bool + Send + 'static) -> Self {
        self.stderr = Some(Box::new(f));
        self
    }

    pub fn with_timeout(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.timeout = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for CallbackHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandler")
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .field("timeout", &self.timeout.is_some())
            .finish()
    }
}

impl StreamHandler for CallbackHandler {
    fn on_stdout(&mut self, line: &str) -> bool {
        match self.stdout.as_mut() {
            Some(f) => f(line),
            None => PrintHandler.on_stdout(line),
        }
    }

    fn on_stderr(&mut self, line: &str) -> bool {
        match self.stderr.as_mut() {
            Some(f) => f(line),
            None => PrintHandler.on_stderr(line),
        }
    }

    fn on_timeout(&mut self) {
        match self.timeout.as_mut() {
            Some(f) => f(),
            None => PrintHandler.on_timeout(),
        }
    }
}

/// Prints lines and requests a kill when a line matches a pattern.
///
/// With `tag` enabled, printed lines are prefixed with `[stdout]` or
/// `[stderr]` so the two streams stay distinguishable on one terminal.
#[derive(Debug, Clone, Default)]
pub struct PatternKillHandler {
    pub kill_on_stdout: Option<Regex>,
    pub kill_on_stderr: Option<Regex>,
    pub tag: bool,
}

impl PatternKillHandler {
    fn handle(&self, source: StreamSource, line: &str) -> bool {
        if self.tag {
            println!("[{source}] {line}");
        } else {
            println!("{line}");
        }
        self.matches(source, line)
    }

    /// Whether `line` from `source` matches the configured kill pattern.
    pub fn matches(&self, source: StreamSource, line: &str) -> bool {
        let pattern = match source {
            StreamSource::Stdout => self.kill_on_stdout.as_ref(),
            StreamSource::Stderr => self.kill_on_stderr.as_ref(),
        };
        pattern.is_some_and(|re| re.is_match(line))
    }
}

impl StreamHandler for PatternKillHandler {
    fn on_stdout(&mut self, line: &str) -> bool {
        self.handle(StreamSource::Stdout, line)
    }

    fn on_stderr(&mut self, line: &str) -> bool {
        self.handle(StreamSource::Stderr, line)
    }

    fn on_timeout(&mut self) {
        if self.tag {
            println!("[cmdstream] Timeout");
        } else {
            println!("Timeout");
        }
    }
}

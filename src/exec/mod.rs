// src/exec/mod.rs

//! Process supervision layer.
//!
//! - [`process`] spawns the command with separate stdout / stderr pipes and
//!   owns the child until it is reaped.
//! - [`runner`] holds [`StreamRunner`], the loop that multiplexes both pipes,
//!   enforces the timeout and dispatches to a [`StreamHandler`].
//! - [`handler`] defines the callback trait and the stock handlers.
//! - [`process_tree`] finds and kills every descendant of a process.

pub mod handler;
pub mod process;
pub mod process_tree;
pub mod runner;

pub use handler::{
    CallbackHandler, LineEvent, PatternKillHandler, PrintHandler, StreamHandler, StreamSource,
};
pub use process::{CommandSpec, ProcessHandle};
pub use runner::{RunConfig, RunOutcome, RunState, StreamRunner, TerminationReason};

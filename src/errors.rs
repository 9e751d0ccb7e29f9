// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::exec::StreamSource;

#[derive(Error, Debug)]
pub enum CmdStreamError {
    #[error("command is empty; expected a program and optional arguments")]
    EmptyCommand,

    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading {stream} of supervised process: {source}")]
    Read {
        stream: StreamSource,
        #[source]
        source: std::io::Error,
    },

    #[error("error waiting for supervised process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CmdStreamError>;

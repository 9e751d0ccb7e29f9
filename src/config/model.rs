// src/config/model.rs

use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::exec::RunConfig;

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [run]
/// timeout = "30s"
/// poll_interval = "40ms"
///
/// [kill_on]
/// stdout = "^FATAL"
/// stderr = "panic"
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub kill_on: KillOnSection,
}

/// `[run]` section. Durations are kept as strings until validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Wall-clock limit, e.g. `"30s"`. `"0s"` or absent means no limit.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Poll tick, e.g. `"40ms"`.
    #[serde(default)]
    pub poll_interval: Option<String>,
}

/// `[kill_on]` section: regexes that abort the run when a line matches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KillOnSection {
    #[serde(default)]
    pub stdout: Option<String>,

    #[serde(default)]
    pub stderr: Option<String>,
}

/// Validated configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub timeout: Option<Duration>,
    pub poll_interval: Option<Duration>,
    pub kill_on_stdout: Option<Regex>,
    pub kill_on_stderr: Option<Regex>,
}

impl ConfigFile {
    /// Build the [`RunConfig`] this file describes, on top of the defaults.
    pub fn run_config(&self) -> RunConfig {
        let mut cfg = RunConfig::default();
        if let Some(timeout) = self.timeout {
            cfg = cfg.with_timeout(timeout);
        }
        if let Some(poll) = self.poll_interval {
            cfg = cfg.with_poll_interval(poll);
        }
        cfg
    }
}

//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime configuration.
///
/// Holds paths derived from environment variables and system defaults,
/// not from config files.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for all per-user data (default: ~/.nanotown)
    pub base_dir: PathBuf,
}

/// Tunables loaded from TOML config files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NanotownConfig {
    #[serde(default)]
    pub status: StatusConfig,

    #[serde(default)]
    pub stop: StopConfig,

    #[serde(default)]
    pub shell: ShellConfig,

    #[serde(default)]
    pub agents: AgentsConfig,
}

/// Live status dashboard timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusConfig {
    /// Milliseconds between redraws.
    #[serde(default = "super::defaults::default_tick_ms")]
    pub tick_ms: u64,

    /// Number of ticks between expensive refreshes (store, processes, worktrees).
    #[serde(default = "super::defaults::default_refresh_every_ticks")]
    pub refresh_every_ticks: u64,

    /// Seconds of output silence after which a running session counts as idle.
    #[serde(default = "super::defaults::default_active_threshold_secs")]
    pub active_threshold_secs: u64,

    /// Milliseconds each spinner frame is shown.
    #[serde(default = "super::defaults::default_spinner_interval_ms")]
    pub spinner_interval_ms: u64,
}

/// Session stop behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StopConfig {
    /// Seconds to wait after a graceful termination request before force killing.
    #[serde(default = "super::defaults::default_grace_secs")]
    pub grace_secs: u64,
}

/// Shell launched inside each session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellConfig {
    /// Shell program. Falls back to `$SHELL`, then `/bin/sh`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Tag prepended to the prompt of bash and zsh sessions.
    #[serde(default = "super::defaults::default_prompt_tag")]
    pub prompt_tag: String,
}

/// Agent detection catalog extensions.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AgentsConfig {
    /// Program names appended to the built-in catalog.
    #[serde(default)]
    pub extra: Vec<String>,
}

//! Default implementations for configuration types.
//!
//! Used by serde `#[serde(default = "...")]` attributes and `Default` impls.

use crate::config::types::{Config, ShellConfig, StatusConfig, StopConfig};
use crate::errors::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that overrides the per-user base directory.
pub const HOME_ENV_VAR: &str = "NANOTOWN_HOME";

pub fn default_tick_ms() -> u64 {
    100
}

pub fn default_refresh_every_ticks() -> u64 {
    10
}

pub fn default_active_threshold_secs() -> u64 {
    2
}

pub fn default_spinner_interval_ms() -> u64 {
    80
}

pub fn default_grace_secs() -> u64 {
    3
}

pub fn default_prompt_tag() -> String {
    "nt".to_string()
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            refresh_every_ticks: default_refresh_every_ticks(),
            active_threshold_secs: default_active_threshold_secs(),
            spinner_interval_ms: default_spinner_interval_ms(),
        }
    }
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            grace_secs: default_grace_secs(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: None,
            prompt_tag: default_prompt_tag(),
        }
    }
}

impl StopConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

impl Config {
    /// Resolve the per-user base directory.
    ///
    /// `NANOTOWN_HOME` wins over `~/.nanotown`. Failing to find either is
    /// fatal: sessions cannot be recorded anywhere.
    pub fn resolve() -> Result<Self, ConfigError> {
        if let Some(dir) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(Self::with_base_dir(PathBuf::from(dir)));
        }
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(Self::with_base_dir(home.join(".nanotown")))
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.base_dir.join("sessions")
    }

    /// Directory for disposable shell startup scripts, one subdirectory per session.
    pub fn shell_dir(&self) -> PathBuf {
        self.base_dir.join("shell")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        let config = Config::with_base_dir(PathBuf::from("/tmp/nt-home"));
        assert_eq!(config.sessions_dir(), PathBuf::from("/tmp/nt-home/sessions"));
        assert_eq!(config.shell_dir(), PathBuf::from("/tmp/nt-home/shell"));
    }

    #[test]
    fn test_stop_grace_default() {
        assert_eq!(StopConfig::default().grace(), Duration::from_secs(3));
    }
}

//! Configuration loading and merging logic.
//!
//! Missing config files are not errors; unreadable or unparsable ones are.

use crate::config::types::NanotownConfig;
use crate::config::validation::validate_config;
use crate::errors::ConfigError;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load configuration from the hierarchy of config files.
///
/// Loads and merges configuration from:
/// 1. Default values
/// 2. User config (`~/.nanotown/config.toml`, or `$NANOTOWN_HOME/config.toml`)
/// 3. Project config (`./.nanotown/config.toml`)
pub fn load_hierarchy() -> Result<NanotownConfig, ConfigError> {
    let mut config = NanotownConfig::default();

    if let Ok(runtime) = crate::config::Config::resolve()
        && let Some(user_config) = load_config_file(&runtime.base_dir.join("config.toml"))?
    {
        config = merge_configs(config, user_config);
    }

    let project_path = std::env::current_dir()?
        .join(crate::worktree::WORKTREE_DIR)
        .join("config.toml");
    if let Some(project_config) = load_config_file(&project_path)? {
        config = merge_configs(config, project_config);
    }

    validate_config(&config)?;

    Ok(config)
}

/// Load a configuration file, returning `None` when it does not exist.
pub fn load_config_file(path: &Path) -> Result<Option<NanotownConfig>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(event = "core.config.file_not_found", path = %path.display());
            return Ok(None);
        }
        Err(e) => return Err(ConfigError::IoError { source: e }),
    };

    let config = toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    debug!(event = "core.config.file_loaded", path = %path.display());
    Ok(Some(config))
}

/// Merge two configurations, with `override_config` taking precedence.
///
/// Sections are replaced wholesale except the agent catalog extensions,
/// which accumulate.
pub fn merge_configs(base: NanotownConfig, override_config: NanotownConfig) -> NanotownConfig {
    let mut extra = base.agents.extra;
    for name in override_config.agents.extra {
        if !extra.contains(&name) {
            extra.push(name);
        }
    }

    NanotownConfig {
        status: override_config.status,
        stop: override_config.stop,
        shell: crate::config::ShellConfig {
            program: override_config.shell.program.or(base.shell.program),
            prompt_tag: override_config.shell.prompt_tag,
        },
        agents: crate::config::AgentsConfig { extra },
    }
}

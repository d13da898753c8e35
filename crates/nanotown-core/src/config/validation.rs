use crate::config::types::NanotownConfig;
use crate::errors::ConfigError;

/// Reject values that would stall or spin the status loop.
pub fn validate_config(config: &NanotownConfig) -> Result<(), ConfigError> {
    if config.status.tick_ms == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "status.tick_ms must be greater than 0".to_string(),
        });
    }
    if config.status.refresh_every_ticks == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "status.refresh_every_ticks must be greater than 0".to_string(),
        });
    }
    if config.status.spinner_interval_ms == 0 {
        return Err(ConfigError::InvalidConfiguration {
            message: "status.spinner_interval_ms must be greater than 0".to_string(),
        });
    }
    if config.agents.extra.iter().any(|name| name.trim().is_empty()) {
        return Err(ConfigError::InvalidConfiguration {
            message: "agents.extra must not contain empty names".to_string(),
        });
    }
    Ok(())
}

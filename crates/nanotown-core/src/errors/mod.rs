use std::error::Error;

/// Base trait for all application errors
pub trait NanotownError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the application
pub type NanotownResult<T> = Result<T, Box<dyn NanotownError>>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not resolve a home directory. Set HOME or NANOTOWN_HOME.")]
    NoHomeDirectory,

    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParseError { path: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("IO error reading config: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl NanotownError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::NoHomeDirectory => "CONFIG_NO_HOME_DIRECTORY",
            ConfigError::ConfigParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            ConfigError::ConfigParseError { .. } | ConfigError::InvalidConfiguration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nanotown_result() {
        let _result: NanotownResult<i32> = Ok(42);
    }

    #[test]
    fn test_config_parse_error() {
        let error = ConfigError::ConfigParseError {
            path: "/tmp/config.toml".to_string(),
            message: "invalid TOML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse config file '/tmp/config.toml': invalid TOML syntax"
        );
        assert_eq!(error.error_code(), "CONFIG_PARSE_ERROR");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_no_home_directory_is_not_user_error() {
        let error = ConfigError::NoHomeDirectory;
        assert_eq!(error.error_code(), "CONFIG_NO_HOME_DIRECTORY");
        assert!(!error.is_user_error());
    }
}

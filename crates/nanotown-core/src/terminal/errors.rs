use crate::errors::NanotownError;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to open pseudo-terminal: {message}")]
    PtyOpen { message: String },

    #[error("Failed to spawn shell '{program}': {message}")]
    Spawn { program: String, message: String },

    #[error("Failed to write shell startup files in '{path}': {source}")]
    StartupFiles {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Raw terminal mode unavailable: {message}")]
    RawModeUnavailable { message: String },

    #[error("IO error in terminal bridge: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl NanotownError for BridgeError {
    fn error_code(&self) -> &'static str {
        match self {
            BridgeError::PtyOpen { .. } => "PTY_OPEN_FAILED",
            BridgeError::Spawn { .. } => "PTY_SPAWN_FAILED",
            BridgeError::StartupFiles { .. } => "SHELL_STARTUP_FILES_FAILED",
            BridgeError::RawModeUnavailable { .. } => "RAW_MODE_UNAVAILABLE",
            BridgeError::IoError { .. } => "BRIDGE_IO_ERROR",
        }
    }
}

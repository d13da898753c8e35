use crate::errors::NanotownError;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Process '{pid}' not found")]
    NotFound { pid: i64 },

    #[error("Invalid PID: {pid}")]
    InvalidPid { pid: i64 },

    #[error("Failed to signal process '{pid}': {message}")]
    SignalFailed { pid: i64, message: String },

    #[error("Process enumeration via {strategy} unavailable: {message}")]
    EnumerationUnavailable {
        strategy: &'static str,
        message: String,
    },
}

impl NanotownError for ProcessError {
    fn error_code(&self) -> &'static str {
        match self {
            ProcessError::NotFound { .. } => "PROCESS_NOT_FOUND",
            ProcessError::InvalidPid { .. } => "PROCESS_INVALID_PID",
            ProcessError::SignalFailed { .. } => "PROCESS_SIGNAL_FAILED",
            ProcessError::EnumerationUnavailable { .. } => "PROCESS_ENUMERATION_UNAVAILABLE",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            ProcessError::NotFound { .. } | ProcessError::InvalidPid { .. }
        )
    }
}

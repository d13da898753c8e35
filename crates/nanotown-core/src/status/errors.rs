use crate::errors::NanotownError;

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("Failed to start status event loop: {source}")]
    Runtime {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to draw status: {source}")]
    TerminalIo {
        #[from]
        source: std::io::Error,
    },
}

impl NanotownError for StatusError {
    fn error_code(&self) -> &'static str {
        match self {
            StatusError::Runtime { .. } => "STATUS_RUNTIME_FAILED",
            StatusError::TerminalIo { .. } => "STATUS_TERMINAL_IO",
        }
    }
}

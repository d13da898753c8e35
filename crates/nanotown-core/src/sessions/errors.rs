use crate::errors::NanotownError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Description is required. Usage: nt <desc>")]
    MissingDescription,

    #[error("Invalid worktree id '{id}': {reason}")]
    InvalidWorktreeId { id: String, reason: String },

    #[error("Worktree not found: {id}")]
    WorktreeNotFound { id: String },

    #[error("Session {session_id} is still running on worktree {worktree}. Stop it first with: nt stop {worktree}")]
    StillRunning { session_id: String, worktree: String },

    #[error("Failed to stop session {session_id} (pid {pid}): {message}")]
    StopFailed {
        session_id: String,
        pid: i64,
        message: String,
    },

    #[error("Working directory is not clean. Commit or stash your changes first")]
    DirtyRepository,

    #[error("Failed to serialize session '{id}': {message}")]
    Serialization { id: String, message: String },

    #[error("Session store IO failed at '{path}': {source}")]
    StoreIo {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("VCS operation failed: {source}")]
    VcsError {
        #[from]
        source: crate::vcs::VcsError,
    },

    #[error("Terminal bridge failed: {source}")]
    BridgeError {
        #[from]
        source: crate::terminal::BridgeError,
    },

    #[error("IO operation failed: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl NanotownError for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            SessionError::MissingDescription => "SESSION_MISSING_DESCRIPTION",
            SessionError::InvalidWorktreeId { .. } => "SESSION_INVALID_WORKTREE_ID",
            SessionError::WorktreeNotFound { .. } => "WORKTREE_NOT_FOUND",
            SessionError::StillRunning { .. } => "SESSION_STILL_RUNNING",
            SessionError::StopFailed { .. } => "SESSION_STOP_FAILED",
            SessionError::DirtyRepository => "SESSION_DIRTY_REPOSITORY",
            SessionError::Serialization { .. } => "SESSION_SERIALIZATION_FAILED",
            SessionError::StoreIo { .. } => "SESSION_STORE_IO",
            SessionError::VcsError { .. } => "VCS_ERROR",
            SessionError::BridgeError { .. } => "BRIDGE_ERROR",
            SessionError::IoError { .. } => "IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            SessionError::MissingDescription
                | SessionError::InvalidWorktreeId { .. }
                | SessionError::WorktreeNotFound { .. }
                | SessionError::StillRunning { .. }
                | SessionError::DirtyRepository
        )
    }
}

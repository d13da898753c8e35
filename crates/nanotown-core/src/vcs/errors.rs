use crate::errors::NanotownError;

#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    #[error("Not inside a version-controlled repository")]
    NotInRepository,

    #[error("This repository has no commits yet. Make an initial commit before using nanotown")]
    NoCommits,

    #[error("Invalid {label}: {message}")]
    InvalidArgument { label: &'static str, message: String },

    #[error("Failed to create worktree '{id}': {message}")]
    WorktreeCreateFailed { id: String, message: String },

    #[error("Failed to remove worktree '{id}': {message}")]
    WorktreeRemovalFailed { id: String, message: String },

    #[error("Merge of '{branch}' failed: {message}")]
    MergeFailed { branch: String, message: String },

    #[error("Branch '{branch}' not found")]
    BranchNotFound { branch: String },

    #[error("Failed to execute git: {source}")]
    CommandSpawn {
        #[source]
        source: std::io::Error,
    },

    #[error("Git2 library error: {source}")]
    Git2Error {
        #[from]
        source: git2::Error,
    },

    #[error("IO error during VCS operation: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl NanotownError for VcsError {
    fn error_code(&self) -> &'static str {
        match self {
            VcsError::NotInRepository => "NOT_IN_REPOSITORY",
            VcsError::NoCommits => "VCS_NO_COMMITS",
            VcsError::InvalidArgument { .. } => "VCS_INVALID_ARGUMENT",
            VcsError::WorktreeCreateFailed { .. } => "WORKTREE_CREATE_FAILED",
            VcsError::WorktreeRemovalFailed { .. } => "WORKTREE_REMOVAL_FAILED",
            VcsError::MergeFailed { .. } => "MERGE_FAILED",
            VcsError::BranchNotFound { .. } => "BRANCH_NOT_FOUND",
            VcsError::CommandSpawn { .. } => "VCS_COMMAND_SPAWN_FAILED",
            VcsError::Git2Error { .. } => "GIT2_ERROR",
            VcsError::IoError { .. } => "VCS_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            VcsError::NotInRepository
                | VcsError::NoCommits
                | VcsError::InvalidArgument { .. }
                | VcsError::BranchNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vcs_error_display() {
        let error = VcsError::NotInRepository;
        assert_eq!(
            error.to_string(),
            "Not inside a version-controlled repository"
        );
        assert_eq!(error.error_code(), "NOT_IN_REPOSITORY");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_merge_failed_is_not_user_error() {
        let error = VcsError::MergeFailed {
            branch: "nt-1".to_string(),
            message: "CONFLICT (content)".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Merge of 'nt-1' failed: CONFLICT (content)"
        );
        assert!(!error.is_user_error());
    }
}

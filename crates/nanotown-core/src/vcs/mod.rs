//! Version-control integration.
//!
//! The core only needs a narrow capability set from the VCS: find the
//! repository, create and remove isolated working copies, merge, and answer
//! a couple of cleanliness questions. Each supported VCS implements
//! [`VcsBackend`]; [`detect_vcs`] asks every registered backend in turn.

pub mod errors;
pub mod git;

use std::path::{Path, PathBuf};

pub use errors::VcsError;
pub use git::GitBackend;

pub trait VcsBackend: Send + Sync {
    /// Stable name persisted in session records.
    fn name(&self) -> &'static str;

    /// Whether `path` or one of its ancestors belongs to this VCS.
    fn detect(&self, path: &Path) -> bool;

    /// Root of the main checkout, even when `cwd` is inside a managed worktree.
    fn repo_root(&self, cwd: &Path) -> Result<PathBuf, VcsError>;

    fn current_branch(&self, repo_path: &Path) -> Result<String, VcsError>;

    fn branch_exists(&self, repo_path: &Path, branch: &str) -> bool;

    /// Create the working copy for `worktree_id`, reusing it if present.
    fn create_working_copy(&self, repo_path: &Path, worktree_id: &str)
    -> Result<PathBuf, VcsError>;

    /// Merge `branch` into `target_branch` inside the main checkout.
    fn merge(&self, repo_path: &Path, target_branch: &str, branch: &str) -> Result<(), VcsError>;

    /// Remove the working copy and its branch if merged. `force` discards
    /// uncommitted changes.
    fn remove_working_copy(
        &self,
        repo_path: &Path,
        worktree_id: &str,
        force: bool,
    ) -> Result<(), VcsError>;

    /// Paths with staged, unstaged or untracked changes. Empty when clean.
    fn uncommitted_changes(&self, path: &Path) -> Result<Vec<String>, VcsError>;

    /// Commits on `branch` not reachable from `base`.
    fn commits_ahead(&self, repo_path: &Path, base: &str, branch: &str)
    -> Result<usize, VcsError>;
}

static BACKENDS: &[&dyn VcsBackend] = &[&GitBackend];

/// First registered backend claiming `path`.
pub fn detect_vcs(path: &Path) -> Option<&'static dyn VcsBackend> {
    BACKENDS.iter().copied().find(|backend| backend.detect(path))
}

/// Backend recorded in a session, falling back to detection at `path`.
pub fn backend_for(name: &str, path: &Path) -> Option<&'static dyn VcsBackend> {
    BACKENDS
        .iter()
        .copied()
        .find(|backend| backend.name() == name)
        .or_else(|| detect_vcs(path))
}

/// Detect the VCS at `cwd` and resolve its repository root.
pub fn discover_repo(cwd: &Path) -> Result<(&'static dyn VcsBackend, PathBuf), VcsError> {
    let backend = detect_vcs(cwd).ok_or(VcsError::NotInRepository)?;
    let repo_path = backend.repo_root(cwd)?;
    Ok((backend, repo_path))
}

/// Uncommitted-changes check that treats a failed query as dirty.
pub fn is_dirty(backend: &dyn VcsBackend, path: &Path) -> bool {
    match backend.uncommitted_changes(path) {
        Ok(changes) => !changes.is_empty(),
        Err(e) => {
            tracing::warn!(
                event = "core.vcs.status_check_failed",
                path = %path.display(),
                error = %e,
                "Assuming uncommitted changes"
            );
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_vcs_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        // A temp dir may itself live under a checkout; only assert on a known layout.
        if dir.path().ancestors().any(|p| p.join(".git").exists()) {
            return;
        }
        assert!(detect_vcs(dir.path()).is_none());
    }

    #[test]
    fn test_detect_vcs_finds_git_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let backend = detect_vcs(&nested).unwrap();
        assert_eq!(backend.name(), "git");
    }

    #[test]
    fn test_backend_for_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend_for("git", dir.path()).unwrap();
        assert_eq!(backend.name(), "git");
    }
}

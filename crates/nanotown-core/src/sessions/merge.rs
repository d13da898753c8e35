use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::process::ProcessInspector;
use crate::sessions::{errors::SessionError, stop::is_running, store::SessionStore};
use crate::vcs::{self, VcsBackend};
use crate::worktree;

/// Everything the CLI needs to confirm a merge.
pub struct MergePlan {
    pub backend: &'static dyn VcsBackend,
    pub repo_path: PathBuf,
    pub worktree_id: String,
    pub current_branch: String,
    /// Branch the worktree was created from, empty when unknown.
    pub source_branch: String,
    pub uncommitted: Vec<String>,
    /// `None` when the count could not be computed.
    pub commits_ahead: Option<usize>,
}

impl std::fmt::Debug for MergePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergePlan")
            .field("backend", &self.backend.name())
            .field("repo_path", &self.repo_path)
            .field("worktree_id", &self.worktree_id)
            .field("current_branch", &self.current_branch)
            .field("source_branch", &self.source_branch)
            .field("uncommitted", &self.uncommitted)
            .field("commits_ahead", &self.commits_ahead)
            .finish()
    }
}

impl MergePlan {
    /// The worktree was branched from something other than the current branch.
    pub fn branch_mismatch(&self) -> bool {
        !self.source_branch.is_empty() && self.source_branch != self.current_branch
    }

    pub fn has_uncommitted(&self) -> bool {
        !self.uncommitted.is_empty()
    }

    pub fn nothing_to_merge(&self) -> bool {
        self.commits_ahead == Some(0)
    }
}

/// Check that a worktree can be merged into the current branch.
///
/// Hard failures: not in a repository, the main checkout is dirty, the
/// worktree is missing, or a session still runs on it. Everything else is
/// reported on the plan for confirmation.
pub fn merge_preflight(
    cwd: &Path,
    worktree_id: &str,
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
) -> Result<MergePlan, SessionError> {
    let (backend, repo_path) = vcs::discover_repo(cwd)?;

    if vcs::is_dirty(backend, &repo_path) {
        return Err(SessionError::DirtyRepository);
    }

    let current_branch = backend.current_branch(&repo_path)?;
    let wt_path = worktree::worktree_path(&repo_path, worktree_id);
    if !wt_path.exists() {
        return Err(SessionError::WorktreeNotFound {
            id: worktree_id.to_string(),
        });
    }

    if let Some(running) = store
        .list_for_repo(&repo_path)
        .into_iter()
        .find(|s| s.worktree_id() == worktree_id && is_running(s, inspector))
    {
        return Err(SessionError::StillRunning {
            session_id: running.id,
            worktree: worktree_id.to_string(),
        });
    }

    let uncommitted = backend.uncommitted_changes(&wt_path).unwrap_or_else(|e| {
        warn!(event = "core.session.merge_status_failed", worktree = worktree_id, error = %e);
        Vec::new()
    });
    let commits_ahead = match backend.commits_ahead(&repo_path, &current_branch, worktree_id) {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(event = "core.session.merge_ahead_failed", worktree = worktree_id, error = %e);
            None
        }
    };

    Ok(MergePlan {
        backend,
        source_branch: worktree::read_source_branch(&wt_path),
        repo_path,
        worktree_id: worktree_id.to_string(),
        current_branch,
        uncommitted,
        commits_ahead,
    })
}

/// Merge a confirmed plan, then remove the worktree and delete its sessions.
/// On a failed merge nothing is removed. Returns the number of session
/// records deleted.
pub fn merge_worktree(plan: &MergePlan, store: &SessionStore) -> Result<usize, SessionError> {
    info!(
        event = "core.session.merge_started",
        worktree = %plan.worktree_id,
        target = %plan.current_branch
    );

    plan.backend
        .merge(&plan.repo_path, &plan.current_branch, &plan.worktree_id)?;

    // The user confirmed losing uncommitted changes.
    plan.backend
        .remove_working_copy(&plan.repo_path, &plan.worktree_id, plan.has_uncommitted())?;

    let mut deleted = 0;
    for session in store.list_for_repo(&plan.repo_path) {
        if session.worktree_id() != plan.worktree_id {
            continue;
        }
        match store.delete(&session.id) {
            Ok(()) => deleted += 1,
            Err(e) => warn!(
                event = "core.session.record_delete_failed",
                session_id = %session.id,
                error = %e
            ),
        }
    }

    info!(
        event = "core.session.merge_completed",
        worktree = %plan.worktree_id,
        sessions = deleted
    );
    Ok(deleted)
}

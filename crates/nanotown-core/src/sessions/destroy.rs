use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::process::ProcessInspector;
use crate::sessions::{
    errors::SessionError,
    stop::{is_running, stop_session},
    store::SessionStore,
};
use crate::vcs::VcsBackend;
use crate::worktree;

/// What `delete_all` is about to do, for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteAllSummary {
    pub total: usize,
    pub running: usize,
    pub exited: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteAllReport {
    pub sessions_deleted: usize,
    pub worktrees_removed: usize,
    /// Worktrees whose removal failed, with the reason.
    pub failures: Vec<(String, String)>,
}

impl DeleteAllReport {
    pub fn cleaned(&self) -> usize {
        self.sessions_deleted + self.worktrees_removed
    }
}

/// Stop and delete every session on a worktree, then remove the worktree.
/// Returns the number of session records deleted.
pub fn delete_worktree(
    backend: &dyn VcsBackend,
    repo_path: &Path,
    worktree_id: &str,
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
    grace: Duration,
) -> Result<usize, SessionError> {
    if !worktree::worktree_path(repo_path, worktree_id).exists() {
        return Err(SessionError::WorktreeNotFound {
            id: worktree_id.to_string(),
        });
    }

    info!(event = "core.session.delete_worktree_started", worktree = worktree_id);

    let mut deleted = 0;
    for mut session in store.list_for_repo(repo_path) {
        if session.worktree_id() != worktree_id {
            continue;
        }
        stop_session(&mut session, store, inspector, grace)?;
        match store.delete(&session.id) {
            Ok(()) => deleted += 1,
            Err(e) => warn!(
                event = "core.session.record_delete_failed",
                session_id = %session.id,
                error = %e
            ),
        }
    }

    backend.remove_working_copy(repo_path, worktree_id, false)?;

    info!(
        event = "core.session.delete_worktree_completed",
        worktree = worktree_id,
        sessions = deleted
    );
    Ok(deleted)
}

pub fn delete_all_summary(
    repo_path: &Path,
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
) -> DeleteAllSummary {
    let sessions = store.list_for_repo(repo_path);
    let running = sessions
        .iter()
        .filter(|s| is_running(s, inspector))
        .count();
    DeleteAllSummary {
        total: sessions.len(),
        running,
        exited: sessions.len() - running,
    }
}

/// Stop and delete every session of a repository, remove their worktrees,
/// then remove worktree directories no session referenced.
///
/// Individual failures are logged and reported; the sweep continues.
pub fn delete_all(
    backend: &dyn VcsBackend,
    repo_path: &Path,
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
    grace: Duration,
) -> DeleteAllReport {
    info!(event = "core.session.delete_all_started", repo = %repo_path.display());

    let mut report = DeleteAllReport::default();
    let mut handled: HashSet<String> = HashSet::new();

    let remove = |worktree_id: &str, report: &mut DeleteAllReport| {
        if !worktree::worktree_path(repo_path, worktree_id).exists() {
            return;
        }
        match backend.remove_working_copy(repo_path, worktree_id, false) {
            Ok(()) => report.worktrees_removed += 1,
            Err(e) => {
                warn!(
                    event = "core.session.worktree_remove_failed",
                    worktree = worktree_id,
                    error = %e
                );
                report.failures.push((worktree_id.to_string(), e.to_string()));
            }
        }
    };

    for mut session in store.list_for_repo(repo_path) {
        if let Err(e) = stop_session(&mut session, store, inspector, grace) {
            warn!(event = "core.session.stop_failed", session_id = %session.id, error = %e);
        }

        let worktree_id = session.worktree_id();
        if handled.insert(worktree_id.clone()) {
            remove(&worktree_id, &mut report);
        }

        match store.delete(&session.id) {
            Ok(()) => report.sessions_deleted += 1,
            Err(e) => warn!(
                event = "core.session.record_delete_failed",
                session_id = %session.id,
                error = %e
            ),
        }
    }

    for orphan in worktree::list_worktree_ids(repo_path) {
        if handled.insert(orphan.clone()) {
            remove(&orphan, &mut report);
        }
    }

    info!(
        event = "core.session.delete_all_completed",
        sessions = report.sessions_deleted,
        worktrees = report.worktrees_removed,
        failures = report.failures.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeInspector;
    use crate::sessions::types::Session;
    use crate::vcs::{GitBackend, VcsBackend};
    use std::fs;
    use std::process::Command;

    fn git(dir: &Path, args: &[&str]) {
        let output = Command::new("git").args(args).current_dir(dir).output().unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
    }

    fn init_repo() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init"]);
        git(dir.path(), &["config", "user.email", "test@test.com"]);
        git(dir.path(), &["config", "user.name", "Test"]);
        fs::write(dir.path().join("README.md"), "hello\n").unwrap();
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-m", "initial"]);
        let root = GitBackend.repo_root(dir.path()).unwrap();
        (dir, root)
    }

    fn session_on(store: &SessionStore, root: &Path, id: &str, worktree_id: &str, pid: i64) {
        let wt = GitBackend.create_working_copy(root, worktree_id).unwrap();
        let mut s = Session::new(id.to_string(), root.to_path_buf(), wt, "git", worktree_id);
        s.pid = pid;
        store.write(&s).unwrap();
    }

    #[test]
    fn test_delete_worktree() {
        let (_repo, root) = init_repo();
        let home = tempfile::tempdir().unwrap();
        let store = SessionStore::at(home.path().join("sessions")).unwrap();
        let inspector = FakeInspector::new().with_alive(101);
        session_on(&store, &root, "1", "nt-1", 101);
        session_on(&store, &root, "2", "nt-2", 102);

        let deleted =
            delete_worktree(&GitBackend, &root, "nt-1", &store, &inspector, Duration::ZERO)
                .unwrap();

        assert_eq!(deleted, 1);
        assert!(!inspector.is_alive(101));
        assert!(store.get("1").is_none());
        assert!(store.get("2").is_some());
        assert!(!worktree::worktree_path(&root, "nt-1").exists());
        assert!(worktree::worktree_path(&root, "nt-2").exists());
    }

    #[test]
    fn test_delete_worktree_continues_past_undeletable_record() {
        let (_repo, root) = init_repo();
        let home = tempfile::tempdir().unwrap();
        let store = SessionStore::at(home.path().join("sessions")).unwrap();

        // Record "9" is listed from 1.json, but its own path is a directory.
        let wt = GitBackend.create_working_copy(&root, "nt-1").unwrap();
        let mut stuck = Session::new("9".to_string(), root.clone(), wt, "git", "nt-1");
        stuck.pid = 109;
        fs::write(
            store.dir().join("1.json"),
            serde_json::to_string(&stuck).unwrap(),
        )
        .unwrap();
        fs::create_dir_all(store.dir().join("9.json").join("keep")).unwrap();
        session_on(&store, &root, "2", "nt-1", 102);

        let deleted = delete_worktree(
            &GitBackend,
            &root,
            "nt-1",
            &store,
            &FakeInspector::new(),
            Duration::ZERO,
        )
        .unwrap();

        assert_eq!(deleted, 1);
        assert!(store.get("2").is_none());
        assert!(!worktree::worktree_path(&root, "nt-1").exists());
    }

    #[test]
    fn test_delete_missing_worktree() {
        let (_repo, root) = init_repo();
        let home = tempfile::tempdir().unwrap();
        let store = SessionStore::at(home.path().join("sessions")).unwrap();
        let err = delete_worktree(
            &GitBackend,
            &root,
            "nt-7",
            &store,
            &FakeInspector::new(),
            Duration::ZERO,
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::WorktreeNotFound { .. }));
    }

    #[test]
    fn test_delete_all_with_orphan() {
        let (_repo, root) = init_repo();
        let home = tempfile::tempdir().unwrap();
        let store = SessionStore::at(home.path().join("sessions")).unwrap();
        let inspector = FakeInspector::new().with_alive(101);
        session_on(&store, &root, "1", "nt-1", 101);
        session_on(&store, &root, "2", "nt-1", 102);
        GitBackend.create_working_copy(&root, "orphan").unwrap();

        let summary = delete_all_summary(&root, &store, &inspector);
        assert_eq!(
            summary,
            DeleteAllSummary {
                total: 2,
                running: 1,
                exited: 1
            }
        );

        let report = delete_all(&GitBackend, &root, &store, &inspector, Duration::ZERO);

        assert_eq!(report.sessions_deleted, 2);
        assert_eq!(report.worktrees_removed, 2);
        assert!(report.failures.is_empty());
        assert!(store.list_all().is_empty());
        assert!(worktree::list_worktree_ids(&root).is_empty());
    }
}

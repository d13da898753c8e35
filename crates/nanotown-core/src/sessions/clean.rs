use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::process::ProcessInspector;
use crate::sessions::{errors::SessionError, stop::is_running, store::SessionStore};
use crate::vcs;
use crate::worktree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanEvent {
    SessionCleaned { id: String },
    SessionSkipped { id: String },
    OrphanCleaned { worktree: String },
    OrphanSkipped { worktree: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub events: Vec<CleanEvent>,
}

impl CleanReport {
    pub fn cleaned(&self) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    CleanEvent::SessionCleaned { .. } | CleanEvent::OrphanCleaned { .. }
                )
            })
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.events.len() - self.cleaned()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Remove stopped sessions and worktree directories no session references.
///
/// Running sessions are left alone. A worktree with uncommitted changes is
/// never removed, and its session record is kept. `cwd_repo` adds a
/// repository to the orphan scan even when no session references it.
pub fn auto_clean(
    cwd_repo: Option<&Path>,
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
) -> Result<CleanReport, SessionError> {
    info!(event = "core.session.clean_started");

    let sessions = store.list_all();
    let mut report = CleanReport::default();

    let mut repos: BTreeSet<PathBuf> = sessions.iter().map(|s| s.repo_path.clone()).collect();
    if let Some(repo) = cwd_repo {
        repos.insert(repo.to_path_buf());
    }

    for mut session in sessions.iter().cloned() {
        if is_running(&session, inspector) {
            continue;
        }

        if session.alive {
            session.alive = false;
            if let Err(e) = store.write(&session) {
                warn!(event = "core.session.clean_persist_failed", session_id = %session.id, error = %e);
            }
        }

        let backend = vcs::backend_for(&session.vcs_backend_name, &session.repo_path);

        if session.working_copy_path.exists()
            && let Some(backend) = backend
            && vcs::is_dirty(backend, &session.working_copy_path)
        {
            report.events.push(CleanEvent::SessionSkipped {
                id: session.id.clone(),
            });
            continue;
        }

        let worktree_id = session.worktree_id();
        let in_use = sessions.iter().any(|other| {
            other.id != session.id
                && other.repo_path == session.repo_path
                && other.worktree_id() == worktree_id
                && is_running(other, inspector)
        });

        if !in_use
            && session.working_copy_path.exists()
            && let Some(backend) = backend
            && let Err(e) = backend.remove_working_copy(&session.repo_path, &worktree_id, false)
        {
            warn!(
                event = "core.session.clean_remove_failed",
                session_id = %session.id,
                worktree = %worktree_id,
                error = %e
            );
        }

        match store.delete(&session.id) {
            Ok(()) => report.events.push(CleanEvent::SessionCleaned {
                id: session.id.clone(),
            }),
            Err(e) => warn!(
                event = "core.session.record_delete_failed",
                session_id = %session.id,
                error = %e
            ),
        }
    }

    let remaining = store.list_all();
    for repo in &repos {
        let referenced: HashSet<String> = remaining
            .iter()
            .filter(|s| &s.repo_path == repo)
            .map(|s| s.worktree_id())
            .collect();
        let Some(backend) = vcs::detect_vcs(repo) else {
            continue;
        };

        for orphan in worktree::list_worktree_ids(repo) {
            if referenced.contains(&orphan) {
                continue;
            }
            let path = worktree::worktree_path(repo, &orphan);
            if vcs::is_dirty(backend, &path) {
                report.events.push(CleanEvent::OrphanSkipped { worktree: orphan });
                continue;
            }
            match backend.remove_working_copy(repo, &orphan, false) {
                Ok(()) => report.events.push(CleanEvent::OrphanCleaned { worktree: orphan }),
                Err(e) => warn!(
                    event = "core.session.clean_orphan_failed",
                    worktree = %orphan,
                    error = %e
                ),
            }
        }
    }

    info!(
        event = "core.session.clean_completed",
        cleaned = report.cleaned(),
        skipped = report.skipped()
    );
    Ok(report)
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

    fn init_repo() -> (tempfile::TempDir, PathBuf) {
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

    fn session_on(store: &SessionStore, root: &Path, id: &str, worktree_id: &str, pid: i64) -> PathBuf {
        let wt = GitBackend.create_working_copy(root, worktree_id).unwrap();
        let mut s = Session::new(id.to_string(), root.to_path_buf(), wt.clone(), "git", worktree_id);
        s.pid = pid;
        store.write(&s).unwrap();
        wt
    }

    #[test]
    fn test_clean_removes_exited_keeps_running() {
        let (_repo, root) = init_repo();
        let home = tempfile::tempdir().unwrap();
        let store = SessionStore::at(home.path().join("sessions")).unwrap();
        let inspector = FakeInspector::new().with_alive(102);
        let exited = session_on(&store, &root, "1", "nt-1", 101);
        let running = session_on(&store, &root, "2", "nt-2", 102);

        let report = auto_clean(None, &store, &inspector).unwrap();

        assert_eq!(
            report.events,
            vec![CleanEvent::SessionCleaned { id: "1".to_string() }]
        );
        assert!(!exited.exists());
        assert!(running.exists());
        assert!(store.get("2").is_some());
    }

    #[test]
    fn test_clean_skips_dirty_worktree() {
        let (_repo, root) = init_repo();
        let home = tempfile::tempdir().unwrap();
        let store = SessionStore::at(home.path().join("sessions")).unwrap();
        let wt = session_on(&store, &root, "1", "nt-1", 101);
        fs::write(wt.join("wip.txt"), "unsaved").unwrap();

        let report = auto_clean(None, &store, &FakeInspector::new()).unwrap();

        assert_eq!(report.cleaned(), 0);
        assert_eq!(report.skipped(), 1);
        assert!(wt.exists());
        // Stale liveness is downgraded even when the record is kept.
        assert!(!store.get("1").unwrap().alive);
    }

    #[test]
    fn test_clean_keeps_worktree_shared_with_running_session() {
        let (_repo, root) = init_repo();
        let home = tempfile::tempdir().unwrap();
        let store = SessionStore::at(home.path().join("sessions")).unwrap();
        let inspector = FakeInspector::new().with_alive(102);
        let wt = session_on(&store, &root, "1", "nt-1", 101);
        session_on(&store, &root, "2", "nt-1", 102);

        auto_clean(None, &store, &inspector).unwrap();

        assert!(store.get("1").is_none());
        assert!(wt.exists());
    }

    #[test]
    fn test_clean_orphans_in_cwd_repo() {
        let (_repo, root) = init_repo();
        let home = tempfile::tempdir().unwrap();
        let store = SessionStore::at(home.path().join("sessions")).unwrap();
        GitBackend.create_working_copy(&root, "stray").unwrap();

        let report = auto_clean(Some(&root), &store, &FakeInspector::new()).unwrap();

        assert_eq!(
            report.events,
            vec![CleanEvent::OrphanCleaned {
                worktree: "stray".to_string()
            }]
        );
    }

    #[test]
    fn test_clean_continues_past_undeletable_record() {
        let (_repo, root) = init_repo();
        let home = tempfile::tempdir().unwrap();
        let store = SessionStore::at(home.path().join("sessions")).unwrap();

        // Record "9" is listed from 1.json, but its own path is a directory.
        let wt = GitBackend.create_working_copy(&root, "nt-1").unwrap();
        let stuck = Session::new("9".to_string(), root.clone(), wt, "git", "nt-1");
        fs::write(
            store.dir().join("1.json"),
            serde_json::to_string(&stuck).unwrap(),
        )
        .unwrap();
        fs::create_dir_all(store.dir().join("9.json").join("keep")).unwrap();
        session_on(&store, &root, "2", "nt-2", 102);
        GitBackend.create_working_copy(&root, "stray").unwrap();

        let report = auto_clean(Some(&root), &store, &FakeInspector::new()).unwrap();

        assert!(!report.events.contains(&CleanEvent::SessionCleaned { id: "9".to_string() }));
        assert!(report.events.contains(&CleanEvent::SessionCleaned { id: "2".to_string() }));
        assert!(report.events.contains(&CleanEvent::OrphanCleaned {
            worktree: "stray".to_string()
        }));
        assert!(store.get("2").is_none());
    }

    #[test]
    fn test_nothing_to_clean() {
        let home = tempfile::tempdir().unwrap();
        let store = SessionStore::at(home.path().join("sessions")).unwrap();
        let report = auto_clean(None, &store, &FakeInspector::new()).unwrap();
        assert!(report.is_empty());
    }
}

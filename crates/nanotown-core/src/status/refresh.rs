//! The expensive half of the status loop: store, process table and
//! worktree scans.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::agents::AgentCatalog;
use crate::process::{ProcessInspector, detect_agent};
use crate::sessions::{store::SessionStore, types::Session};
use crate::status::classify::sort_by_state;
use crate::worktree::{self, WorktreeInfo};

/// A session plus the worktree metadata shown next to it.
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub session: Session,
    pub branch: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    pub rows: Vec<SessionRow>,
    pub worktrees: Vec<WorktreeInfo>,
}

impl StatusSnapshot {
    pub fn sort(&mut self, now: DateTime<Utc>, threshold: Duration) {
        sort_by_state(&mut self.rows, |row| &row.session, now, threshold);
    }
}

fn persist(store: &SessionStore, session: &Session) {
    if let Err(e) = store.write(session) {
        warn!(
            event = "core.status.persist_failed",
            session_id = %session.id,
            error = %e
        );
    }
}

/// Reload sessions, reconcile liveness with the OS, detect agents and
/// rescan worktree directories.
pub fn refresh(
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
    catalog: &AgentCatalog,
) -> StatusSnapshot {
    let mut sessions = store.list_all();

    for session in &mut sessions {
        if session.alive && !inspector.is_alive(session.pid) {
            session.alive = false;
            persist(store, session);
            continue;
        }
        if !session.alive {
            continue;
        }
        if let Some(model) = detect_agent(inspector, catalog, session.pid)
            && model != session.model
        {
            session.model = model;
            persist(store, session);
        }
    }

    let worktrees = worktree::list_worktrees(&sessions);
    let rows = {
        let by_worktree: HashMap<(PathBuf, String), &WorktreeInfo> = worktrees
            .iter()
            .map(|wt| ((wt.repo_path.clone(), wt.id.clone()), wt))
            .collect();

        sessions
            .into_iter()
            .map(|session| {
                let key = (session.repo_path.clone(), session.worktree_id());
                let (branch, description) = match by_worktree.get(&key) {
                    Some(wt) => (wt.source_branch.clone(), wt.description.clone()),
                    None => (
                        worktree::read_source_branch(&session.working_copy_path),
                        worktree::read_description(&session.working_copy_path),
                    ),
                };
                SessionRow {
                    session,
                    branch,
                    description,
                }
            })
            .collect::<Vec<_>>()
    };

    debug!(
        event = "core.status.refresh_completed",
        sessions = rows.len(),
        worktrees = worktrees.len()
    );

    StatusSnapshot { rows, worktrees }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeInspector;
    use std::path::Path;

    fn fixture() -> (tempfile::TempDir, SessionStore, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("sessions")).unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(&repo).unwrap();
        (dir, store, repo)
    }

    fn session(store: &SessionStore, repo: &Path, id: &str, pid: i64) -> Session {
        let wt_id = format!("nt-{id}");
        let wt = worktree::worktree_path(repo, &wt_id);
        std::fs::create_dir_all(&wt).unwrap();
        let mut s = Session::new(id.to_string(), repo.to_path_buf(), wt, "git", &wt_id);
        s.pid = pid;
        store.write(&s).unwrap();
        s
    }

    #[test]
    fn test_dead_process_downgrades_alive() {
        let (_dir, store, repo) = fixture();
        session(&store, &repo, "1", 101);

        let snapshot = refresh(&store, &FakeInspector::new(), &AgentCatalog::default());

        assert!(!snapshot.rows[0].session.alive);
        assert!(!store.get("1").unwrap().alive);

        // Stays down on the next refresh.
        let again = refresh(&store, &FakeInspector::new(), &AgentCatalog::default());
        assert!(!again.rows[0].session.alive);
    }

    #[test]
    fn test_detects_and_persists_agent() {
        let (_dir, store, repo) = fixture();
        session(&store, &repo, "1", 101);
        let inspector = FakeInspector::new()
            .with_alive(101)
            .with_descendants(101, &["node", "claude"]);

        let snapshot = refresh(&store, &inspector, &AgentCatalog::default());

        assert_eq!(snapshot.rows[0].session.model, "claude");
        assert_eq!(store.get("1").unwrap().model, "claude");
    }

    #[test]
    fn test_exited_sessions_keep_last_model() {
        let (_dir, store, repo) = fixture();
        let mut s = session(&store, &repo, "1", 101);
        s.alive = false;
        s.model = "aider".to_string();
        store.write(&s).unwrap();

        let snapshot = refresh(&store, &FakeInspector::new(), &AgentCatalog::default());
        assert_eq!(snapshot.rows[0].session.model, "aider");
    }

    #[test]
    fn test_rows_carry_worktree_metadata() {
        let (_dir, store, repo) = fixture();
        let s = session(&store, &repo, "1", 101);
        worktree::write_metadata(&s.working_copy_path, "main", "fix parser").unwrap();

        let snapshot = refresh(
            &store,
            &FakeInspector::new().with_alive(101),
            &AgentCatalog::default(),
        );

        assert_eq!(snapshot.rows[0].branch, "main");
        assert_eq!(snapshot.rows[0].description, "fix parser");
        assert_eq!(snapshot.worktrees.len(), 1);
        assert_eq!(snapshot.worktrees[0].session_ids, vec!["1"]);
    }
}

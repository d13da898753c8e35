use std::path::Path;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::process::{ProcessError, ProcessInspector};
use crate::sessions::{errors::SessionError, store::SessionStore, types::Session};
use crate::worktree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Exited within the grace window after the graceful request.
    Stopped,
    /// Still alive after the grace window and force terminated.
    ForceKilled,
    /// Not running; nothing was signalled.
    AlreadyExited,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedSession {
    pub id: String,
    pub pid: i64,
    pub outcome: StopOutcome,
}

/// Running by both the cached flag and the OS.
pub fn is_running(session: &Session, inspector: &dyn ProcessInspector) -> bool {
    session.alive && inspector.is_alive(session.pid)
}

/// Stop one session: graceful request, grace window, then force if needed.
///
/// Only the session's shell is signalled. Descendants that outlive the
/// shell are not tracked.
pub fn stop_session(
    session: &mut Session,
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
    grace: Duration,
) -> Result<StopOutcome, SessionError> {
    if !is_running(session, inspector) {
        return Ok(StopOutcome::AlreadyExited);
    }

    let pid = session.pid;
    info!(event = "core.session.stop_started", session_id = %session.id, pid = pid);

    let stop_failed = |e: ProcessError| SessionError::StopFailed {
        session_id: session.id.clone(),
        pid,
        message: e.to_string(),
    };

    match inspector.terminate(pid) {
        Ok(()) | Err(ProcessError::NotFound { .. }) => {}
        Err(e) => return Err(stop_failed(e)),
    }

    std::thread::sleep(grace);

    let outcome = if inspector.is_alive(pid) {
        warn!(event = "core.session.stop_force_started", session_id = %session.id, pid = pid);
        match inspector.force_terminate(pid) {
            Ok(()) | Err(ProcessError::NotFound { .. }) => {}
            Err(e) => return Err(stop_failed(e)),
        }
        StopOutcome::ForceKilled
    } else {
        StopOutcome::Stopped
    };

    session.alive = false;
    if let Err(e) = store.write(session) {
        warn!(
            event = "core.session.stop_persist_failed",
            session_id = %session.id,
            error = %e
        );
    }

    info!(
        event = "core.session.stop_completed",
        session_id = %session.id,
        outcome = ?outcome
    );
    Ok(outcome)
}

/// Stop every running session in `sessions`, continuing past failures.
/// Returns the first failure after all sessions were attempted.
fn stop_each(
    sessions: Vec<Session>,
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
    grace: Duration,
) -> Result<Vec<StoppedSession>, SessionError> {
    let mut stopped = Vec::new();
    let mut first_error = None;

    for mut session in sessions {
        if !is_running(&session, inspector) {
            continue;
        }
        match stop_session(&mut session, store, inspector, grace) {
            Ok(outcome) => stopped.push(StoppedSession {
                id: session.id,
                pid: session.pid,
                outcome,
            }),
            Err(e) => {
                error!(event = "core.session.stop_failed", session_id = %session.id, error = %e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(stopped),
    }
}

/// Stop all running sessions on a worktree of `repo_path`.
///
/// Fails with `WorktreeNotFound` when nothing was running and the worktree
/// directory does not exist.
pub fn stop_worktree(
    repo_path: &Path,
    worktree_id: &str,
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
    grace: Duration,
) -> Result<Vec<StoppedSession>, SessionError> {
    let sessions = store
        .list_for_repo(repo_path)
        .into_iter()
        .filter(|s| s.worktree_id() == worktree_id)
        .collect();

    let stopped = stop_each(sessions, store, inspector, grace)?;
    if stopped.is_empty() && !worktree::worktree_path(repo_path, worktree_id).exists() {
        return Err(SessionError::WorktreeNotFound {
            id: worktree_id.to_string(),
        });
    }
    Ok(stopped)
}

/// Stop every running session of a repository.
pub fn stop_all(
    repo_path: &Path,
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
    grace: Duration,
) -> Result<Vec<StoppedSession>, SessionError> {
    stop_each(store.list_for_repo(repo_path), store, inspector, grace)
}

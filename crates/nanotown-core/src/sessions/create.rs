use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{Config, NanotownConfig};
use crate::sessions::{
    errors::SessionError, recorder::SessionRecorder, store::SessionStore, types::Session,
};
use crate::terminal::{LaunchRequest, PtyBridge};
use crate::vcs::{self, VcsBackend, git::validate_git_arg};
use crate::worktree;

pub const SESSION_ENV_VAR: &str = "NT_SESSION";
pub const BRANCH_ENV_VAR: &str = "NT_BRANCH";

#[derive(Debug, Clone)]
pub struct StartRequest {
    pub cwd: PathBuf,
    pub description: String,
    /// Explicit worktree id (`-w`). Generated when `None`.
    pub worktree_id: Option<String>,
}

/// A session whose record and working copy exist but whose shell has not
/// been launched yet.
#[derive(Debug, Clone)]
pub struct PreparedSession {
    pub session: Session,
    pub description: String,
    pub source_branch: String,
    /// The working copy already existed and is being reused.
    pub reused_worktree: bool,
}

/// Worktree ids become directory and branch names.
pub fn validate_worktree_id(id: &str) -> Result<(), SessionError> {
    let invalid = |reason: &str| SessionError::InvalidWorktreeId {
        id: id.to_string(),
        reason: reason.to_string(),
    };
    if id.contains('/') || id.contains('\\') {
        return Err(invalid("must not contain path separators"));
    }
    if id == "." || id == ".." || id.starts_with('.') {
        return Err(invalid("must not start with '.'"));
    }
    validate_git_arg(id, "worktree id").map_err(|e| invalid(&e.to_string()))
}

/// `nt-<n>` for the first `n >= start` whose directory and branch are both free.
fn next_worktree_id(backend: &dyn VcsBackend, repo_path: &Path, start: u64) -> String {
    (start..)
        .map(|n| format!("nt-{n}"))
        .find(|candidate| {
            !worktree::worktree_path(repo_path, candidate).exists()
                && !backend.branch_exists(repo_path, candidate)
        })
        .unwrap_or_else(|| format!("nt-{start}"))
}

pub fn format_banner(id: &str, worktree_id: &str, description: &str) -> String {
    let mut banner = String::from("\n  nanotown session started\n");
    banner.push_str(&format!("  session {id:<6} worktree {worktree_id}\n"));
    if !description.is_empty() {
        banner.push_str(&format!("  {description}\n"));
    }
    banner.push_str("\n  Type exit to end the session.\n\n");
    banner
}

pub fn format_title(worktree_id: &str, description: &str) -> String {
    if description.is_empty() {
        format!("[{worktree_id}]")
    } else {
        format!("[{worktree_id}] {description}")
    }
}

/// Resolve the repository, allocate ids, create or reuse the working copy,
/// write side-car files and the initial session record.
pub fn prepare_session(
    request: &StartRequest,
    store: &SessionStore,
) -> Result<PreparedSession, SessionError> {
    let description = request.description.trim().to_string();
    if description.is_empty() && request.worktree_id.is_none() {
        return Err(SessionError::MissingDescription);
    }
    if let Some(id) = &request.worktree_id {
        validate_worktree_id(id)?;
    }

    info!(event = "core.session.start_started", cwd = %request.cwd.display());

    let (backend, repo_path) = vcs::discover_repo(&request.cwd)?;
    let source_branch = backend.current_branch(&repo_path)?;

    let id = store.next_id();
    let worktree_id = match &request.worktree_id {
        Some(explicit) => explicit.clone(),
        None => {
            let start = id.parse().unwrap_or(1);
            next_worktree_id(backend, &repo_path, start)
        }
    };

    let existing = worktree::worktree_path(&repo_path, &worktree_id);
    let reused_worktree = existing.exists();
    let working_copy = if reused_worktree {
        existing
    } else {
        backend.create_working_copy(&repo_path, &worktree_id)?
    };

    if let Err(e) = worktree::write_metadata(&working_copy, &source_branch, &description) {
        warn!(
            event = "core.session.metadata_write_failed",
            worktree = %worktree_id,
            error = %e
        );
    }

    let session = Session::new(id, repo_path, working_copy, backend.name(), &worktree_id);
    store.write(&session)?;

    info!(
        event = "core.session.prepare_completed",
        session_id = %session.id,
        worktree = %worktree_id,
        reused = reused_worktree
    );

    Ok(PreparedSession {
        session,
        description,
        source_branch,
        reused_worktree,
    })
}

/// Launch the shell for a prepared session and block until it exits.
/// Returns the final record, marked not alive.
pub fn run_session(
    prepared: PreparedSession,
    store: &SessionStore,
    config: &Config,
    settings: &NanotownConfig,
) -> Result<Session, SessionError> {
    let PreparedSession {
        mut session,
        description,
        ..
    } = prepared;
    let worktree_id = session.worktree_id();

    let banner_path = session.working_copy_path.join(worktree::BANNER_FILE);
    let banner_file = match fs::write(
        &banner_path,
        format_banner(&session.id, &worktree_id, &description),
    ) {
        Ok(()) => Some(banner_path),
        Err(e) => {
            warn!(event = "core.session.banner_write_failed", error = %e);
            None
        }
    };

    let request = LaunchRequest {
        working_dir: session.working_copy_path.clone(),
        banner_file,
        title: format_title(&worktree_id, &description),
        env: vec![
            (SESSION_ENV_VAR.to_string(), session.id.clone()),
            (BRANCH_ENV_VAR.to_string(), worktree_id.clone()),
        ],
        shell_program: settings.shell.program.clone(),
        prompt_tag: settings.shell.prompt_tag.clone(),
        startup_dir: Some(config.shell_dir().join(&session.id)),
    };

    let recorder = SessionRecorder::new(session.clone(), store.clone());
    let mut bridge = match PtyBridge::launch(request, recorder) {
        Ok(bridge) => bridge,
        Err(e) => {
            session.alive = false;
            if let Err(write_err) = store.write(&session) {
                warn!(event = "core.session.record_write_failed", error = %write_err);
            }
            let _ = fs::remove_file(session.working_copy_path.join(worktree::BANNER_FILE));
            return Err(e.into());
        }
    };
    let pid = bridge.pid();

    info!(event = "core.session.start_completed", session_id = %session.id, pid = pid);

    let mut finished = match bridge.wait_for() {
        Some(recorder) => recorder.into_session(),
        None => store.get(&session.id).unwrap_or_else(|| {
            session.pid = pid;
            session
        }),
    };

    finished.alive = false;
    if let Err(e) = store.write(&finished) {
        warn!(event = "core.session.exit_persist_failed", session_id = %finished.id, error = %e);
    }

    info!(event = "core.session.exited", session_id = %finished.id, pid = pid);
    Ok(finished)
}

/// Prepare and run a session in one call.
pub fn start_session(
    request: &StartRequest,
    store: &SessionStore,
    config: &Config,
    settings: &NanotownConfig,
) -> Result<Session, SessionError> {
    let prepared = prepare_session(request, store)?;
    run_session(prepared, store, config, settings)
}

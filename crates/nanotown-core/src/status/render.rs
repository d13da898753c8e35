//! Dashboard text. Pure: everything comes from the snapshot and `now`.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::classify::{SessionState, format_time_ago};
use super::refresh::{SessionRow, StatusSnapshot};

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

const STATUS_WIDTH: usize = 12;
const NO_MODEL: &str = "\u{2014}";
const NO_SESSIONS: &str = "(none)";

/// Last two path segments: `/home/me/src/app` becomes `src/app`.
pub fn short_repo_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let parts: Vec<&str> = normalized
        .trim_end_matches('/')
        .split('/')
        .filter(|p| !p.is_empty())
        .collect();
    match parts.as_slice() {
        [] => normalized,
        [only] => (*only).to_string(),
        [.., parent, last] => format!("{parent}/{last}"),
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() { "?" } else { value }
}

fn status_cell(state: SessionState, spinner: &str) -> String {
    match state {
        SessionState::Exited => format!("{DIM}{:<STATUS_WIDTH$}{RESET}", state.label()),
        SessionState::Active => {
            format!("{GREEN}{:<STATUS_WIDTH$}{RESET}", format!("{spinner} {}", state.label()))
        }
        SessionState::Idle { .. } => {
            format!("{YELLOW}{:<STATUS_WIDTH$}{RESET}", format!("{spinner} {}", state.label()))
        }
    }
}

fn session_line(row: &SessionRow, now: DateTime<Utc>, threshold: Duration, spinner: &str) -> String {
    let s = &row.session;
    let model = if s.model.is_empty() { NO_MODEL } else { &s.model };
    let state = SessionState::classify(s, now, threshold);
    format!(
        "{:<16} {:<10} {:<7} {:<10} {} {:<10} {:<10} {:<12} {}",
        short_repo_path(&s.repo_path),
        or_unknown(&row.branch),
        s.id,
        model,
        status_cell(state, spinner),
        s.worktree_id(),
        format_time_ago(s.started_time(), now),
        format_time_ago(s.last_output_time(), now),
        row.description,
    )
}

/// All dashboard lines for one frame. `snapshot` should already be sorted.
pub fn render(
    snapshot: &StatusSnapshot,
    now: DateTime<Utc>,
    threshold: Duration,
    spinner: &str,
) -> Vec<String> {
    let mut lines = vec!["Sessions".to_string()];

    if snapshot.rows.is_empty() {
        lines.push("  No active sessions.".to_string());
    } else {
        lines.push(format!(
            "{:<16} {:<10} {:<7} {:<10} {:<12} {:<10} {:<10} {:<12} {}",
            "REPO", "BRANCH", "SESSION", "MODEL", "STATUS", "WORKTREE", "STARTED", "LAST ACTIVE",
            "DESCRIPTION"
        ));
        lines.extend(
            snapshot
                .rows
                .iter()
                .map(|row| session_line(row, now, threshold, spinner)),
        );
    }

    if !snapshot.worktrees.is_empty() {
        lines.push(String::new());
        lines.push("Worktrees".to_string());
        lines.push(format!(
            "{:<16} {:<10} {:<10} {:<10} {}",
            "REPO", "BRANCH", "WORKTREE", "SESSIONS", "DESCRIPTION"
        ));
        for wt in &snapshot.worktrees {
            let sessions = if wt.session_ids.is_empty() {
                NO_SESSIONS.to_string()
            } else {
                wt.session_ids.join(", ")
            };
            lines.push(format!(
                "{:<16} {:<10} {:<10} {:<10} {}",
                short_repo_path(&wt.repo_path),
                or_unknown(&wt.source_branch),
                wt.id,
                sessions,
                wt.description,
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!("{DIM}Ctrl+C to exit{RESET}"));
    lines
}

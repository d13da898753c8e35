use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Pid recorded before the child process exists.
pub const NO_PID: i64 = -1;

/// Persisted record of one interactive session.
///
/// Every field tolerates being absent on disk: records written by older or
/// concurrent invocations may be partial, and empty values mean "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,

    /// Agent program detected inside the session; empty until detected.
    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub repo_path: PathBuf,

    /// Canonical location of the worktree; its basename is the worktree id.
    #[serde(default)]
    pub working_copy_path: PathBuf,

    #[serde(default)]
    pub vcs_backend_name: String,

    /// Last-known liveness. Only trustworthy after an OS liveness check.
    #[serde(default)]
    pub alive: bool,

    #[serde(default = "default_pid")]
    pub pid: i64,

    #[serde(default)]
    pub started_at: String,

    #[serde(default)]
    pub last_output_at: String,

    #[serde(default)]
    pub last_output_line: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree: Option<String>,
}

fn default_pid() -> i64 {
    NO_PID
}

/// Current time in the on-disk timestamp format (RFC 3339, nanoseconds, UTC).
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a stored timestamp; empty or malformed values are `None`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl Session {
    /// A fresh record for a session whose child process does not exist yet.
    pub fn new(
        id: String,
        repo_path: PathBuf,
        working_copy_path: PathBuf,
        vcs_backend_name: &str,
        worktree: &str,
    ) -> Self {
        let now = now_timestamp();
        Self {
            id,
            model: String::new(),
            repo_path,
            working_copy_path,
            vcs_backend_name: vcs_backend_name.to_string(),
            alive: true,
            pid: NO_PID,
            started_at: now.clone(),
            last_output_at: now,
            last_output_line: String::new(),
            worktree: Some(worktree.to_string()),
        }
    }

    /// Worktree identifier: the working copy's directory name, then the
    /// explicit `worktree` field, then the session id.
    pub fn worktree_id(&self) -> String {
        if let Some(name) = self.working_copy_path.file_name() {
            return name.to_string_lossy().to_string();
        }
        match self.worktree.as_deref() {
            Some(worktree) if !worktree.is_empty() => worktree.to_string(),
            _ => self.id.clone(),
        }
    }

    pub fn started_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.started_at)
    }

    pub fn last_output_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.last_output_at)
    }

    /// Most recent activity: last output, else start time.
    pub fn last_active_time(&self) -> Option<DateTime<Utc>> {
        self.last_output_time().or_else(|| self.started_time())
    }

    pub fn belongs_to_repo(&self, repo_path: &Path) -> bool {
        self.repo_path == repo_path
    }

    /// Numeric value of the id, for ordering and id allocation.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            "3".to_string(),
            PathBuf::from("/repo"),
            PathBuf::from("/repo/.nanotown/nt-3"),
            "git",
            "nt-3",
        )
    }

    #[test]
    fn test_new_session_has_no_pid_and_is_alive() {
        let s = session();
        assert_eq!(s.pid, NO_PID);
        assert!(s.alive);
        assert!(s.model.is_empty());
        assert_eq!(s.started_at, s.last_output_at);
    }

    #[test]
    fn test_worktree_id_prefers_working_copy_basename() {
        let mut s = session();
        s.worktree = Some("stale-name".to_string());
        assert_eq!(s.worktree_id(), "nt-3");
    }

    #[test]
    fn test_worktree_id_fallbacks() {
        let mut s = session();
        s.working_copy_path = PathBuf::new();
        assert_eq!(s.worktree_id(), "nt-3");

        s.worktree = None;
        assert_eq!(s.worktree_id(), "3");

        s.worktree = Some(String::new());
        assert_eq!(s.worktree_id(), "3");
    }

    #[test]
    fn test_serializes_camel_case_fields() {
        let json = serde_json::to_string(&session()).unwrap();
        for field in [
            "\"repoPath\"",
            "\"workingCopyPath\"",
            "\"vcsBackendName\"",
            "\"startedAt\"",
            "\"lastOutputAt\"",
            "\"lastOutputLine\"",
        ] {
            assert!(json.contains(field), "missing {} in {}", field, json);
        }
    }

    #[test]
    fn test_partial_record_deserializes_with_unknown_values() {
        let s: Session = serde_json::from_str(r#"{"id":"9"}"#).unwrap();
        assert_eq!(s.id, "9");
        assert_eq!(s.pid, NO_PID);
        assert!(!s.alive);
        assert!(s.started_time().is_none());
        assert!(s.last_active_time().is_none());
        assert_eq!(s.worktree_id(), "9");
    }

    #[test]
    fn test_timestamp_round_trip_keeps_sub_second_precision() {
        let now = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(now)).unwrap();
        assert_eq!(parsed, now);
        assert!(parse_timestamp("not a time").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_last_active_falls_back_to_start() {
        let mut s = session();
        s.last_output_at = String::new();
        assert_eq!(s.last_active_time(), s.started_time());
    }
}

//! Worktree metadata: the per-repository `.nanotown/` directory and the
//! side-car files kept inside each worktree.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::sessions::types::Session;

/// Directory under the repository root holding managed worktrees.
pub const WORKTREE_DIR: &str = ".nanotown";

/// Branch the worktree was created from. Survives session deletion.
pub const SOURCE_BRANCH_FILE: &str = ".nt-source-branch";

/// Free-text description given at launch.
pub const DESCRIPTION_FILE: &str = ".nt-description";

/// Consumed and deleted by the launched shell.
pub const BANNER_FILE: &str = ".nt-banner";

/// Derived view of one worktree, rebuilt on every status refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeInfo {
    pub id: String,
    pub repo_path: PathBuf,
    pub source_branch: String,
    pub description: String,
    pub session_ids: Vec<String>,
}

pub fn worktree_root(repo_path: &Path) -> PathBuf {
    repo_path.join(WORKTREE_DIR)
}

pub fn worktree_path(repo_path: &Path, worktree_id: &str) -> PathBuf {
    worktree_root(repo_path).join(worktree_id)
}

fn read_side_car(worktree: &Path, name: &str) -> String {
    fs::read_to_string(worktree.join(name))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

pub fn read_source_branch(worktree: &Path) -> String {
    read_side_car(worktree, SOURCE_BRANCH_FILE)
}

pub fn read_description(worktree: &Path) -> String {
    read_side_car(worktree, DESCRIPTION_FILE)
}

/// Record the source branch and, when non-empty, the description.
pub fn write_metadata(
    worktree: &Path,
    source_branch: &str,
    description: &str,
) -> std::io::Result<()> {
    fs::write(worktree.join(SOURCE_BRANCH_FILE), source_branch)?;
    if !description.is_empty() {
        fs::write(worktree.join(DESCRIPTION_FILE), description)?;
    }
    Ok(())
}

/// Names of the worktree directories under a repository, sorted.
pub fn list_worktree_ids(repo_path: &Path) -> Vec<String> {
    let root = worktree_root(repo_path);
    let Ok(entries) = fs::read_dir(&root) else {
        return Vec::new();
    };

    let mut ids: Vec<String> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    ids.sort();
    ids
}

/// Scan the worktree directories of every repository the given sessions
/// reference, attaching the ids of the sessions mapped to each worktree.
pub fn list_worktrees(sessions: &[Session]) -> Vec<WorktreeInfo> {
    let repos: BTreeSet<&Path> = sessions.iter().map(|s| s.repo_path.as_path()).collect();

    let mut worktrees = Vec::new();
    for repo in repos {
        for id in list_worktree_ids(repo) {
            let path = worktree_path(repo, &id);
            let session_ids = sessions
                .iter()
                .filter(|s| s.repo_path == repo && s.worktree_id() == id)
                .map(|s| s.id.clone())
                .collect();

            worktrees.push(WorktreeInfo {
                source_branch: read_source_branch(&path),
                description: read_description(&path),
                repo_path: repo.to_path_buf(),
                id,
                session_ids,
            });
        }
    }

    debug!(
        event = "core.worktree.scan_completed",
        count = worktrees.len()
    );
    worktrees
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, repo: &Path, worktree: &str) -> Session {
        Session::new(
            id.to_string(),
            repo.to_path_buf(),
            worktree_path(repo, worktree),
            "git",
            worktree,
        )
    }

    #[test]
    fn test_metadata_round_trip_trims() {
        let dir = tempfile::tempdir().unwrap();
        write_metadata(dir.path(), "main", "fix the parser").unwrap();
        fs::write(dir.path().join(DESCRIPTION_FILE), "  fix the parser \n").unwrap();

        assert_eq!(read_source_branch(dir.path()), "main");
        assert_eq!(read_description(dir.path()), "fix the parser");
    }

    #[test]
    fn test_empty_description_not_written() {
        let dir = tempfile::tempdir().unwrap();
        write_metadata(dir.path(), "main", "").unwrap();
        assert!(!dir.path().join(DESCRIPTION_FILE).exists());
        assert_eq!(read_description(dir.path()), "");
    }

    #[test]
    fn test_list_worktrees_maps_sessions() {
        let repo = tempfile::tempdir().unwrap();
        fs::create_dir_all(worktree_path(repo.path(), "nt-1")).unwrap();
        fs::create_dir_all(worktree_path(repo.path(), "nt-2")).unwrap();
        fs::write(worktree_root(repo.path()).join("config.toml"), "").unwrap();
        write_metadata(&worktree_path(repo.path(), "nt-1"), "main", "first").unwrap();

        let sessions = vec![
            session("1", repo.path(), "nt-1"),
            session("3", repo.path(), "nt-1"),
        ];
        let worktrees = list_worktrees(&sessions);

        assert_eq!(worktrees.len(), 2);
        assert_eq!(worktrees[0].id, "nt-1");
        assert_eq!(worktrees[0].session_ids, vec!["1", "3"]);
        assert_eq!(worktrees[0].source_branch, "main");
        assert_eq!(worktrees[0].description, "first");
        assert_eq!(worktrees[1].id, "nt-2");
        assert!(worktrees[1].session_ids.is_empty());
    }

    #[test]
    fn test_list_worktrees_without_sessions_is_empty() {
        assert!(list_worktrees(&[]).is_empty());
    }
}

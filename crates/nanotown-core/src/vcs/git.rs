//! Git backend.
//!
//! Read-only queries go through `git2`. Worktree creation, removal and
//! merges shell out to the `git` CLI so hooks, credential helpers and the
//! user's merge configuration apply exactly as they would by hand.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use git2::{BranchType, Repository, StatusOptions};
use tracing::{debug, info, warn};

use super::{VcsBackend, VcsError};
use crate::worktree::{WORKTREE_DIR, worktree_path};

/// Patterns appended to `info/exclude` so managed files never count as changes.
const EXCLUDE_PATTERNS: &[&str] = &["/.nanotown/", ".nt-*"];

#[derive(Debug, Clone, Copy, Default)]
pub struct GitBackend;

/// Reject values git could parse as an option or that carry control characters.
pub fn validate_git_arg(value: &str, label: &'static str) -> Result<(), VcsError> {
    if value.is_empty() {
        return Err(VcsError::InvalidArgument {
            label,
            message: "must not be empty".to_string(),
        });
    }
    if value.starts_with('-') {
        return Err(VcsError::InvalidArgument {
            label,
            message: format!("'{value}' must not start with '-'"),
        });
    }
    if value.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(VcsError::InvalidArgument {
            label,
            message: "contains whitespace or control characters".to_string(),
        });
    }
    Ok(())
}

fn run_git(dir: &Path, args: &[&str]) -> Result<Output, VcsError> {
    debug!(event = "core.git.command_started", args = ?args, path = %dir.display());
    Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .map_err(|source| VcsError::CommandSpawn { source })
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

fn normalize(path: &Path) -> PathBuf {
    let trimmed: PathBuf = path.components().collect();
    trimmed.canonicalize().unwrap_or(trimmed)
}

/// The `.git` directory shared by the main checkout and all linked worktrees.
///
/// A linked worktree's private git dir holds a `commondir` file pointing back
/// at the shared one, usually as the relative path `../..`.
fn common_dir(repo: &Repository) -> PathBuf {
    let git_dir = repo.path();
    if repo.is_worktree()
        && let Ok(content) = fs::read_to_string(git_dir.join("commondir"))
    {
        let target = PathBuf::from(content.trim());
        let joined = if target.is_absolute() {
            target
        } else {
            git_dir.join(target)
        };
        return normalize(&joined);
    }
    normalize(git_dir)
}

/// Append the managed-file patterns to the shared `info/exclude` file.
fn register_excludes(repo_path: &Path) -> Result<(), VcsError> {
    let repo = Repository::open(repo_path)?;
    let info_dir = common_dir(&repo).join("info");
    fs::create_dir_all(&info_dir)?;
    let exclude = info_dir.join("exclude");

    let existing = fs::read_to_string(&exclude).unwrap_or_default();
    let missing: Vec<&str> = EXCLUDE_PATTERNS
        .iter()
        .copied()
        .filter(|pattern| !existing.lines().any(|line| line.trim() == *pattern))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for pattern in &missing {
        content.push_str(pattern);
        content.push('\n');
    }
    fs::write(&exclude, content)?;

    debug!(
        event = "core.git.exclude_registered",
        path = %exclude.display(),
        patterns = ?missing
    );
    Ok(())
}

impl VcsBackend for GitBackend {
    fn name(&self) -> &'static str {
        "git"
    }

    fn detect(&self, path: &Path) -> bool {
        path.ancestors().any(|p| p.join(".git").exists())
    }

    fn repo_root(&self, cwd: &Path) -> Result<PathBuf, VcsError> {
        let repo = Repository::discover(cwd).map_err(|_| VcsError::NotInRepository)?;

        let root = if repo.is_worktree() {
            // The common dir is the main checkout's `.git` directory.
            common_dir(&repo)
                .parent()
                .map(Path::to_path_buf)
                .ok_or(VcsError::NotInRepository)?
        } else {
            repo.workdir()
                .map(Path::to_path_buf)
                .ok_or(VcsError::NotInRepository)?
        };

        Ok(normalize(&root))
    }

    fn current_branch(&self, repo_path: &Path) -> Result<String, VcsError> {
        let repo = Repository::open(repo_path)?;
        let head = repo.head().map_err(|_| VcsError::NoCommits)?;
        if !head.is_branch() {
            return Ok("HEAD".to_string());
        }
        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    }

    fn branch_exists(&self, repo_path: &Path, branch: &str) -> bool {
        Repository::open(repo_path)
            .and_then(|repo| repo.find_branch(branch, BranchType::Local).map(|_| ()))
            .is_ok()
    }

    fn create_working_copy(
        &self,
        repo_path: &Path,
        worktree_id: &str,
    ) -> Result<PathBuf, VcsError> {
        validate_git_arg(worktree_id, "worktree id")?;
        let path = worktree_path(repo_path, worktree_id);
        if path.exists() {
            debug!(event = "core.git.worktree_reused", worktree = worktree_id);
            return Ok(path);
        }

        info!(
            event = "core.git.worktree_create_started",
            worktree = worktree_id,
            path = %path.display()
        );

        fs::create_dir_all(repo_path.join(WORKTREE_DIR))?;
        register_excludes(repo_path)?;

        let target = path.to_string_lossy().to_string();
        let output = run_git(repo_path, &["worktree", "add", &target, "-b", worktree_id])?;
        if !output.status.success() {
            // Branch already exists: check it out instead of creating it.
            let retry = run_git(repo_path, &["worktree", "add", &target, worktree_id])?;
            if !retry.status.success() {
                return Err(VcsError::WorktreeCreateFailed {
                    id: worktree_id.to_string(),
                    message: stderr_text(&retry),
                });
            }
        }

        info!(event = "core.git.worktree_create_completed", worktree = worktree_id);
        Ok(path)
    }

    fn merge(&self, repo_path: &Path, target_branch: &str, branch: &str) -> Result<(), VcsError> {
        validate_git_arg(target_branch, "target branch")?;
        validate_git_arg(branch, "branch")?;

        info!(
            event = "core.git.merge_started",
            target = target_branch,
            branch = branch
        );

        let checkout = run_git(repo_path, &["checkout", target_branch])?;
        if !checkout.status.success() {
            return Err(VcsError::MergeFailed {
                branch: branch.to_string(),
                message: stderr_text(&checkout),
            });
        }

        let merge = run_git(repo_path, &["merge", "--no-edit", branch])?;
        if !merge.status.success() {
            let stdout = String::from_utf8_lossy(&merge.stdout).trim().to_string();
            let stderr = stderr_text(&merge);
            warn!(
                event = "core.git.merge_failed",
                branch = branch,
                stderr = %stderr
            );
            return Err(VcsError::MergeFailed {
                branch: branch.to_string(),
                message: if stderr.is_empty() { stdout } else { stderr },
            });
        }

        info!(event = "core.git.merge_completed", branch = branch);
        Ok(())
    }

    fn remove_working_copy(
        &self,
        repo_path: &Path,
        worktree_id: &str,
        force: bool,
    ) -> Result<(), VcsError> {
        validate_git_arg(worktree_id, "worktree id")?;
        let path = worktree_path(repo_path, worktree_id);

        info!(
            event = "core.git.worktree_remove_started",
            worktree = worktree_id,
            force = force
        );

        let target = path.to_string_lossy().to_string();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(&target);
        let output = run_git(repo_path, &args)?;
        if !output.status.success() {
            return Err(VcsError::WorktreeRemovalFailed {
                id: worktree_id.to_string(),
                message: stderr_text(&output),
            });
        }

        // An unmerged branch is kept; `-d` refuses to lose commits.
        let branch = run_git(repo_path, &["branch", "-d", worktree_id])?;
        if !branch.status.success() {
            warn!(
                event = "core.git.branch_delete_skipped",
                branch = worktree_id,
                stderr = %stderr_text(&branch)
            );
        }

        info!(event = "core.git.worktree_remove_completed", worktree = worktree_id);
        Ok(())
    }

    fn uncommitted_changes(&self, path: &Path) -> Result<Vec<String>, VcsError> {
        let repo = Repository::open(path)?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(true);
        opts.include_ignored(false);

        let statuses = repo.statuses(Some(&mut opts))?;
        Ok(statuses
            .iter()
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect())
    }

    fn commits_ahead(&self, repo_path: &Path, base: &str, branch: &str) -> Result<usize, VcsError> {
        let repo = Repository::open(repo_path)?;
        let resolve = |name: &str| {
            repo.find_branch(name, BranchType::Local)
                .ok()
                .and_then(|b| b.get().target())
                .ok_or_else(|| VcsError::BranchNotFound {
                    branch: name.to_string(),
                })
        };
        let branch_oid = resolve(branch)?;
        let base_oid = resolve(base)?;

        let mut walk = repo.revwalk()?;
        walk.push(branch_oid)?;
        walk.hide(base_oid)?;
        Ok(walk.count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .expect("git should run");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn init_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        git(dir.path(), &["init"]);
        git(dir.path(), &["config", "user.email", "test@test.com"]);
        git(dir.path(), &["config", "user.name", "Test"]);
        fs::write(dir.path().join("README.md"), "hello\n").unwrap();
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "-m", "initial"]);
        dir
    }

    #[test]
    fn test_validate_git_arg() {
        assert!(validate_git_arg("nt-1", "worktree id").is_ok());
        assert!(validate_git_arg("feature/x", "branch").is_ok());
        assert!(validate_git_arg("-rf", "branch").is_err());
        assert!(validate_git_arg("a b", "branch").is_err());
        assert!(validate_git_arg("", "branch").is_err());
    }

    #[test]
    fn test_current_branch_without_commits() {
        let dir = TempDir::new().unwrap();
        git(dir.path(), &["init"]);
        let err = GitBackend.current_branch(dir.path()).unwrap_err();
        assert!(matches!(err, VcsError::NoCommits));
    }

    #[test]
    fn test_create_working_copy_and_repo_root_from_inside() {
        let repo = init_repo();
        let backend = GitBackend;
        let root = backend.repo_root(repo.path()).unwrap();

        let wt = backend.create_working_copy(&root, "nt-1").unwrap();
        assert!(wt.join("README.md").exists());
        assert!(backend.branch_exists(&root, "nt-1"));

        // Resolving from inside the worktree yields the main checkout.
        assert_eq!(backend.repo_root(&wt).unwrap(), root);

        // Reuse is idempotent.
        assert_eq!(backend.create_working_copy(&root, "nt-1").unwrap(), wt);
    }

    #[test]
    fn test_excludes_from_inside_worktree_land_in_shared_git_dir() {
        let repo = init_repo();
        let backend = GitBackend;
        let root = backend.repo_root(repo.path()).unwrap();
        let wt = backend.create_working_copy(&root, "nt-1").unwrap();

        let shared = root.join(".git").join("info").join("exclude");
        fs::remove_file(&shared).unwrap();

        register_excludes(&wt).unwrap();
        let content = fs::read_to_string(&shared).unwrap();
        for pattern in EXCLUDE_PATTERNS {
            assert!(content.lines().any(|line| line == *pattern));
        }
        assert!(
            !root
                .join(".git")
                .join("worktrees")
                .join("nt-1")
                .join("info")
                .exists()
        );
    }

    #[test]
    fn test_common_dir_of_main_checkout_is_dot_git() {
        let repo = init_repo();
        let opened = Repository::open(repo.path()).unwrap();
        assert_eq!(common_dir(&opened), normalize(&repo.path().join(".git")));
    }

    #[test]
    fn test_side_car_files_do_not_dirty_worktrees() {
        let repo = init_repo();
        let backend = GitBackend;
        let root = backend.repo_root(repo.path()).unwrap();
        let wt = backend.create_working_copy(&root, "nt-1").unwrap();

        fs::write(wt.join(".nt-description"), "desc").unwrap();
        fs::write(wt.join(".nt-source-branch"), "main").unwrap();

        assert!(backend.uncommitted_changes(&wt).unwrap().is_empty());
        assert!(backend.uncommitted_changes(&root).unwrap().is_empty());

        fs::write(wt.join("new.txt"), "x").unwrap();
        assert_eq!(backend.uncommitted_changes(&wt).unwrap(), vec!["new.txt"]);
    }

    #[test]
    fn test_commits_ahead_and_merge() {
        let repo = init_repo();
        let backend = GitBackend;
        let root = backend.repo_root(repo.path()).unwrap();
        let base = backend.current_branch(&root).unwrap();
        let wt = backend.create_working_copy(&root, "nt-1").unwrap();

        assert_eq!(backend.commits_ahead(&root, &base, "nt-1").unwrap(), 0);

        fs::write(wt.join("feature.txt"), "feature\n").unwrap();
        git(&wt, &["add", "feature.txt"]);
        git(&wt, &["commit", "-m", "feature"]);
        assert_eq!(backend.commits_ahead(&root, &base, "nt-1").unwrap(), 1);

        backend.merge(&root, &base, "nt-1").unwrap();
        assert!(root.join("feature.txt").exists());

        backend.remove_working_copy(&root, "nt-1", false).unwrap();
        assert!(!wt.exists());
        assert!(!backend.branch_exists(&root, "nt-1"));
    }

    #[test]
    fn test_commits_ahead_missing_branch() {
        let repo = init_repo();
        let backend = GitBackend;
        let base = backend.current_branch(repo.path()).unwrap();
        let err = backend
            .commits_ahead(repo.path(), &base, "does-not-exist")
            .unwrap_err();
        assert!(matches!(err, VcsError::BranchNotFound { .. }));
    }
}

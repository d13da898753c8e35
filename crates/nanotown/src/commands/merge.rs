use clap::ArgMatches;
use tracing::{error, info};

use nanotown_core::events;
use nanotown_core::session_ops::{self, MergePlan};
use nanotown_core::sessions::SessionError;
use nanotown_core::vcs::VcsError;

use super::helpers::{CommandContext, confirm};

/// Walk the user through the plan's warnings. `false` means stop here.
fn confirm_plan(plan: &MergePlan) -> std::io::Result<bool> {
    if plan.branch_mismatch() {
        println!(
            "Warning: worktree {} was created from branch {:?}, but current branch is {:?}.",
            plan.worktree_id, plan.source_branch, plan.current_branch
        );
        if !confirm("Merge into current branch anyway?")? {
            return Ok(false);
        }
    }

    if plan.has_uncommitted() {
        println!(
            "Warning: worktree {} has uncommitted changes:\n{}",
            plan.worktree_id,
            plan.uncommitted.join("\n")
        );
        if !confirm("Merge anyway? Uncommitted changes will be lost.")? {
            return Ok(false);
        }
    }

    if plan.nothing_to_merge() {
        println!(
            "Nothing to merge: {} has no new commits vs {}.",
            plan.worktree_id, plan.current_branch
        );
        return Ok(false);
    }

    Ok(true)
}

pub(crate) fn handle_merge_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let worktree_id = matches
        .get_one::<String>("worktree-id")
        .ok_or("Worktree id is required. Usage: nt merge <worktree-id>")?;

    let ctx = CommandContext::load()?;
    let cwd = std::env::current_dir()?;

    info!(event = "cli.merge_started", worktree = %worktree_id);

    let plan = session_ops::merge_preflight(&cwd, worktree_id, &ctx.store, &ctx.inspector)
        .inspect_err(|e| {
            error!(event = "cli.merge_failed", worktree = %worktree_id, error = %e);
            events::log_app_error(e);
        })?;

    if !confirm_plan(&plan)? {
        info!(event = "cli.merge_declined", worktree = %worktree_id);
        return Ok(());
    }

    match session_ops::merge_worktree(&plan, &ctx.store) {
        Ok(deleted) => {
            println!(
                "Merged worktree {worktree_id} into {} and cleaned up.",
                plan.current_branch
            );
            info!(event = "cli.merge_completed", worktree = %worktree_id, sessions = deleted);
            Ok(())
        }
        Err(e) => {
            if matches!(
                &e,
                SessionError::VcsError {
                    source: VcsError::MergeFailed { .. }
                }
            ) {
                eprintln!(
                    "Merge conflict. Resolve conflicts in the repo, then run: nt merge {worktree_id} again"
                );
            }
            error!(event = "cli.merge_failed", worktree = %worktree_id, error = %e);
            events::log_app_error(&e);
            Err(e.into())
        }
    }
}

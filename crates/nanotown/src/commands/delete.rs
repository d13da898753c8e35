use clap::ArgMatches;
use tracing::{error, info, warn};

use nanotown_core::events;
use nanotown_core::session_ops;

use super::helpers::{CommandContext, confirm, current_repo};

pub(crate) fn handle_delete_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let worktree_id = matches
        .get_one::<String>("worktree-id")
        .ok_or("Worktree id is required. Usage: nt delete <worktree-id>")?;

    let ctx = CommandContext::load()?;
    let (backend, repo_path) = current_repo()?;

    info!(event = "cli.delete_started", worktree = %worktree_id);

    let deleted = session_ops::delete_worktree(
        backend,
        &repo_path,
        worktree_id,
        &ctx.store,
        &ctx.inspector,
        ctx.settings.stop.grace(),
    )
    .inspect_err(|e| {
        error!(event = "cli.delete_failed", worktree = %worktree_id, error = %e);
        events::log_app_error(e);
    })?;

    println!("Worktree {worktree_id} deleted.");
    info!(event = "cli.delete_completed", worktree = %worktree_id, sessions = deleted);
    Ok(())
}

pub(crate) fn handle_deleteall_command() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = CommandContext::load()?;
    let (backend, repo_path) = current_repo()?;

    let summary = session_ops::delete_all_summary(&repo_path, &ctx.store, &ctx.inspector);
    if summary.total == 0 {
        println!("No sessions to clean.");
        return Ok(());
    }

    println!(
        "This will delete {} session(s) and their worktrees.",
        summary.total
    );
    if summary.running > 0 {
        println!(
            "  {} running session(s) will be stopped.",
            summary.running
        );
    }
    if !confirm("Continue?")? {
        info!(event = "cli.deleteall_declined");
        return Ok(());
    }

    info!(
        event = "cli.deleteall_started",
        sessions = summary.total,
        running = summary.running
    );

    let report = session_ops::delete_all(
        backend,
        &repo_path,
        &ctx.store,
        &ctx.inspector,
        ctx.settings.stop.grace(),
    );

    for (worktree, reason) in &report.failures {
        warn!(event = "cli.deleteall_worktree_failed", worktree = %worktree, error = %reason);
        eprintln!("Could not remove worktree {worktree}: {reason}");
    }
    println!("Cleaned {} session(s)/worktree(s).", report.cleaned());

    info!(
        event = "cli.deleteall_completed",
        sessions = report.sessions_deleted,
        worktrees = report.worktrees_removed,
        failures = report.failures.len()
    );
    Ok(())
}

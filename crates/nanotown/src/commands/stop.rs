use clap::ArgMatches;
use tracing::{error, info};

use nanotown_core::events;
use nanotown_core::session_ops::{self, StopOutcome, StoppedSession};

use super::helpers::{CommandContext, current_repo};

fn print_stopped(stopped: &[StoppedSession]) {
    for s in stopped {
        match s.outcome {
            StopOutcome::ForceKilled => {
                println!("Stopped session {} (pid {}), force killed.", s.id, s.pid)
            }
            _ => println!("Stopped session {} (pid {}).", s.id, s.pid),
        }
    }
}

pub(crate) fn handle_stop_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let worktree_id = matches
        .get_one::<String>("worktree-id")
        .ok_or("Worktree id is required. Usage: nt stop <worktree-id>")?;

    let ctx = CommandContext::load()?;
    let (_, repo_path) = current_repo()?;

    info!(event = "cli.stop_started", worktree = %worktree_id);

    let stopped = session_ops::stop_worktree(
        &repo_path,
        worktree_id,
        &ctx.store,
        &ctx.inspector,
        ctx.settings.stop.grace(),
    )
    .inspect_err(|e| {
        error!(event = "cli.stop_failed", worktree = %worktree_id, error = %e);
        events::log_app_error(e);
    })?;

    if stopped.is_empty() {
        eprintln!("No running sessions on worktree {worktree_id}.");
    } else {
        print_stopped(&stopped);
        println!(
            "Stopped {} session(s) on worktree {worktree_id}.",
            stopped.len()
        );
    }

    info!(event = "cli.stop_completed", worktree = %worktree_id, stopped = stopped.len());
    Ok(())
}

pub(crate) fn handle_stopall_command() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = CommandContext::load()?;
    let (_, repo_path) = current_repo()?;

    info!(event = "cli.stopall_started", repo = %repo_path.display());

    let stopped = session_ops::stop_all(
        &repo_path,
        &ctx.store,
        &ctx.inspector,
        ctx.settings.stop.grace(),
    )
    .inspect_err(|e| {
        error!(event = "cli.stopall_failed", error = %e);
        events::log_app_error(e);
    })?;

    print_stopped(&stopped);
    println!("Stopped {} session(s).", stopped.len());

    info!(event = "cli.stopall_completed", stopped = stopped.len());
    Ok(())
}

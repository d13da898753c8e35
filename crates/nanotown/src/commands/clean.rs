use tracing::{error, info};

use nanotown_core::events;
use nanotown_core::session_ops::{self, CleanEvent};

use super::helpers::{CommandContext, current_repo};

pub(crate) fn handle_clean_command() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = CommandContext::load()?;
    // Outside a repository only repos referenced by sessions are scanned.
    let cwd_repo = current_repo().ok().map(|(_, repo)| repo);

    info!(event = "cli.clean_started", repo = ?cwd_repo);

    let report = session_ops::auto_clean(cwd_repo.as_deref(), &ctx.store, &ctx.inspector)
        .inspect_err(|e| {
            error!(event = "cli.clean_failed", error = %e);
            events::log_app_error(e);
        })?;

    for event in &report.events {
        match event {
            CleanEvent::SessionCleaned { id } => println!("Cleaned session {id}"),
            CleanEvent::SessionSkipped { id } => {
                println!("Skipping session {id}: worktree has uncommitted changes")
            }
            CleanEvent::OrphanCleaned { worktree } => {
                println!("Cleaned orphaned worktree {worktree}")
            }
            CleanEvent::OrphanSkipped { worktree } => {
                println!("Skipping orphaned worktree {worktree}: has uncommitted changes")
            }
        }
    }

    if report.is_empty() {
        println!("Nothing to clean.");
    } else {
        println!(
            "Cleaned {} session(s)/worktree(s), skipped {} with uncommitted changes.",
            report.cleaned(),
            report.skipped()
        );
    }

    info!(
        event = "cli.clean_completed",
        cleaned = report.cleaned(),
        skipped = report.skipped()
    );
    Ok(())
}

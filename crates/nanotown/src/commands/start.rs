use clap::ArgMatches;
use tracing::{error, info};

use nanotown_core::events;
use nanotown_core::session_ops::{self, StartRequest};

use super::helpers::CommandContext;

pub(crate) fn handle_start_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let description = matches
        .get_many::<String>("description")
        .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    let worktree_id = matches.get_one::<String>("worktree").cloned();

    let ctx = CommandContext::load()?;
    let request = StartRequest {
        cwd: std::env::current_dir()?,
        description,
        worktree_id,
    };

    info!(event = "cli.start_started", worktree = ?request.worktree_id);

    let prepared = session_ops::prepare_session(&request, &ctx.store).inspect_err(|e| {
        error!(event = "cli.start_failed", error = %e);
        events::log_app_error(e);
    })?;

    if prepared.reused_worktree {
        println!("Reusing existing worktree: {}", prepared.session.worktree_id());
    }

    let session = session_ops::run_session(prepared, &ctx.store, &ctx.config, &ctx.settings)
        .inspect_err(|e| {
            error!(event = "cli.start_failed", error = %e);
            events::log_app_error(e);
        })?;

    println!("Session {} exited.", session.id);
    info!(event = "cli.start_completed", session_id = %session.id);
    Ok(())
}

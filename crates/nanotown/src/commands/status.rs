use tracing::info;

use nanotown_core::AgentCatalog;
use nanotown_core::status::run_live_status;

use super::helpers::CommandContext;

pub(crate) fn handle_status_command() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = CommandContext::load()?;
    let catalog = AgentCatalog::with_extra(&ctx.settings.agents.extra);

    info!(event = "cli.status_started", agents = catalog.names().len());
    run_live_status(&ctx.store, &ctx.inspector, &catalog, &ctx.settings.status)?;
    info!(event = "cli.status_completed");
    Ok(())
}

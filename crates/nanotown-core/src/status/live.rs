use std::io::{self, Write};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::agents::AgentCatalog;
use crate::config::types::StatusConfig;
use crate::process::ProcessInspector;
use crate::sessions::store::SessionStore;
use crate::status::errors::StatusError;
use crate::status::frame::{CursorGuard, FrameWriter};
use crate::status::refresh::refresh;
use crate::status::render::render;
use crate::status::spinner::Spinner;

/// Ctrl+C listener that is armed as soon as it is created, so an interrupt
/// that arrives before the first poll is still delivered to `recv`.
struct Interrupt {
    #[cfg(unix)]
    inner: tokio::signal::unix::Signal,
    #[cfg(windows)]
    inner: tokio::signal::windows::CtrlC,
}

impl Interrupt {
    fn register() -> io::Result<Self> {
        #[cfg(unix)]
        let inner = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;
        #[cfg(windows)]
        let inner = tokio::signal::windows::ctrl_c()?;
        Ok(Self { inner })
    }

    async fn recv(&mut self) {
        self.inner.recv().await;
    }
}

/// Live dashboard until Ctrl+C.
///
/// Every tick redraws from the cached snapshot so durations and spinners
/// keep moving. Every `refresh_every_ticks` ticks the snapshot is rebuilt
/// from the store, the process table and the worktree directories.
pub fn run_live_status(
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
    catalog: &AgentCatalog,
    config: &StatusConfig,
) -> Result<(), StatusError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| StatusError::Runtime { source })?;

    info!(event = "core.status.live_started", tick_ms = config.tick_ms);
    runtime.block_on(live_loop(store, inspector, catalog, config))?;
    info!(event = "core.status.live_completed");
    Ok(())
}

async fn live_loop(
    store: &SessionStore,
    inspector: &dyn ProcessInspector,
    catalog: &AgentCatalog,
    config: &StatusConfig,
) -> Result<(), StatusError> {
    let tick = Duration::from_millis(config.tick_ms.max(1));
    let refresh_every = config.refresh_every_ticks.max(1);
    let threshold = Duration::from_secs(config.active_threshold_secs);
    let spinner = Spinner::new(config.spinner_interval_ms);

    // Armed before the cursor is hidden; the guard must always get to run.
    let mut interrupt = Interrupt::register().map_err(|source| StatusError::Runtime { source })?;

    let _cursor = CursorGuard::hide(io::stdout())?;
    let mut frames = FrameWriter::new(io::stdout());

    let mut snapshot = refresh(store, inspector, catalog);
    let mut ticks: u64 = 0;

    loop {
        if ticks > 0 && ticks % refresh_every == 0 {
            snapshot = refresh(store, inspector, catalog);
            debug!(event = "core.status.refreshed", sessions = snapshot.rows.len());
        }

        let now = Utc::now();
        snapshot.sort(now, threshold);
        let lines = render(&snapshot, now, threshold, spinner.frame_at(now.timestamp_millis()));
        frames.draw(&lines)?;

        tokio::select! {
            _ = interrupt.recv() => break,
            _ = tokio::time::sleep(tick) => {}
        }
        ticks = ticks.wrapping_add(1);
    }

    frames.get_mut().write_all(b"\n")?;
    frames.get_mut().flush()?;
    Ok(())
}

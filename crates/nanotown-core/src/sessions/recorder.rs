//! Persists output observed by the terminal bridge into the session record.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::sessions::store::SessionStore;
use crate::sessions::types::{Session, format_timestamp};
use crate::terminal::OutputSink;

/// Output sink owning the running session's record.
///
/// It writes the pid and output fields. `model` is owned by the status
/// refresh; it is picked up from disk on spawn and then at most once per
/// [`MODEL_SYNC_INTERVAL`] so output writes stay off the read path.
#[derive(Debug)]
pub struct SessionRecorder {
    session: Session,
    store: SessionStore,
    last_model_sync: Option<Instant>,
}

/// How often output writes re-read the record for a detected model.
pub const MODEL_SYNC_INTERVAL: Duration = Duration::from_secs(1);

impl SessionRecorder {
    pub fn new(session: Session, store: SessionStore) -> Self {
        Self {
            session,
            store,
            last_model_sync: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    fn sync_model(&mut self, force: bool) {
        let due = force
            || self
                .last_model_sync
                .is_none_or(|at| at.elapsed() >= MODEL_SYNC_INTERVAL);
        if !due {
            return;
        }
        self.last_model_sync = Some(Instant::now());
        if let Some(on_disk) = self.store.get(&self.session.id)
            && !on_disk.model.is_empty()
        {
            self.session.model = on_disk.model;
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.write(&self.session) {
            warn!(
                event = "core.session.record_write_failed",
                session_id = %self.session.id,
                error = %e
            );
        }
    }
}

impl OutputSink for SessionRecorder {
    fn on_spawn(&mut self, pid: i64) {
        self.session.pid = pid;
        self.sync_model(true);
        self.persist();
    }

    fn on_output(&mut self, at: DateTime<Utc>, line: Option<String>) {
        self.session.last_output_at = format_timestamp(at);
        if let Some(line) = line {
            self.session.last_output_line = line;
        }
        self.sync_model(false);
        self.persist();
    }
}

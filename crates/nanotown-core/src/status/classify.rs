use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::sessions::types::Session;

/// Display classification of a session, recomputed every frame from the
/// last refreshed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Idle { secs: u64 },
    Exited,
}

impl SessionState {
    /// `alive` must already be reconciled against the OS.
    pub fn classify(session: &Session, now: DateTime<Utc>, threshold: Duration) -> Self {
        if !session.alive {
            return SessionState::Exited;
        }
        let Some(last_output) = session.last_output_time() else {
            return SessionState::Active;
        };
        let silent = seconds_since(last_output, now);
        if silent < threshold.as_secs() {
            SessionState::Active
        } else {
            SessionState::Idle { secs: silent }
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            SessionState::Active => 0,
            SessionState::Idle { .. } => 1,
            SessionState::Exited => 2,
        }
    }

    pub fn label(self) -> String {
        match self {
            SessionState::Active => "active".to_string(),
            SessionState::Idle { secs } => format!("idle {}", format_duration(secs)),
            SessionState::Exited => "exited".to_string(),
        }
    }
}

fn seconds_since(then: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - then).num_seconds().max(0) as u64
}

/// `42s`, `5m`, `3h`.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h", secs / 3600)
    }
}

/// `5m ago`, or `?` when the time is unknown.
pub fn format_time_ago(then: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match then {
        Some(then) => format!("{} ago", format_duration(seconds_since(then, now))),
        None => "?".to_string(),
    }
}

/// Stable sort: state rank, then most recent activity first.
pub fn sort_by_state<T>(
    items: &mut [T],
    session_of: impl Fn(&T) -> &Session,
    now: DateTime<Utc>,
    threshold: Duration,
) {
    items.sort_by(|a, b| {
        let (a, b) = (session_of(a), session_of(b));
        let rank_a = SessionState::classify(a, now, threshold).rank();
        let rank_b = SessionState::classify(b, now, threshold).rank();
        rank_a
            .cmp(&rank_b)
            .then_with(|| b.last_active_time().cmp(&a.last_active_time()))
    });
}

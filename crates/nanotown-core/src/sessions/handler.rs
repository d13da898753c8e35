//! Re-export facade for session operations.
//!
//! Operations live in focused modules; this keeps the `session_ops::*`
//! surface the CLI calls in one place.

pub use super::clean::{CleanEvent, CleanReport, auto_clean};
pub use super::create::{
    PreparedSession, StartRequest, prepare_session, run_session, start_session,
};
pub use super::destroy::{
    DeleteAllReport, DeleteAllSummary, delete_all, delete_all_summary, delete_worktree,
};
pub use super::merge::{MergePlan, merge_preflight, merge_worktree};
pub use super::stop::{
    StopOutcome, StoppedSession, is_running, stop_all, stop_session, stop_worktree,
};

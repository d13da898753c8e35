//! Process-level events shared by every `nt` command.

use tracing::{error, info, warn};

use crate::errors::NanotownError;

pub fn log_command_started(command: &str) {
    info!(
        event = "core.app.command_started",
        command = command,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION")
    );
}

pub fn log_command_finished(command: &str, succeeded: bool) {
    info!(
        event = "core.app.command_finished",
        command = command,
        succeeded = succeeded
    );
}

/// User errors (bad ids, dirty worktrees) are warnings; the rest are errors.
pub fn log_app_error(err: &dyn NanotownError) {
    if err.is_user_error() {
        warn!(
            event = "core.app.user_error",
            code = err.error_code(),
            error = %err
        );
    } else {
        error!(
            event = "core.app.error_occurred",
            code = err.error_code(),
            error = %err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::errors::SessionError;

    #[test]
    fn test_command_events() {
        log_command_started("clean");
        log_command_finished("clean", true);

        log_app_error(&SessionError::MissingDescription);
        log_app_error(&SessionError::WorktreeNotFound {
            id: "nt-4".to_string(),
        });
    }
}

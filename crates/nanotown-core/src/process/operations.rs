//! Liveness probes and termination signals.
//!
//! POSIX uses signals through `nix`; elsewhere the `sysinfo` process
//! handle is used, where graceful and forced termination are the same call.

use tracing::info;

use crate::process::errors::ProcessError;

/// Check whether `pid` refers to a running process.
///
/// Non-positive pids are never alive.
pub fn is_alive(pid: i64) -> bool {
    if pid <= 0 {
        return false;
    }
    platform::is_alive(pid)
}

/// Ask the process to exit (SIGTERM on POSIX).
pub fn terminate(pid: i64) -> Result<(), ProcessError> {
    if pid <= 0 {
        return Err(ProcessError::InvalidPid { pid });
    }
    info!(event = "core.process.terminate_started", pid = pid);
    platform::terminate(pid)?;
    info!(event = "core.process.terminate_completed", pid = pid);
    Ok(())
}

/// Kill the process unconditionally (SIGKILL on POSIX).
pub fn force_terminate(pid: i64) -> Result<(), ProcessError> {
    if pid <= 0 {
        return Err(ProcessError::InvalidPid { pid });
    }
    info!(event = "core.process.force_terminate_started", pid = pid);
    platform::force_terminate(pid)?;
    info!(event = "core.process.force_terminate_completed", pid = pid);
    Ok(())
}

#[cfg(unix)]
mod platform {
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    use tracing::debug;
    use crate::process::errors::ProcessError;

    fn to_nix_pid(pid: i64) -> Result<Pid, ProcessError> {
        i32::try_from(pid)
            .map(Pid::from_raw)
            .map_err(|_| ProcessError::InvalidPid { pid })
    }

    pub fn is_alive(pid: i64) -> bool {
        let Ok(nix_pid) = to_nix_pid(pid) else {
            return false;
        };
        match signal::kill(nix_pid, None) {
            Ok(()) => true,
            // Exists but belongs to another user.
            Err(Errno::EPERM) => true,
            Err(e) => {
                debug!(event = "core.process.liveness_probe_negative", pid = pid, errno = %e);
                false
            }
        }
    }

    fn send(pid: i64, sig: Signal) -> Result<(), ProcessError> {
        match signal::kill(to_nix_pid(pid)?, sig) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(ProcessError::NotFound { pid }),
            Err(e) => Err(ProcessError::SignalFailed {
                pid,
                message: e.to_string(),
            }),
        }
    }

    pub fn terminate(pid: i64) -> Result<(), ProcessError> {
        send(pid, Signal::SIGTERM)
    }

    pub fn force_terminate(pid: i64) -> Result<(), ProcessError> {
        send(pid, Signal::SIGKILL)
    }
}

#[cfg(not(unix))]
mod platform {
    use sysinfo::{Pid, ProcessesToUpdate, System};

    use tracing::debug;
    use crate::process::errors::ProcessError;

    fn to_sysinfo_pid(pid: i64) -> Result<Pid, ProcessError> {
        u32::try_from(pid)
            .map(Pid::from_u32)
            .map_err(|_| ProcessError::InvalidPid { pid })
    }

    pub fn is_alive(pid: i64) -> bool {
        let Ok(sys_pid) = to_sysinfo_pid(pid) else {
            return false;
        };
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);
        let alive = system.process(sys_pid).is_some();
        debug!(event = "core.process.liveness_probed", pid = pid, alive = alive);
        alive
    }

    pub fn terminate(pid: i64) -> Result<(), ProcessError> {
        let sys_pid = to_sysinfo_pid(pid)?;
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[sys_pid]), true);
        match system.process(sys_pid) {
            Some(process) if process.kill() => Ok(()),
            Some(_) => Err(ProcessError::SignalFailed {
                pid,
                message: "Process kill failed".to_string(),
            }),
            None => Err(ProcessError::NotFound { pid }),
        }
    }

    // No graceful/forced distinction on this platform.
    pub fn force_terminate(pid: i64) -> Result<(), ProcessError> {
        terminate(pid)
    }
}

//! Local terminal control: raw input mode and size.

use super::errors::BridgeError;

const DEFAULT_COLS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;

/// Restores the saved terminal mode on drop.
#[cfg(unix)]
pub struct RawModeGuard {
    original: nix::sys::termios::Termios,
}

#[cfg(unix)]
pub fn enable_raw_mode() -> Result<RawModeGuard, BridgeError> {
    use nix::sys::termios;
    use std::os::fd::BorrowedFd;

    // SAFETY: fd 0 stays open for the life of the process.
    let stdin_fd = unsafe { BorrowedFd::borrow_raw(0) };
    let original =
        termios::tcgetattr(stdin_fd).map_err(|e| BridgeError::RawModeUnavailable {
            message: format!("tcgetattr failed: {e}"),
        })?;

    // ISIG stays off: Ctrl+C belongs to the session, not to nt.
    let mut raw = original.clone();
    termios::cfmakeraw(&mut raw);
    termios::tcsetattr(stdin_fd, termios::SetArg::TCSANOW, &raw).map_err(|e| {
        BridgeError::RawModeUnavailable {
            message: format!("tcsetattr failed: {e}"),
        }
    })?;

    Ok(RawModeGuard { original })
}

#[cfg(unix)]
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        use nix::sys::termios;
        use std::os::fd::BorrowedFd;

        // SAFETY: fd 0 stays open for the life of the process.
        let stdin_fd = unsafe { BorrowedFd::borrow_raw(0) };
        let _ = termios::tcsetattr(stdin_fd, termios::SetArg::TCSANOW, &self.original);
    }
}

/// (cols, rows) of the invoking terminal, 80x24 when unknown.
#[cfg(unix)]
pub fn terminal_size() -> (u16, u16) {
    use nix::libc;
    // SAFETY: TIOCGWINSZ only writes into the zeroed winsize.
    unsafe {
        let mut winsize: libc::winsize = std::mem::zeroed();
        if libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut winsize) == 0
            && winsize.ws_col > 0
            && winsize.ws_row > 0
        {
            (winsize.ws_col, winsize.ws_row)
        } else {
            (DEFAULT_COLS, DEFAULT_ROWS)
        }
    }
}

#[cfg(not(unix))]
pub struct RawModeGuard;

#[cfg(not(unix))]
pub fn enable_raw_mode() -> Result<RawModeGuard, BridgeError> {
    Err(BridgeError::RawModeUnavailable {
        message: "raw mode is not supported on this platform".to_string(),
    })
}

#[cfg(not(unix))]
pub fn terminal_size() -> (u16, u16) {
    (DEFAULT_COLS, DEFAULT_ROWS)
}

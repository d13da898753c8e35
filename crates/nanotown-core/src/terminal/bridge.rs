//! Pseudo-terminal bridge.
//!
//! Spawns the session shell inside a PTY and runs two independent byte
//! pumps: PTY output to stdout (classified and forwarded to an
//! [`OutputSink`]) and stdin to the PTY. The sink is moved into the output
//! pump thread, so it is the only writer of session output state while the
//! shell runs. [`PtyBridge::wait_for`] hands it back once the pump ends.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tracing::{debug, info, warn};

use super::classify::{extract_last_line, has_printable_content};
use super::errors::BridgeError;
use super::raw_mode::{RawModeGuard, enable_raw_mode, terminal_size};
use super::shell;

/// How long `wait_for` waits for the output pump to drain after the shell exits.
const PUMP_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

const READ_BUFFER_SIZE: usize = 4096;

/// Receives session output events from the output pump.
pub trait OutputSink: Send + 'static {
    /// Called once on the launching thread, before any output is pumped.
    fn on_spawn(&mut self, pid: i64);

    /// A chunk with printable content arrived. `line` is its trailing line, if any.
    fn on_output(&mut self, at: DateTime<Utc>, line: Option<String>);
}

#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub working_dir: PathBuf,
    /// Printed then deleted by the shell on startup.
    pub banner_file: Option<PathBuf>,
    pub title: String,
    pub env: Vec<(String, String)>,
    /// Explicit shell program; `$SHELL` when `None`.
    pub shell_program: Option<String>,
    pub prompt_tag: String,
    /// Directory for generated shell startup files, removed on cleanup.
    pub startup_dir: Option<PathBuf>,
}

pub struct PtyBridge<S: OutputSink> {
    pid: i64,
    child: Box<dyn Child + Send + Sync>,
    master: Option<Box<dyn MasterPty + Send>>,
    raw_mode: Option<RawModeGuard>,
    sink_rx: mpsc::Receiver<S>,
    banner_file: Option<PathBuf>,
    startup_dir: Option<PathBuf>,
}

impl<S: OutputSink> std::fmt::Debug for PtyBridge<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyBridge")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

#[cfg(unix)]
fn build_command(request: &LaunchRequest) -> Result<(String, CommandBuilder), BridgeError> {
    let program = shell::resolve_shell(request.shell_program.as_deref());
    let exec_line = shell::prepare_startup(
        &program,
        request.startup_dir.as_deref(),
        &request.prompt_tag,
    )?;
    let script =
        shell::build_launch_script(request.banner_file.is_some(), &request.title, &exec_line);

    let mut cmd = CommandBuilder::new("/bin/sh");
    cmd.args(["-c", script.as_str()]);
    if let Some(banner) = &request.banner_file {
        cmd.arg("--");
        cmd.arg(banner.as_os_str());
    }
    Ok((program, cmd))
}

#[cfg(not(unix))]
fn build_command(request: &LaunchRequest) -> Result<(String, CommandBuilder), BridgeError> {
    let program = shell::resolve_shell(request.shell_program.as_deref());
    let script = shell::build_cmd_script(request.banner_file.as_deref(), &request.title);

    let mut cmd = CommandBuilder::new(&program);
    if !script.is_empty() {
        cmd.args(["/k", script.as_str()]);
    }
    Ok((program, cmd))
}

impl<S: OutputSink> PtyBridge<S> {
    /// Spawn the shell and start both pumps.
    ///
    /// Failing to open the PTY or spawn the shell is fatal. Failing to enter
    /// raw mode is not: the session continues with cooked input.
    pub fn launch(request: LaunchRequest, mut sink: S) -> Result<Self, BridgeError> {
        let (program, mut cmd) = build_command(&request)?;
        cmd.cwd(&request.working_dir);
        for (key, value) in &request.env {
            cmd.env(key, value);
        }

        let (cols, rows) = terminal_size();
        let pair = native_pty_system()
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| BridgeError::PtyOpen {
                message: e.to_string(),
            })?;

        info!(
            event = "core.terminal.launch_started",
            shell = %program,
            working_dir = %request.working_dir.display(),
            cols = cols,
            rows = rows
        );

        let mut child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| BridgeError::Spawn {
                program: program.clone(),
                message: e.to_string(),
            })?;
        // Only the child keeps the slave open, so the PTY closes when it exits.
        drop(pair.slave);

        let pid = child.process_id().map(i64::from).unwrap_or(-1);

        let streams = pair
            .master
            .try_clone_reader()
            .and_then(|reader| pair.master.take_writer().map(|writer| (reader, writer)));
        let (reader, writer) = match streams {
            Ok(streams) => streams,
            Err(e) => {
                if let Err(kill_err) = child.kill() {
                    warn!(
                        event = "core.terminal.launch_cleanup_failed",
                        pid = pid,
                        error = %kill_err
                    );
                }
                return Err(BridgeError::PtyOpen {
                    message: e.to_string(),
                });
            }
        };

        sink.on_spawn(pid);

        let raw_mode = match enable_raw_mode() {
            Ok(guard) => Some(guard),
            Err(e) => {
                debug!(event = "core.terminal.raw_mode_skipped", error = %e);
                None
            }
        };

        let (sink_tx, sink_rx) = mpsc::channel();
        thread::spawn(move || pump_output(reader, sink, sink_tx));
        thread::spawn(move || pump_input(writer));

        info!(event = "core.terminal.launch_completed", pid = pid);

        Ok(Self {
            pid,
            child,
            master: Some(pair.master),
            raw_mode,
            sink_rx,
            banner_file: request.banner_file,
            startup_dir: request.startup_dir,
        })
    }

    /// Pid of the shell. `-1` if the platform did not report one.
    pub fn pid(&self) -> i64 {
        self.pid
    }

    /// Block until the shell exits, then clean up.
    ///
    /// Returns the sink once the output pump has drained, or `None` when the
    /// PTY is still held open (for example by an orphaned descendant).
    pub fn wait_for(&mut self) -> Option<S> {
        match self.child.wait() {
            Ok(status) => {
                info!(
                    event = "core.terminal.child_exited",
                    pid = self.pid,
                    success = status.success()
                );
            }
            Err(e) => {
                warn!(event = "core.terminal.wait_failed", pid = self.pid, error = %e);
            }
        }

        let sink = match self.sink_rx.recv_timeout(PUMP_DRAIN_TIMEOUT) {
            Ok(sink) => Some(sink),
            Err(e) => {
                warn!(
                    event = "core.terminal.output_drain_timed_out",
                    pid = self.pid,
                    error = %e
                );
                None
            }
        };

        self.cleanup();
        sink
    }

    /// Restore the terminal, close the PTY and remove transient files.
    /// Safe to call more than once.
    fn cleanup(&mut self) {
        self.raw_mode.take();
        self.master.take();

        if let Some(banner) = self.banner_file.take()
            && let Err(e) = std::fs::remove_file(&banner)
            && e.kind() != io::ErrorKind::NotFound
        {
            debug!(event = "core.terminal.banner_cleanup_failed", error = %e);
        }

        if let Some(dir) = self.startup_dir.take()
            && let Err(e) = std::fs::remove_dir_all(&dir)
            && e.kind() != io::ErrorKind::NotFound
        {
            debug!(
                event = "core.terminal.startup_cleanup_failed",
                dir = %dir.display(),
                error = %e
            );
        }
    }
}

impl<S: OutputSink> Drop for PtyBridge<S> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn pump_output<S: OutputSink>(mut reader: Box<dyn Read + Send>, mut sink: S, done: mpsc::Sender<S>) {
    let mut stdout = io::stdout();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let chunk = &buf[..n];
                if let Err(e) = stdout.write_all(chunk).and_then(|()| stdout.flush()) {
                    debug!(event = "core.terminal.stdout_write_failed", error = %e);
                }
                if has_printable_content(chunk) {
                    sink.on_output(Utc::now(), extract_last_line(chunk));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(event = "core.terminal.output_pump_ended", error = %e);
                break;
            }
        }
    }

    // The receiver is gone if wait_for already timed out.
    let _ = done.send(sink);
}

fn pump_input(mut writer: Box<dyn Write + Send>) {
    let mut stdin = io::stdin();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    loop {
        let n = match stdin.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(event = "core.terminal.stdin_read_failed", error = %e);
                break;
            }
        };
        if let Err(e) = writer.write_all(&buf[..n]).and_then(|()| writer.flush()) {
            debug!(event = "core.terminal.input_pump_ended", error = %e);
            break;
        }
    }
}

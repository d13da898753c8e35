//! Process table enumeration strategies.
//!
//! No single mechanism works everywhere: `/proc` is fastest but Linux-only,
//! `ps` covers the other Unix flavors, and the `sysinfo` snapshot covers
//! Windows. Strategies are probed once and then tried in priority order.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

use crate::process::errors::ProcessError;
use crate::process::types::{ProcessEntry, ProcessTable};

const PROC_ROOT: &str = "/proc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumerationStrategy {
    /// Read `<root>/<pid>/stat` for every numeric entry.
    ProcFs(PathBuf),
    /// Parse `ps -eo pid=,ppid=,comm=`.
    PsTool,
    /// Native process snapshot through `sysinfo`.
    Snapshot,
}

impl EnumerationStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            EnumerationStrategy::ProcFs(_) => "procfs",
            EnumerationStrategy::PsTool => "ps",
            EnumerationStrategy::Snapshot => "snapshot",
        }
    }

    /// Strategies usable on this machine, fastest first.
    pub fn probe() -> Vec<EnumerationStrategy> {
        let mut strategies = Vec::new();
        if cfg!(unix) {
            let proc_root = PathBuf::from(PROC_ROOT);
            if proc_root.join("self").join("stat").exists() {
                strategies.push(EnumerationStrategy::ProcFs(proc_root));
            }
            strategies.push(EnumerationStrategy::PsTool);
        }
        strategies.push(EnumerationStrategy::Snapshot);

        debug!(
            event = "core.process.strategies_probed",
            strategies = ?strategies.iter().map(|s| s.label()).collect::<Vec<_>>()
        );
        strategies
    }

    pub fn snapshot(&self) -> Result<ProcessTable, ProcessError> {
        match self {
            EnumerationStrategy::ProcFs(root) => read_proc_table(root),
            EnumerationStrategy::PsTool => read_ps_table(),
            EnumerationStrategy::Snapshot => Ok(read_sysinfo_table()),
        }
    }
}

fn read_proc_table(root: &Path) -> Result<ProcessTable, ProcessError> {
    let entries = fs::read_dir(root).map_err(|e| ProcessError::EnumerationUnavailable {
        strategy: "procfs",
        message: e.to_string(),
    })?;

    let mut rows = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.parse::<u32>().is_err() {
            continue;
        }
        // Processes exit between read_dir and read; skip them.
        let Ok(stat) = fs::read_to_string(entry.path().join("stat")) else {
            continue;
        };
        if let Some(row) = parse_proc_stat(&stat) {
            rows.push(row);
        }
    }

    Ok(ProcessTable::new(rows))
}

/// Parse `<pid> (<comm>) <state> <ppid> ...`.
///
/// The command name may itself contain spaces and parentheses, so it spans
/// from the first `(` to the last `)`.
pub fn parse_proc_stat(stat: &str) -> Option<ProcessEntry> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    if close <= open {
        return None;
    }
    let pid = stat[..open].trim().parse().ok()?;
    let name = stat[open + 1..close].to_string();
    let mut rest = stat[close + 1..].split_whitespace();
    let _state = rest.next()?;
    let ppid = rest.next()?.parse().ok()?;
    Some(ProcessEntry { pid, ppid, name })
}

fn read_ps_table() -> Result<ProcessTable, ProcessError> {
    let output = Command::new("ps")
        .args(["-eo", "pid=,ppid=,comm="])
        .output()
        .map_err(|e| ProcessError::EnumerationUnavailable {
            strategy: "ps",
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ProcessError::EnumerationUnavailable {
            strategy: "ps",
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(parse_ps_output(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `pid ppid comm` lines; `comm` may be a full path.
pub fn parse_ps_output(output: &str) -> ProcessTable {
    let rows = output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let pid = fields.next()?.parse().ok()?;
            let ppid = fields.next()?.parse().ok()?;
            let comm = fields.collect::<Vec<_>>().join(" ");
            if comm.is_empty() {
                return None;
            }
            let name = comm.rsplit('/').next().unwrap_or(&comm).to_string();
            Some(ProcessEntry { pid, ppid, name })
        })
        .collect();
    ProcessTable::new(rows)
}

fn read_sysinfo_table() -> ProcessTable {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);

    let rows = system
        .processes()
        .iter()
        .map(|(pid, process)| ProcessEntry {
            pid: pid.as_u32(),
            ppid: process.parent().map(|p| p.as_u32()).unwrap_or(0),
            name: process.name().to_string_lossy().to_string(),
        })
        .collect();
    ProcessTable::new(rows)
}

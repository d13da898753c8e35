use std::collections::HashSet;

use tracing::{debug, warn};

use crate::agents::AgentCatalog;
use crate::process::enumerate::EnumerationStrategy;
use crate::process::errors::ProcessError;
use crate::process::operations;

/// OS process introspection used by session stop and status refresh.
///
/// All methods are best-effort: an empty descendant set means "unknown",
/// not "no children".
pub trait ProcessInspector: Send + Sync {
    fn is_alive(&self, pid: i64) -> bool;

    fn terminate(&self, pid: i64) -> Result<(), ProcessError>;

    fn force_terminate(&self, pid: i64) -> Result<(), ProcessError>;

    fn descendant_names(&self, pid: i64) -> HashSet<String>;
}

/// Inspector backed by the real OS.
#[derive(Debug, Clone)]
pub struct SystemInspector {
    strategies: Vec<EnumerationStrategy>,
}

impl SystemInspector {
    /// Probe the available enumeration strategies once.
    pub fn new() -> Self {
        Self::with_strategies(EnumerationStrategy::probe())
    }

    pub fn with_strategies(strategies: Vec<EnumerationStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[EnumerationStrategy] {
        &self.strategies
    }
}

impl Default for SystemInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessInspector for SystemInspector {
    fn is_alive(&self, pid: i64) -> bool {
        operations::is_alive(pid)
    }

    fn terminate(&self, pid: i64) -> Result<(), ProcessError> {
        operations::terminate(pid)
    }

    fn force_terminate(&self, pid: i64) -> Result<(), ProcessError> {
        operations::force_terminate(pid)
    }

    fn descendant_names(&self, pid: i64) -> HashSet<String> {
        let Ok(root) = u32::try_from(pid) else {
            return HashSet::new();
        };
        if root == 0 {
            return HashSet::new();
        }

        for strategy in &self.strategies {
            match strategy.snapshot() {
                Ok(table) => {
                    debug!(
                        event = "core.process.descendants_completed",
                        pid = pid,
                        strategy = strategy.label(),
                        table_size = table.len()
                    );
                    return table.descendant_names(root);
                }
                Err(e) => {
                    debug!(
                        event = "core.process.strategy_unavailable",
                        strategy = strategy.label(),
                        error = %e
                    );
                }
            }
        }

        warn!(
            event = "core.process.descendants_unavailable",
            pid = pid,
            "No process enumeration strategy succeeded"
        );
        HashSet::new()
    }
}

/// Name of the catalogued agent running somewhere below `pid`, if any.
pub fn detect_agent(
    inspector: &dyn ProcessInspector,
    catalog: &AgentCatalog,
    pid: i64,
) -> Option<String> {
    let names = inspector.descendant_names(pid);
    catalog.detect(&names).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::process::{Command, Stdio};

    #[test]
    fn test_descendants_of_invalid_pid_is_empty() {
        let inspector = SystemInspector::new();
        assert!(inspector.descendant_names(-1).is_empty());
        assert!(inspector.descendant_names(0).is_empty());
    }

    #[test]
    fn test_falls_back_when_first_strategy_unavailable() {
        let inspector = SystemInspector::with_strategies(vec![
            EnumerationStrategy::ProcFs(PathBuf::from("/definitely/not/proc")),
            EnumerationStrategy::Snapshot,
        ]);

        let mut child = Command::new("sleep")
            .arg("10")
            .stdout(Stdio::null())
            .spawn()
            .expect("Failed to spawn test process");
        std::thread::sleep(std::time::Duration::from_millis(100));

        let names = inspector.descendant_names(std::process::id() as i64);
        assert!(names.iter().any(|n| n.contains("sleep")), "got {:?}", names);

        let _ = child.kill();
        let _ = child.wait();
    }

    #[test]
    fn test_no_strategies_yields_empty() {
        let inspector = SystemInspector::with_strategies(vec![]);
        assert!(
            inspector
                .descendant_names(std::process::id() as i64)
                .is_empty()
        );
    }

    #[test]
    fn test_detect_agent_with_catalog_entry() {
        let mut child = Command::new("sleep")
            .arg("10")
            .stdout(Stdio::null())
            .spawn()
            .expect("Failed to spawn test process");
        std::thread::sleep(std::time::Duration::from_millis(100));

        let inspector = SystemInspector::new();
        let catalog = AgentCatalog::new(["sleep"]);
        let detected = detect_agent(&inspector, &catalog, std::process::id() as i64);
        assert_eq!(detected.as_deref(), Some("sleep"));

        let empty = AgentCatalog::new(["definitely-not-running-xyz"]);
        assert_eq!(
            detect_agent(&inspector, &empty, std::process::id() as i64),
            None
        );

        let _ = child.kill();
        let _ = child.wait();
    }
}

//! Scripted [`ProcessInspector`] for lifecycle tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::errors::ProcessError;
use super::inspector::ProcessInspector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Terminate,
    ForceTerminate,
}

#[derive(Debug, Default)]
pub struct FakeInspector {
    alive: Mutex<HashSet<i64>>,
    ignores_terminate: HashSet<i64>,
    descendants: HashMap<i64, HashSet<String>>,
    signals: Mutex<Vec<(i64, Signal)>>,
}

impl FakeInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alive(self, pid: i64) -> Self {
        self.alive.lock().unwrap().insert(pid);
        self
    }

    /// A live process that survives graceful termination.
    pub fn with_stubborn(mut self, pid: i64) -> Self {
        self.ignores_terminate.insert(pid);
        self.with_alive(pid)
    }

    pub fn with_descendants(mut self, pid: i64, names: &[&str]) -> Self {
        self.descendants
            .insert(pid, names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn kill(&self, pid: i64) {
        self.alive.lock().unwrap().remove(&pid);
    }

    pub fn signals(&self) -> Vec<(i64, Signal)> {
        self.signals.lock().unwrap().clone()
    }
}

impl ProcessInspector for FakeInspector {
    fn is_alive(&self, pid: i64) -> bool {
        pid > 0 && self.alive.lock().unwrap().contains(&pid)
    }

    fn terminate(&self, pid: i64) -> Result<(), ProcessError> {
        self.signals.lock().unwrap().push((pid, Signal::Terminate));
        if !self.is_alive(pid) {
            return Err(ProcessError::NotFound { pid });
        }
        if !self.ignores_terminate.contains(&pid) {
            self.kill(pid);
        }
        Ok(())
    }

    fn force_terminate(&self, pid: i64) -> Result<(), ProcessError> {
        self.signals
            .lock()
            .unwrap()
            .push((pid, Signal::ForceTerminate));
        if !self.is_alive(pid) {
            return Err(ProcessError::NotFound { pid });
        }
        self.kill(pid);
        Ok(())
    }

    fn descendant_names(&self, pid: i64) -> HashSet<String> {
        self.descendants.get(&pid).cloned().unwrap_or_default()
    }
}

use std::collections::{HashMap, HashSet, VecDeque};

/// One row of an OS process table snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub ppid: u32,
    pub name: String,
}

/// Point-in-time snapshot of the OS-wide process table.
///
/// Snapshots are assembled from racy sources, so they may contain
/// duplicate or self-parented rows. Traversal tolerates both.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    entries: Vec<ProcessEntry>,
}

impl ProcessTable {
    pub fn new(entries: Vec<ProcessEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of every process transitively spawned by `pid`, excluding `pid` itself.
    ///
    /// Breadth-first over the parent->children relation; each pid is
    /// visited at most once.
    pub fn descendant_names(&self, pid: u32) -> HashSet<String> {
        let mut children: HashMap<u32, Vec<&ProcessEntry>> = HashMap::new();
        for entry in &self.entries {
            children.entry(entry.ppid).or_default().push(entry);
        }

        let mut visited = HashSet::from([pid]);
        let mut queue = VecDeque::from([pid]);
        let mut names = HashSet::new();

        while let Some(current) = queue.pop_front() {
            let Some(kids) = children.get(&current) else {
                continue;
            };
            for child in kids {
                if visited.insert(child.pid) {
                    names.insert(child.name.clone());
                    queue.push_back(child.pid);
                }
            }
        }

        names
    }
}

//! Catalog of known agent programs.
//!
//! The catalog is plain data handed to whoever needs it (status refresh,
//! agent detection). It is never mutated after construction.

use std::collections::HashSet;

/// Agent programs recognized out of the box, in detection priority order.
pub const BUILTIN_AGENTS: &[&str] = &["claude", "opencode", "aider", "kimi", "codex"];

/// Immutable list of agent program names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCatalog {
    names: Vec<String>,
}

impl AgentCatalog {
    /// Build a catalog from names, normalizing and dropping duplicates while
    /// keeping first-seen order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(|n| normalize_program_name(n.as_ref()))
            .filter(|n| !n.is_empty() && seen.insert(n.clone()))
            .collect();
        Self { names }
    }

    /// Built-in names followed by user-configured extras.
    pub fn with_extra(extra: &[String]) -> Self {
        Self::new(
            BUILTIN_AGENTS
                .iter()
                .map(|s| s.to_string())
                .chain(extra.iter().cloned()),
        )
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Return the first catalog entry present among `process_names`.
    ///
    /// Matching ignores case, leading directories and a trailing `.exe`.
    /// Catalog order decides between several running agents.
    pub fn detect<'a, I>(&self, process_names: I) -> Option<&str>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let running: HashSet<String> = process_names
            .into_iter()
            .map(|n| normalize_program_name(n))
            .collect();
        self.names
            .iter()
            .find(|name| running.contains(name.as_str()))
            .map(String::as_str)
    }
}

impl Default for AgentCatalog {
    fn default() -> Self {
        Self::with_extra(&[])
    }
}

/// Lowercase base name with any `.exe` suffix removed.
pub fn normalize_program_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    let lower = base.to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_program_name() {
        assert_eq!(normalize_program_name("claude"), "claude");
        assert_eq!(normalize_program_name("Claude.EXE"), "claude");
        assert_eq!(normalize_program_name("/usr/local/bin/aider"), "aider");
        assert_eq!(normalize_program_name("C:\\tools\\Codex.exe"), "codex");
        assert_eq!(normalize_program_name(""), "");
    }

    #[test]
    fn test_detect_ignores_case_and_extension() {
        let catalog = AgentCatalog::default();
        let running = names(&["bash", "CLAUDE.exe", "node"]);
        assert_eq!(catalog.detect(&running), Some("claude"));
    }

    #[test]
    fn test_detect_returns_none_without_match() {
        let catalog = AgentCatalog::default();
        let running = names(&["bash", "vim", "sleep"]);
        assert_eq!(catalog.detect(&running), None);
        assert_eq!(catalog.detect(&Vec::new()), None);
    }

    #[test]
    fn test_detect_prefers_catalog_order() {
        let catalog = AgentCatalog::default();
        let running = names(&["codex", "aider"]);
        assert_eq!(catalog.detect(&running), Some("aider"));
    }

    #[test]
    fn test_detect_does_not_match_substrings() {
        let catalog = AgentCatalog::default();
        let running = names(&["claude-helper", "my-codex"]);
        assert_eq!(catalog.detect(&running), None);
    }

    #[test]
    fn test_with_extra_deduplicates() {
        let catalog = AgentCatalog::with_extra(&names(&["Goose", "claude"]));
        assert_eq!(
            catalog.names(),
            &names(&["claude", "opencode", "aider", "kimi", "codex", "goose"])[..]
        );
    }
}

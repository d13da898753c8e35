//! nanotown-core: runtime engine for concurrent agent sessions
//!
//! Each session is an interactive shell running inside a pseudo-terminal,
//! bound to its own git worktree and tracked by a small JSON record. The
//! CLI is a thin layer over this crate.
//!
//! # Main Entry Points
//!
//! - [`sessions`] - Start, stop, delete, merge and clean sessions
//! - [`status`] - Live-updating status dashboard
//! - [`process`] - Process liveness, termination and descendant lookup
//! - [`terminal`] - Pseudo-terminal bridge
//! - [`config`] - Configuration management

pub mod agents;
pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod process;
pub mod sessions;
pub mod status;
pub mod terminal;
pub mod vcs;
pub mod worktree;

// Re-export commonly used types at crate root for convenience
pub use agents::AgentCatalog;
pub use config::{Config, NanotownConfig};
pub use process::{ProcessInspector, SystemInspector};
pub use sessions::store::SessionStore;
pub use sessions::types::Session;
pub use status::SessionState;
pub use worktree::WorktreeInfo;

pub use sessions::handler as session_ops;

pub use logging::init_logging;

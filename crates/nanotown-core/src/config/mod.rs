//! # Configuration System
//!
//! Two kinds of configuration exist:
//!
//! - [`Config`] - runtime paths derived from the environment (base
//!   directory, session store directory). Never read from files.
//! - [`NanotownConfig`] - tunables loaded from TOML, in this order (later
//!   sources override earlier ones):
//!   1. **Hardcoded defaults**
//!   2. **User config** - `~/.nanotown/config.toml`
//!   3. **Project config** - `./.nanotown/config.toml`
//!
//! ```toml
//! # ~/.nanotown/config.toml
//! [status]
//! tick_ms = 100
//! refresh_every_ticks = 10
//! active_threshold_secs = 2
//!
//! [stop]
//! grace_secs = 3
//!
//! [shell]
//! prompt_tag = "nt"
//!
//! [agents]
//! extra = ["goose"]
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

pub use types::{AgentsConfig, Config, NanotownConfig, ShellConfig, StatusConfig, StopConfig};
pub use validation::validate_config;

impl NanotownConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy()
    }
}

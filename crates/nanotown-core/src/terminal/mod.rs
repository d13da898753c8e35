//! Terminal bridge: runs a session shell inside a pseudo-terminal while
//! observing its output.

pub mod bridge;
pub mod classify;
pub mod errors;
pub mod raw_mode;
pub mod shell;

pub use bridge::{LaunchRequest, OutputSink, PtyBridge};
pub use classify::{extract_last_line, has_printable_content, strip_ansi};
pub use errors::BridgeError;

pub mod enumerate;
pub mod errors;
#[cfg(test)]
pub mod fake;
pub mod inspector;
pub mod operations;
pub mod types;

pub use enumerate::EnumerationStrategy;
pub use errors::ProcessError;
pub use inspector::{ProcessInspector, SystemInspector, detect_agent};
pub use operations::{force_terminate, is_alive, terminate};
pub use types::{ProcessEntry, ProcessTable};

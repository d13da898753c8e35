//! Session status: classification, snapshot refresh and the live dashboard.

pub mod classify;
pub mod errors;
pub mod frame;
pub mod live;
pub mod refresh;
pub mod render;
pub mod spinner;

pub use classify::{SessionState, format_duration, format_time_ago};
pub use errors::StatusError;
pub use live::run_live_status;
pub use refresh::{SessionRow, StatusSnapshot, refresh};
pub use render::render;
pub use spinner::Spinner;

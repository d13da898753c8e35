pub mod clean;
pub mod create;
pub mod destroy;
pub mod errors;
pub mod handler;
pub mod merge;
pub mod recorder;
pub mod stop;
pub mod store;
pub mod types;

pub use errors::SessionError;
pub use recorder::SessionRecorder;
pub use store::SessionStore;
pub use types::Session;

pub mod commands;
pub mod diff;
pub mod poll;

pub use commands::CommandForwarder;
pub use diff::diff_snapshots;
pub use poll::{EngineStatus, PollEngine, PollOptions, RefreshHandle};

//! Watch mode: file-change detection feeding a debounced rebuild loop.
//!
//! The [`supervisor`] records changes into the shared [`registry`]; the
//! [`scheduler`] drains it on a fixed period and runs at most one rebuild
//! per category at a time.

pub mod discovery;
pub mod registry;
pub mod scheduler;
pub mod supervisor;

pub use discovery::discover_watch_dirs;
pub use registry::{CategoryState, ReadyRebuild, WatchRegistry};
pub use scheduler::RebuildScheduler;
pub use supervisor::FileWatchSupervisor;

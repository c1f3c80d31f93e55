//! Shared types for the tutor daemon and its polling client.

pub mod api;
pub mod error;
pub mod task;

pub use error::TaskError;
pub use task::{Task, TaskCounts, TaskState};

/// Crate version, reported by both binaries
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default daemon port
pub const DEFAULT_PORT: u16 = 8000;

/// Default daemon URL used by the client
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Interval between status polls, in seconds
pub const POLL_INTERVAL_SECS: u64 = 2;

/// Route prefix under which rendered videos are served
pub const VIDEOS_ROUTE: &str = "/videos";

/// Public location of the artifact rendered for `task_id`.
pub fn video_location(task_id: &str, extension: &str) -> String {
    format!("{}/{}.{}", VIDEOS_ROUTE, task_id, extension)
}

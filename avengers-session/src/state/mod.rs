pub mod events;
pub mod schema;
pub mod store;

// Re-export the types most callers need
pub use events::{EventLog, LogEntry, DEFAULT_LOG_LIMIT};
pub use schema::{AgentTask, DispatchMode, Mission, MissionStatus, TaskStatus};
pub use store::{MissionLayout, MissionStore};

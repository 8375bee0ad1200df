pub mod poll;
pub mod tracker;

pub use poll::{watch_mission, WatchOutcome};
pub use tracker::{check_artifacts, ArtifactStatus, Progress, StatusReport};

//! Artifact progress tracking.
//!
//! Task status is derived from artifact presence on every call and never
//! persisted. Checks are read-only and idempotent.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::plan::schema::ExecutionPlan;
use crate::state::events::LogEntry;
use crate::state::schema::{Mission, TaskStatus};
use crate::state::store::{MissionLayout, MissionStore};

/// Observed state of one task's artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactStatus {
    pub agent_id: String,
    /// `Completed` when the artifact exists, `Missing` otherwise.
    pub status: TaskStatus,
    pub output_file: PathBuf,
    /// Bytes; 0 when absent.
    #[serde(rename = "output_size")]
    pub size: u64,
}

/// Check every task the plan has a command for. No plan, no tasks.
pub fn check_artifacts(layout: &MissionLayout, plan: Option<&ExecutionPlan>) -> Vec<ArtifactStatus> {
    let Some(plan) = plan else {
        return Vec::new();
    };

    plan.tracked_agent_ids()
        .map(|agent_id| {
            let output_file = layout.artifact_path(agent_id);
            let (status, size) = match fs::metadata(&output_file) {
                Ok(meta) if meta.is_file() => (TaskStatus::Completed, meta.len()),
                _ => (TaskStatus::Missing, 0),
            };
            ArtifactStatus {
                agent_id: agent_id.to_string(),
                status,
                output_file,
                size,
            }
        })
        .collect()
}

/// Live progress. Existence is enough here; emptiness only matters to
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// Rounded to the nearest integer.
    pub percent: u32,
}

impl Progress {
    pub fn from_artifacts(artifacts: &[ArtifactStatus]) -> Self {
        let completed = artifacts
            .iter()
            .filter(|a| a.status == TaskStatus::Completed)
            .count();
        let total = artifacts.len();
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };
        Self {
            completed,
            total,
            percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Snapshot rendered by `status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub mission: Mission,
    #[serde(skip)]
    pub plan: Option<ExecutionPlan>,
    pub progress: Progress,
    pub agents: Vec<ArtifactStatus>,
    pub logs: Vec<LogEntry>,
}

impl StatusReport {
    /// Load mission, plan, artifacts and recent log entries.
    ///
    /// The mission must exist; the plan is optional.
    pub fn collect(store: &MissionStore, mission_id: &str, log_limit: usize) -> Result<Self> {
        let mission = store.load(mission_id)?;
        let plan = store.load_plan_optional(mission_id)?;
        let layout = store.layout(mission_id);

        let agents = check_artifacts(&layout, plan.as_ref());
        let logs = store.event_log(mission_id).read_recent(log_limit)?;

        Ok(Self {
            mission,
            progress: Progress::from_artifacts(&agents),
            plan,
            agents,
            logs,
        })
    }

    pub fn artifact(&self, agent_id: &str) -> Option<&ArtifactStatus> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }

    /// True once a plan exists and every tracked artifact is present.
    pub fn is_complete(&self) -> bool {
        self.plan.is_some() && self.progress.completed == self.progress.total
    }
}

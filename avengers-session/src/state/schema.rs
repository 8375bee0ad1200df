use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::consolidate::validation::ValidationSummary;
use crate::roles::Role;

/// Mission lifecycle status.
///
/// There is no failed state: a mission that was consolidated with missing
/// artifacts is still `Completed`, and the failure lives in its validation
/// summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Initializing,
    Executing,
    Completed,
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissionStatus::Initializing => write!(f, "initializing"),
            MissionStatus::Executing => write!(f, "executing"),
            MissionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// The root mission document (`mission.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub path: PathBuf,
    pub task: String,
    pub status: MissionStatus,
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationSummary>,

    /// Fields merged in by later steps that the core does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Mission {
    /// Create a new mission in the `initializing` state.
    pub fn new(id: &str, path: PathBuf, task: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            path,
            task: task.to_string(),
            status: MissionStatus::Initializing,
            created_at,
            updated_at: None,
            completed_at: None,
            validation: None,
            extra: Map::new(),
        }
    }
}

/// Per-task status. Derived from artifact presence on every read; the
/// stored value is never authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    Missing,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Missing => write!(f, "missing"),
        }
    }
}

/// How a task reaches the execution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Create a new execution context for the task.
    #[default]
    Spawn,
    /// Address a previously created context by label.
    Existing,
}

impl std::fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchMode::Spawn => write!(f, "spawn"),
            DispatchMode::Existing => write!(f, "existing"),
        }
    }
}

/// One unit of work within a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTask {
    pub id: String,
    #[serde(rename = "type")]
    pub role: Role,
    pub emoji: String,
    pub model: String,
    pub timeout: u64,
    pub description: String,
    #[serde(default)]
    pub inputs: Vec<Value>,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub mode: DispatchMode,
    /// Label of the existing context when `mode` is `existing`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_agent_id: Option<String>,
}

impl AgentTask {
    /// Label of the context an `existing` task is sent to.
    pub fn target_label(&self) -> String {
        self.existing_agent_id
            .clone()
            .unwrap_or_else(|| self.role.to_string())
    }
}

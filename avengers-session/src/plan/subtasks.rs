//! Structured subtask input and its conversion into agent tasks.
//!
//! Decomposition itself happens outside this crate; it arrives as a JSON
//! file of the form `{"task": "...", "subtasks": [...]}`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{MissionError, Result};
use crate::roles::{Role, RoleTable};
use crate::state::schema::{AgentTask, DispatchMode, TaskStatus};

const DEFAULT_MISSION_TASK: &str = "Avengers Mission";

/// Top-level subtask file.
#[derive(Debug, Clone, Deserialize)]
pub struct SubtaskFile {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskSpec>,
}

impl SubtaskFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| MissionError::io(path, e))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| MissionError::InvalidSubtasks(e.to_string()))
    }

    /// Mission description, defaulting when the file omits it.
    pub fn task_description(&self) -> &str {
        self.task
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_MISSION_TASK)
    }
}

/// One subtask as produced by decomposition.
#[derive(Debug, Clone, Deserialize)]
pub struct SubtaskSpec {
    /// Local alias other subtasks may use in `dependencies`.
    #[serde(default)]
    pub id: Option<String>,
    pub description: String,
    #[serde(default, rename = "type")]
    pub role: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub inputs: Vec<Value>,
    #[serde(default)]
    pub expected_output: String,
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
    #[serde(default)]
    pub mode: DispatchMode,
    #[serde(default)]
    pub existing_agent_id: Option<String>,
}

/// A dependency given either as a subtask index or as a name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DependencyRef {
    Index(usize),
    Name(String),
}

/// Agent id for the subtask at `index`.
pub fn agent_id(mission_id: &str, index: usize) -> String {
    format!("{}_agent_{:02}", mission_id, index)
}

/// Build agent tasks for a mission.
///
/// Dependencies resolve, in order, by subtask alias, by subtask index
/// (number or decimal string) and otherwise stay verbatim, so a full agent id
/// still matches and anything else is left for the scheduler's fallback.
pub fn build_agent_tasks(
    mission_id: &str,
    specs: &[SubtaskSpec],
    roles: &RoleTable,
) -> Result<Vec<AgentTask>> {
    let mut aliases: HashMap<&str, usize> = HashMap::new();
    for (index, spec) in specs.iter().enumerate() {
        if spec.description.trim().is_empty() {
            return Err(MissionError::InvalidSubtasks(format!(
                "subtask {} has an empty description",
                index
            )));
        }
        if let Some(alias) = spec.id.as_deref() {
            if aliases.insert(alias, index).is_some() {
                return Err(MissionError::InvalidSubtasks(format!(
                    "duplicate subtask id '{}'",
                    alias
                )));
            }
        }
    }

    let resolve = |dep: &DependencyRef| -> String {
        let index = match dep {
            DependencyRef::Index(i) => Some(*i),
            DependencyRef::Name(name) => aliases
                .get(name.as_str())
                .copied()
                .or_else(|| name.trim().parse::<usize>().ok()),
        };
        match (index, dep) {
            (Some(i), _) if i < specs.len() => agent_id(mission_id, i),
            (_, DependencyRef::Index(i)) => i.to_string(),
            (_, DependencyRef::Name(name)) => name.clone(),
        }
    };

    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| -> Result<AgentTask> {
            let role = match spec.role.as_deref() {
                Some(name) => name.parse::<Role>()?,
                None => roles.infer(&spec.description),
            };
            let profile = roles.profile(role);

            Ok(AgentTask {
                id: agent_id(mission_id, index),
                role,
                emoji: profile.emoji.clone(),
                model: spec.model.clone().unwrap_or_else(|| profile.model.clone()),
                timeout: spec.timeout.unwrap_or(profile.timeout_secs),
                description: spec.description.clone(),
                inputs: spec.inputs.clone(),
                expected_output: spec.expected_output.clone(),
                dependencies: spec.dependencies.iter().map(&resolve).collect(),
                status: TaskStatus::Pending,
                mode: spec.mode,
                existing_agent_id: spec.existing_agent_id.clone(),
            })
        })
        .collect()
}

use serde::{Deserialize, Serialize};

use crate::roles::Role;
use crate::state::schema::{AgentTask, DispatchMode};

/// Maximum description length shown in plan summaries.
pub const SUMMARY_DESCRIPTION_CHARS: usize = 50;

/// The execution plan document (`execution_plan.json`).
///
/// Written once when the mission is assembled and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub mission_id: String,
    pub total_agents: usize,
    pub phases: Vec<PlanPhase>,
    pub commands: Vec<DispatchCommand>,

    /// Dependencies dropped by forced admissions, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved_dependencies: Vec<UnresolvedDependency>,
}

impl ExecutionPlan {
    /// Dispatch command for an agent, if the plan has one.
    pub fn command_for(&self, agent_id: &str) -> Option<&DispatchCommand> {
        self.commands.iter().find(|c| c.agent_id() == agent_id)
    }

    /// Task ids tracked for completion, in command order.
    pub fn tracked_agent_ids(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.agent_id())
    }
}

/// A group of agents dispatched together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPhase {
    /// 1-based phase number.
    pub phase: u32,
    /// Advisory: members may run concurrently in the backend.
    pub parallel: bool,
    pub agents: Vec<PlanAgent>,
}

/// Summary of an agent as listed inside a phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanAgent {
    pub id: String,
    #[serde(rename = "type")]
    pub role: Role,
    pub emoji: String,
    pub mode: DispatchMode,
    pub description: String,
}

impl PlanAgent {
    pub fn from_task(task: &AgentTask) -> Self {
        Self {
            id: task.id.clone(),
            role: task.role,
            emoji: task.emoji.clone(),
            mode: task.mode,
            description: truncate_description(&task.description),
        }
    }
}

/// Truncate to [`SUMMARY_DESCRIPTION_CHARS`] characters, appending `...`
/// when anything was cut.
pub fn truncate_description(description: &str) -> String {
    match description.char_indices().nth(SUMMARY_DESCRIPTION_CHARS) {
        Some((byte_index, _)) => format!("{}...", &description[..byte_index]),
        None => description.to_string(),
    }
}

/// Dispatch descriptor for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchCommand {
    /// Create a new execution context.
    Spawn { agent_id: String, params: SpawnParams },
    /// Send the task to an existing context.
    Send { agent_id: String, params: SendParams },
}

impl DispatchCommand {
    pub fn agent_id(&self) -> &str {
        match self {
            DispatchCommand::Spawn { agent_id, .. } | DispatchCommand::Send { agent_id, .. } => {
                agent_id
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DispatchCommand::Spawn { .. } => "spawn",
            DispatchCommand::Send { .. } => "send",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnParams {
    pub task: String,
    pub model: String,
    pub run_timeout_seconds: u64,
    pub cleanup: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendParams {
    pub label: String,
    pub message: String,
    pub timeout_seconds: u64,
}

/// Record of a forced admission: the agent was placed before these
/// dependencies were scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedDependency {
    pub agent_id: String,
    pub phase: u32,
    pub unmet: Vec<String>,
}

//! Dispatch descriptors and their rendering.
//!
//! The plan stores one descriptor per task. `execute` renders them into the
//! call syntax the execution backend's operator pastes into a session.

use std::path::Path;

use serde::Serialize;

use crate::plan::schema::{DispatchCommand, ExecutionPlan, SendParams, SpawnParams};
use crate::state::schema::{AgentTask, DispatchMode};
use crate::state::store::MissionLayout;

fn inputs_text(task: &AgentTask) -> String {
    if task.inputs.is_empty() {
        "None".to_string()
    } else {
        serde_json::to_string(&task.inputs).unwrap_or_else(|_| "None".to_string())
    }
}

fn expected_output_text(task: &AgentTask) -> &str {
    if task.expected_output.trim().is_empty() {
        "A report of the completed task"
    } else {
        &task.expected_output
    }
}

/// Prompt for a freshly spawned context.
pub fn spawn_prompt(task: &AgentTask, artifact_path: &Path) -> String {
    format!(
        "# Avengers Mission\n\n\
         ## Your role\n{} {} agent\n\n\
         ## Task\n{}\n\n\
         ## Inputs\n{}\n\n\
         ## Expected output\n{}\n\n\
         ## Output location\n{}\n\n\
         ## When done\n\
         1. Save the result to the path above\n\
         2. Print \"MISSION_COMPLETE: {}\"\n",
        task.emoji,
        task.role.as_str().to_uppercase(),
        task.description,
        inputs_text(task),
        expected_output_text(task),
        artifact_path.display(),
        task.id,
    )
}

/// Message for an existing context.
pub fn send_message(task: &AgentTask, artifact_path: &Path) -> String {
    format!(
        "# Avengers Mission Request\n\n\
         ## Task\n{}\n\n\
         ## Inputs\n{}\n\n\
         ## Expected output\n{}\n\n\
         ## Output location\n{}\n\n\
         ## When done\n\
         Reply with \"MISSION_COMPLETE: {}\"\n",
        task.description,
        inputs_text(task),
        expected_output_text(task),
        artifact_path.display(),
        task.id,
    )
}

/// Build the dispatch descriptor for a task.
pub fn dispatch_command(task: &AgentTask, layout: &MissionLayout) -> DispatchCommand {
    let artifact = layout.artifact_path(&task.id);
    match task.mode {
        DispatchMode::Spawn => DispatchCommand::Spawn {
            agent_id: task.id.clone(),
            params: SpawnParams {
                task: spawn_prompt(task, &artifact),
                model: task.model.clone(),
                run_timeout_seconds: task.timeout,
                cleanup: "keep".to_string(),
                label: task.id.clone(),
            },
        },
        DispatchMode::Existing => DispatchCommand::Send {
            agent_id: task.id.clone(),
            params: SendParams {
                label: task.target_label(),
                message: send_message(task, &artifact),
                timeout_seconds: task.timeout,
            },
        },
    }
}

/// JSON string literal, usable verbatim inside the rendered call.
fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// Render a descriptor as a backend call.
pub fn render_call(command: &DispatchCommand) -> String {
    match command {
        DispatchCommand::Spawn { params, .. } => format!(
            "sessions_spawn({{\n  task: {},\n  model: {},\n  runTimeoutSeconds: {},\n  cleanup: {},\n  label: {}\n}})",
            quote(&params.task),
            quote(&params.model),
            params.run_timeout_seconds,
            quote(&params.cleanup),
            quote(&params.label),
        ),
        DispatchCommand::Send { params, .. } => format!(
            "sessions_send({{\n  label: {},\n  message: {},\n  timeoutSeconds: {}\n}})",
            quote(&params.label),
            quote(&params.message),
            params.timeout_seconds,
        ),
    }
}

/// One rendered call.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedCall {
    pub agent_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub code: String,
}

/// Rendered calls of one phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseScript {
    pub phase: u32,
    pub parallel: bool,
    pub commands: Vec<RenderedCall>,
}

/// Render every phase of a plan, in phase order.
///
/// Agents without a descriptor are left out.
pub fn render_plan(plan: &ExecutionPlan) -> Vec<PhaseScript> {
    plan.phases
        .iter()
        .map(|phase| PhaseScript {
            phase: phase.phase,
            parallel: phase.parallel,
            commands: phase
                .agents
                .iter()
                .filter_map(|agent| plan.command_for(&agent.id))
                .map(|command| RenderedCall {
                    agent_id: command.agent_id().to_string(),
                    kind: command.kind(),
                    code: render_call(command),
                })
                .collect(),
        })
        .collect()
}

/// Markdown document saved as `execute_commands.md`.
pub fn render_markdown(mission_id: &str, phases: &[PhaseScript]) -> String {
    let mut out = String::new();
    out.push_str("# Avengers Execute Commands\n\n");
    out.push_str(&format!("Mission: {}\n\n", mission_id));
    out.push_str("Run the commands below in the execution session.\n\n");

    for phase in phases {
        let mode = if phase.parallel { "parallel" } else { "sequential" };
        out.push_str(&format!("## Phase {} ({})\n\n", phase.phase, mode));
        for call in &phase.commands {
            out.push_str(&format!("### {}\n\n", call.agent_id));
            out.push_str(&format!("```javascript\n{}\n```\n\n", call.code));
        }
    }
    out
}

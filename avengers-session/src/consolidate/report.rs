use std::fs;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::consolidate::validation::ValidationSummary;
use crate::state::schema::{AgentTask, Mission, TaskStatus};
use crate::watch::tracker::ArtifactStatus;

/// An artifact together with what the report shows for it.
#[derive(Debug, Clone)]
pub struct CollectedOutput {
    pub artifact: ArtifactStatus,
    /// Artifact text, `None` when absent or unreadable.
    pub content: Option<String>,
    /// Agent record, when one was saved at assembly.
    pub task: Option<AgentTask>,
}

impl CollectedOutput {
    fn placeholder_status(&self) -> &'static str {
        match (self.artifact.status, &self.content) {
            (TaskStatus::Completed, Some(_)) => "empty",
            (TaskStatus::Completed, None) => "unreadable",
            (TaskStatus::Pending, _) => "pending",
            (TaskStatus::Missing, _) => "missing",
        }
    }
}

/// Read every artifact. Non-UTF-8 bytes are replaced rather than rejected.
pub fn collect_outputs(artifacts: Vec<ArtifactStatus>, tasks: &[AgentTask]) -> Vec<CollectedOutput> {
    artifacts
        .into_iter()
        .map(|artifact| {
            let content = match artifact.status {
                TaskStatus::Completed => match fs::read(&artifact.output_file) {
                    Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                    Err(e) => {
                        warn!(
                            agent = %artifact.agent_id,
                            file = %artifact.output_file.display(),
                            error = %e,
                            "failed to read artifact"
                        );
                        None
                    }
                },
                _ => None,
            };
            let task = tasks.iter().find(|t| t.id == artifact.agent_id).cloned();
            CollectedOutput {
                artifact,
                content,
                task,
            }
        })
        .collect()
}

#[derive(Serialize)]
struct ReportMetadata<'a> {
    mission_id: &'a str,
    completed_at: DateTime<Utc>,
    validation: &'a ValidationSummary,
}

/// Render the final report. Artifact content is embedded verbatim.
pub fn render_report(
    mission: &Mission,
    outputs: &[CollectedOutput],
    validation: &ValidationSummary,
    completed_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    out.push_str("# Avengers Mission Report\n\n");
    out.push_str("## Mission\n");
    out.push_str(&format!("- **ID:** {}\n", mission.id));
    out.push_str(&format!("- **Task:** {}\n", mission.task));
    out.push_str(&format!("- **Created:** {}\n", mission.created_at.to_rfc3339()));
    out.push_str(&format!("- **Completed:** {}\n\n", completed_at.to_rfc3339()));

    out.push_str("## Results\n");
    out.push_str(&format!("- **Total agents:** {}\n", validation.total));
    out.push_str(&format!("- **Completed:** {}\n", validation.completed));
    out.push_str(&format!("- **Missing:** {}\n", validation.missing));
    out.push_str(&format!("- **Empty:** {}\n", validation.empty));
    let verdict = if validation.success {
        "success"
    } else {
        "partial failure"
    };
    out.push_str(&format!("- **Outcome:** {}\n\n", verdict));

    if !validation.issues.is_empty() {
        out.push_str("### Issues\n");
        for issue in &validation.issues {
            out.push_str(&format!("- {}\n", issue));
        }
        out.push('\n');
    }

    out.push_str("---\n\n## Agent Results\n\n");
    for output in outputs {
        match &output.task {
            Some(task) => out.push_str(&format!(
                "### {} {} ({})\n\n> {}\n\n",
                task.emoji, output.artifact.agent_id, task.role, task.description
            )),
            None => out.push_str(&format!("### {}\n\n", output.artifact.agent_id)),
        }
        match output.content.as_deref().filter(|c| !c.is_empty()) {
            Some(content) => {
                out.push_str(content);
                out.push_str("\n\n");
            }
            None => out.push_str(&format!("*No result ({})*\n\n", output.placeholder_status())),
        }
        out.push_str("---\n\n");
    }

    let metadata = ReportMetadata {
        mission_id: &mission.id,
        completed_at,
        validation,
    };
    let metadata = serde_json::to_string_pretty(&metadata).unwrap_or_else(|_| "{}".to_string());
    out.push_str(&format!("## Metadata\n\n```json\n{}\n```\n", metadata));

    out
}

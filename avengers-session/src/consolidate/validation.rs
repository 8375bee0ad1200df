use serde::{Deserialize, Serialize};

use crate::state::schema::TaskStatus;
use crate::watch::tracker::ArtifactStatus;

/// Completeness judgement over every tracked task.
///
/// Stricter than live progress: an artifact that exists but is empty counts
/// as `empty`, not `completed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub completed: usize,
    pub missing: usize,
    pub empty: usize,
    #[serde(default)]
    pub issues: Vec<String>,
    pub success: bool,
}

/// Classify each task as missing, empty or completed, in that order.
pub fn validate(artifacts: &[ArtifactStatus]) -> ValidationSummary {
    let mut summary = ValidationSummary {
        total: artifacts.len(),
        ..Default::default()
    };

    for artifact in artifacts {
        if artifact.status != TaskStatus::Completed {
            summary.missing += 1;
            summary.issues.push(format!("missing: {}", artifact.agent_id));
        } else if artifact.size == 0 {
            summary.empty += 1;
            summary.issues.push(format!("empty: {}", artifact.agent_id));
        } else {
            summary.completed += 1;
        }
    }

    summary.success = summary.completed == summary.total;
    summary
}

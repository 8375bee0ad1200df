//! Final validation and report assembly.

pub mod report;
pub mod validation;

pub use report::{collect_outputs, render_report, CollectedOutput};
pub use validation::{validate, ValidationSummary};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::{json, Map};
use tracing::info;

use crate::error::{MissionError, Result};
use crate::state::schema::{Mission, MissionStatus};
use crate::state::store::MissionStore;
use crate::watch::tracker::check_artifacts;

/// Result of a consolidation attempt.
#[derive(Debug, Clone)]
pub enum Consolidation {
    /// Report written and mission moved to `completed`.
    Written {
        mission: Mission,
        report_path: PathBuf,
        validation: ValidationSummary,
    },
    /// Validation failed and no force was given. Nothing was written.
    Incomplete(ValidationSummary),
}

/// Validate a mission's artifacts and, when allowed, write the final report.
///
/// The mission is marked `completed` whenever a report is written, forced or
/// not; the outcome stays visible in the embedded validation summary.
pub fn consolidate(
    store: &MissionStore,
    mission_id: &str,
    force: bool,
    output: Option<&Path>,
) -> Result<Consolidation> {
    consolidate_at(store, mission_id, force, output, Utc::now())
}

/// [`consolidate`] with an explicit completion time.
pub fn consolidate_at(
    store: &MissionStore,
    mission_id: &str,
    force: bool,
    output: Option<&Path>,
    now: DateTime<Utc>,
) -> Result<Consolidation> {
    let mission = store.load(mission_id)?;
    let plan = store.load_plan(mission_id)?;
    let layout = store.layout(mission_id);

    let artifacts = check_artifacts(&layout, Some(&plan));
    let validation = validate(&artifacts);
    if !validation.success && !force {
        info!(
            mission = %mission_id,
            missing = validation.missing,
            empty = validation.empty,
            "validation incomplete, not consolidating"
        );
        return Ok(Consolidation::Incomplete(validation));
    }

    let tasks = store.load_tasks(mission_id)?;
    let outputs = collect_outputs(artifacts, &tasks);
    let report = render_report(&mission, &outputs, &validation, now);

    let report_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| layout.default_report());
    if let Some(parent) = report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| MissionError::io(parent, e))?;
    }
    fs::write(&report_path, report).map_err(|e| MissionError::io(&report_path, e))?;

    let validation_value = serde_json::to_value(&validation)
        .map_err(|e| MissionError::invalid_state(layout.mission_file(), e))?;
    let mut updates = Map::new();
    updates.insert("completed_at".to_string(), json!(now));
    updates.insert("validation".to_string(), validation_value);
    let mission = store.update_status_at(mission_id, MissionStatus::Completed, Some(updates), now)?;

    store.record_event(
        mission_id,
        "mission_consolidated",
        json!({
            "report_path": report_path,
            "success": validation.success,
            "forced": force && !validation.success,
        }),
    );
    info!(
        mission = %mission_id,
        report = %report_path.display(),
        success = validation.success,
        "consolidated mission"
    );

    Ok(Consolidation::Written {
        mission,
        report_path,
        validation,
    })
}
